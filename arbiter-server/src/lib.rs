pub mod cli;
pub mod context;
pub mod reset_failed;
pub mod serve;
pub mod status;

pub use cli::Cli;
pub use cli::Command;
pub use context::Platform;
