//! Worker pool, per-match execution loop, and autoscale/reap supervisor (§4.2).

pub mod pool;
pub mod runner;
pub mod supervisor;
pub mod worker;

pub use pool::Pool;
pub use runner::DeterministicStubRunner;
pub use runner::RunOutcome;
pub use runner::Runner;
pub use supervisor::Supervisor;
pub use worker::Worker;
