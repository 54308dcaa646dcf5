//! clap wiring shared by all three binaries.

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "arbiter", about = "Tournament judging platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the worker pool and stuck-match supervisor until shutdown.
    Serve,
    /// Reset a tournament's failed matches back to pending and re-enqueue them.
    ResetFailed {
        #[arg(long)]
        tournament: uuid::Uuid,
    },
    /// Print queue depth and leaderboard for a tournament.
    Status {
        #[arg(long)]
        tournament: uuid::Uuid,
    },
}
