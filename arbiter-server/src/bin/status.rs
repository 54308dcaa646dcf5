//! Short-lived binary: prints a tournament's queue depth and leaderboard.

use arbiter_core::Config;
use arbiter_server::Cli;
use arbiter_server::Command;
use clap::Parser;

#[tokio::main]
async fn main() {
    arbiter_core::init_logging();
    arbiter_core::hard_exit_on_interrupt();
    let Command::Status { tournament } = Cli::parse().command else {
        eprintln!("expected `status --tournament <uuid>`");
        std::process::exit(2);
    };
    arbiter_server::status::run(Config::from_env(), tournament)
        .await
        .unwrap();
}
