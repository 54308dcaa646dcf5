//! Short-lived binary: resets a tournament's failed matches to pending.

use arbiter_core::Config;
use arbiter_server::Cli;
use arbiter_server::Command;
use clap::Parser;

#[tokio::main]
async fn main() {
    arbiter_core::init_logging();
    arbiter_core::hard_exit_on_interrupt();
    let Command::ResetFailed { tournament } = Cli::parse().command else {
        eprintln!("expected `reset-failed --tournament <uuid>`");
        std::process::exit(2);
    };
    arbiter_server::reset_failed::run(Config::from_env(), tournament)
        .await
        .unwrap();
}
