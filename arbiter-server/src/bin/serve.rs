//! Long-running binary: runs the worker pool and stuck-match supervisor.

use arbiter_core::Config;
use arbiter_server::Cli;
use arbiter_server::Command;
use clap::Parser;

#[tokio::main]
async fn main() {
    arbiter_core::init_logging();
    let Command::Serve = Cli::parse().command else {
        eprintln!("expected `serve`");
        std::process::exit(2);
    };
    arbiter_server::serve::run(Config::from_env()).await.unwrap();
}
