//! `serve` subcommand: runs the worker pool and stuck-match supervisor
//! until a graceful shutdown is requested.

use arbiter_core::Config;
use arbiter_core::CoreResult;
use arbiter_workers::DeterministicStubRunner;
use arbiter_workers::Pool;
use arbiter_workers::Runner;
use arbiter_workers::Supervisor;
use std::sync::Arc;
use std::time::Duration;

use crate::context::Platform;

pub async fn run(config: Config) -> CoreResult<()> {
    let platform = Platform::connect(config.clone()).await?;

    // TODO: swap in the sandboxed RPC runner once its transport is settled;
    // the deterministic stub lets the pool and supervisor run end to end today.
    let runner: Arc<dyn Runner> = Arc::new(DeterministicStubRunner);

    let pool = Arc::new(
        Pool::new(
            platform.queue.clone(),
            platform.repo.clone(),
            platform.rating.clone(),
            runner,
            config.workers.clone(),
            config.queue.clone(),
        )
        .await,
    );
    let supervisor = Supervisor::new(pool.clone(), platform.repo.clone(), config.workers.clone());

    let (tx, rx) = tokio::sync::watch::channel(false);
    arbiter_core::wait_for_shutdown();
    tokio::spawn(async move {
        while !arbiter_core::shutdown_requested() {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        let _ = tx.send(true);
    });

    supervisor.run(rx).await;
    pool.stop().await;
    log::info!("serve subcommand exiting cleanly");
    Ok(())
}
