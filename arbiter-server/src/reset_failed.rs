//! `reset-failed` subcommand: bulk-transitions a tournament's failed
//! matches back to pending and re-enqueues them (§4.1 `ResetFailed`).

use arbiter_core::Config;
use arbiter_core::CoreResult;
use arbiter_core::ID;

use crate::context::Platform;

pub async fn run(config: Config, tournament: uuid::Uuid) -> CoreResult<()> {
    let platform = Platform::connect(config).await?;
    let tournament_id = ID::from(tournament);
    let ids = platform.queue.reset_failed(tournament_id).await?;
    if let Err(err) = platform.rating.invalidate(tournament_id).await {
        log::warn!("leaderboard cache invalidation failed for {tournament}: {err}");
    }
    log::info!("reset {} failed match(es) for tournament {tournament}", ids.len());
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
