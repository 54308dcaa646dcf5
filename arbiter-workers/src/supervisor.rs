//! Autoscale tick and stuck-match reaper (§4.2), run as one background task
//! at a fixed 1 s cadence.

use arbiter_core::WorkersConfig;
use arbiter_persistence::leaderboard_repo::LeaderboardRepository;
use arbiter_persistence::match_repo::MatchRepository;
use arbiter_persistence::program_repo::ProgramRepository;
use arbiter_persistence::rating_repo::RatingRepository;
use std::sync::Arc;
use std::time::Duration;

use crate::pool::Pool;

const TICK: Duration = Duration::from_secs(1);
const SCALE_DOWN_STEP: usize = 1;
const SCALE_UP_STEP: usize = 2;
const SCALE_DOWN_CONSECUTIVE_TICKS: u32 = 30;

pub struct Supervisor<R> {
    pool: Arc<Pool<R>>,
    repo: R,
    config: WorkersConfig,
}

impl<R> Supervisor<R>
where
    R: MatchRepository + ProgramRepository + RatingRepository + LeaderboardRepository + Clone + Send + Sync + 'static,
{
    pub fn new(pool: Arc<Pool<R>>, repo: R, config: WorkersConfig) -> Self {
        Self { pool, repo, config }
    }

    /// Runs until `shutdown` resolves. Each tick: autoscale, then reap
    /// matches stuck in `running` past `stuck_threshold`.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut idle_ticks = 0u32;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(TICK) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        log::info!("supervisor shutting down");
                        return;
                    }
                }
            }

            let workers = self.pool.worker_count().await;
            let in_flight = self.pool.in_flight();
            let depth = match self.pool.queue_depth().await {
                Ok(depth) => depth as usize,
                Err(err) => {
                    log::warn!("supervisor failed to read queue depth: {err}");
                    continue;
                }
            };

            if depth > 2 * workers && workers < self.config.max {
                let room = self.config.max - workers;
                self.pool.scale_up(SCALE_UP_STEP.min(room)).await;
                idle_ticks = 0;
            } else if depth == 0 && in_flight <= workers / 2 {
                idle_ticks += 1;
                if idle_ticks >= SCALE_DOWN_CONSECUTIVE_TICKS {
                    self.pool.scale_down(SCALE_DOWN_STEP).await;
                    idle_ticks = 0;
                }
            } else {
                idle_ticks = 0;
            }

            if let Err(err) = self.reap_stuck().await {
                log::error!("stuck-match reap failed: {err}");
            }
        }
    }

    async fn reap_stuck(&self) -> arbiter_core::CoreResult<()> {
        let reaped = self.repo.reap_stuck(self.config.stuck_threshold).await?;
        for id in &reaped {
            log::warn!("reaped stuck match {id}, worker assumed dead");
        }
        Ok(())
    }
}
