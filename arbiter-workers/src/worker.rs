//! Per-match execution loop (§4.2). Each worker is an independent
//! cooperative task sharing no mutable state besides atomics for counters,
//! the pattern this codebase's own training workers use.

use arbiter_core::WorkersConfig;
use arbiter_persistence::match_repo::MatchRepository;
use arbiter_persistence::models::Match;
use arbiter_persistence::leaderboard_repo::LeaderboardRepository;
use arbiter_persistence::program_repo::ProgramRepository;
use arbiter_persistence::rating_repo::RatingRepository;
use arbiter_rating::RatingEngine;
use arbiter_scheduler::Queue;
use futures::FutureExt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::runner::Runner;

pub struct Worker<R> {
    pub id: usize,
    queue: Arc<Queue<R>>,
    repo: R,
    rating: Arc<RatingEngine<R>>,
    runner: Arc<dyn Runner>,
    config: WorkersConfig,
    claim_block: Duration,
    in_flight: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
}

impl<R> Worker<R>
where
    R: MatchRepository + ProgramRepository + RatingRepository + LeaderboardRepository + Clone + Send + Sync + 'static,
{
    pub fn new(
        id: usize,
        queue: Arc<Queue<R>>,
        repo: R,
        rating: Arc<RatingEngine<R>>,
        runner: Arc<dyn Runner>,
        config: WorkersConfig,
        claim_block: Duration,
        in_flight: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            id,
            queue,
            repo,
            rating,
            runner,
            config,
            claim_block,
            in_flight,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Claim -> execute -> record -> repeat, until signaled to stop. A
    /// signaled stop takes effect between jobs, never mid-claim.
    pub async fn run(self) {
        loop {
            if self.stop.load(Ordering::Acquire) {
                log::info!("worker {} stopping", self.id);
                return;
            }
            match self.queue.dequeue_blocking(self.claim_block).await {
                Ok(Some(m)) => {
                    self.in_flight.fetch_add(1, Ordering::Relaxed);
                    self.execute(m).await;
                    self.in_flight.fetch_sub(1, Ordering::Relaxed);
                }
                Ok(None) => continue,
                Err(err) => {
                    log::error!("worker {} dequeue failed: {err}", self.id);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    async fn execute(&self, m: Match) {
        let Some((blob_a, blob_b)) = self.load_programs(&m).await else {
            return;
        };
        let mut attempt = 0u32;
        loop {
            let call = std::panic::AssertUnwindSafe(
                tokio::time::timeout(self.config.timeout, self.runner.run(&m.game, &blob_a, &blob_b, 1)),
            )
            .catch_unwind();
            match call.await {
                Ok(Ok(Ok(outcome))) => {
                    if let Err(err) = self
                        .rating
                        .apply_result(m.tournament, m.id, outcome.score1, outcome.score2, outcome.winner)
                        .await
                    {
                        log::error!("result apply failed for match {}: {err}", m.id);
                    }
                    return;
                }
                Ok(Ok(Err(err))) if err.is_transient() && attempt < self.config.retry_attempts => {
                    attempt += 1;
                    let backoff = self.config.retry_delay * 2u32.saturating_pow(attempt);
                    tokio::time::sleep(backoff).await;
                }
                Ok(Ok(Err(err))) => {
                    self.fail(&m, &err.to_string()).await;
                    return;
                }
                Ok(Err(_elapsed)) => {
                    self.fail(&m, "match execution timed out").await;
                    return;
                }
                Err(_panic) => {
                    log::error!("worker {} panicked executing match {}", self.id, m.id);
                    self.fail(&m, "runner task panicked").await;
                    return;
                }
            }
        }
    }

    async fn load_programs(&self, m: &Match) -> Option<(Vec<u8>, Vec<u8>)> {
        let (p1, p2) = match tokio::try_join!(self.repo.get(m.p1), self.repo.get(m.p2)) {
            Ok((Some(p1), Some(p2))) => (p1, p2),
            Ok(_) => {
                self.fail(m, "program record missing").await;
                return None;
            }
            Err(err) => {
                self.fail(m, &err.to_string()).await;
                return None;
            }
        };
        match tokio::try_join!(tokio::fs::read(&p1.source_path), tokio::fs::read(&p2.source_path)) {
            Ok((a, b)) => Some((a, b)),
            Err(err) => {
                self.fail(m, &format!("failed to read program source: {err}")).await;
                None
            }
        }
    }

    async fn fail(&self, m: &Match, message: &str) {
        if let Err(err) = self.repo.fail(m.id, message).await {
            log::error!("failed to mark match {} as failed: {err}", m.id);
        }
    }
}
