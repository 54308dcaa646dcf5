//! Priority queue accelerator over the persistent match table (§4.1). The
//! match row is the durable source of truth; this structure only speeds up
//! dispatch order. A push failure after a successful persist is tolerable —
//! a worker can always rediscover pending rows by scanning.

use arbiter_core::CoreError;
use arbiter_core::ID;
use arbiter_core::Priority;
use arbiter_coordination::RedisPool;
use arbiter_persistence::match_repo::MatchRepository;
use arbiter_persistence::models::Match;
use arbiter_persistence::models::Tournament;
use redis::AsyncCommands;
use std::time::Duration;

const QUEUE_KEY: &str = "queue:pending";

fn score(priority: Priority, created_at: chrono::DateTime<chrono::Utc>) -> f64 {
    let rank = priority.rank() as f64 * 10f64.powi(13);
    rank + created_at.timestamp_nanos_opt().unwrap_or(0) as f64
}

#[derive(Clone)]
pub struct Queue<R> {
    pool: RedisPool,
    repo: R,
}

impl<R> Queue<R>
where
    R: MatchRepository + Clone,
{
    pub fn new(pool: RedisPool, repo: R) -> Self {
        Self { pool, repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Live queue depth, used by the autoscale tick (§4.2).
    pub async fn depth(&self) -> Result<u64, CoreError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.zcard(QUEUE_KEY).await?)
    }

    async fn push(&self, m: &Match) -> Result<(), CoreError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn
            .zadd(QUEUE_KEY, m.id.inner().to_string(), score(m.priority, m.created_at))
            .await?;
        Ok(())
    }

    /// Persist `m` as pending, then best-effort push it onto the queue.
    pub async fn enqueue(&self, m: &Match) -> Result<(), CoreError> {
        self.repo.create(m).await?;
        if let Err(err) = self.push(m).await {
            log::warn!("queue push failed for match {}, relying on pending-row scan: {err}", m.id);
        }
        Ok(())
    }

    /// Atomic insertion of a full round, then best-effort push of every match.
    pub async fn batch_create(&self, matches: &[Match]) -> Result<(), CoreError> {
        self.repo.create_batch(matches).await?;
        for m in matches {
            if let Err(err) = self.push(m).await {
                log::warn!("queue push failed for match {}, relying on pending-row scan: {err}", m.id);
            }
        }
        Ok(())
    }

    /// Pop the lowest-score member and attempt to claim it. A claim miss
    /// (already claimed, or the row vanished) moves on to the next member
    /// without returning an error — the caller just sees no match yet.
    pub async fn dequeue(&self) -> Result<Option<Match>, CoreError> {
        loop {
            let popped: Vec<(String, f64)> = {
                let mut conn = self.pool.get().await?;
                conn.zpopmin(QUEUE_KEY, 1).await?
            };
            let Some((id_str, _)) = popped.into_iter().next() else {
                return Ok(None);
            };
            let Ok(uuid) = uuid::Uuid::parse_str(&id_str) else {
                continue;
            };
            if let Some(m) = self.repo.try_claim(ID::from(uuid)).await? {
                return Ok(Some(m));
            }
        }
    }

    /// Poll `dequeue` until a match is claimed or `claim_block` elapses.
    pub async fn dequeue_blocking(&self, claim_block: Duration) -> Result<Option<Match>, CoreError> {
        let deadline = tokio::time::Instant::now() + claim_block;
        loop {
            if let Some(m) = self.dequeue().await? {
                return Ok(Some(m));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    /// Bulk-reset a tournament's failed matches to pending and re-push them.
    pub async fn reset_failed(&self, tournament: ID<Tournament>) -> Result<Vec<ID<Match>>, CoreError> {
        let ids = self.repo.reset_failed(tournament).await?;
        for id in &ids {
            if let Ok(Some(m)) = self.repo.get(*id).await {
                if let Err(err) = self.push(&m).await {
                    log::warn!("queue push failed while resetting match {id}: {err}");
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_priority_sorts_before_low_regardless_of_age() {
        let now = chrono::Utc::now();
        let earlier = now - chrono::Duration::seconds(3600);
        let high_recent = score(Priority::High, now);
        let low_old = score(Priority::Low, earlier);
        assert!(high_recent < low_old);
    }

    #[test]
    fn same_priority_orders_by_age() {
        let now = chrono::Utc::now();
        let earlier = now - chrono::Duration::seconds(5);
        assert!(score(Priority::Medium, earlier) < score(Priority::Medium, now));
    }
}
