//! Per-key fixed-window rate limiter (§4.4). The window's TTL doubles as
//! its reset: the first request in a new window sets the counter's
//! expiration, every subsequent one just increments.

use arbiter_core::CoreError;
use redis::AsyncCommands;
use std::time::Duration;

use crate::RedisPool;

#[derive(Clone)]
pub struct RateLimiter {
    pool: RedisPool,
}

impl RateLimiter {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(name: &str) -> String {
        format!("ratelimit:{name}")
    }

    /// Atomic INCR variant: increments unconditionally, sets the window TTL
    /// only on the first hit, and reports whether the caller is still under
    /// `limit`. Safe under concurrent callers without a read-then-write race.
    pub async fn check(&self, key: &str, limit: u64, window: Duration) -> Result<bool, CoreError> {
        let mut conn = self.pool.get().await?;
        let count: u64 = conn.incr(Self::key(key), 1).await?;
        if count == 1 {
            let _: () = conn.expire(Self::key(key), window.as_secs().max(1) as i64).await?;
        }
        Ok(count <= limit)
    }

    /// Read-then-write variant: useful when the caller needs the current
    /// count without mutating it (e.g. to decide whether to even attempt
    /// the INCR variant).
    pub async fn peek(&self, key: &str) -> Result<u64, CoreError> {
        let mut conn = self.pool.get().await?;
        let count: Option<u64> = conn.get(Self::key(key)).await?;
        Ok(count.unwrap_or(0))
    }
}
