//! Token blacklist (§4.4): `blacklist:token:<token> = "1"` with a TTL equal
//! to the token's remaining lifetime. Presence check is O(1).

use arbiter_core::CoreError;
use redis::AsyncCommands;
use std::time::Duration;

use crate::RedisPool;

#[derive(Clone)]
pub struct TokenBlacklist {
    pool: RedisPool,
}

impl TokenBlacklist {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(token: &str) -> String {
        format!("blacklist:token:{token}")
    }

    /// Blacklist `token` until it would have naturally expired anyway.
    pub async fn add(&self, token: &str, remaining_lifetime: Duration) -> Result<(), CoreError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn
            .set_ex(Self::key(token), "1", remaining_lifetime.as_secs().max(1))
            .await?;
        Ok(())
    }

    pub async fn contains(&self, token: &str) -> Result<bool, CoreError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.exists(Self::key(token)).await?)
    }

    /// Idempotent logout: blacklisting an already-blacklisted token succeeds
    /// without error (property §8.7).
    pub async fn logout(&self, token: &str, remaining_lifetime: Duration) -> Result<(), CoreError> {
        self.add(token, remaining_lifetime).await
    }
}
