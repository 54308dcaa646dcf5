//! `DistributedLock`: a keyed, token-fenced, TTL-bounded mutual-exclusion
//! primitive spanning processes, implemented over SETNX/compare-and-delete.

use arbiter_core::CoreError;
use arbiter_core::ConflictKind;
use futures::FutureExt;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

use crate::RedisPool;

/// Opaque fencing token returned by a successful `lock`. Only the holder of
/// the matching token may `unlock` the key it guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    fn random() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct DistributedLock {
    pool: RedisPool,
}

impl DistributedLock {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(name: &str) -> String {
        format!("lock:{name}")
    }

    /// SETNX a random token under `lock:<key>` with the given TTL.
    /// Fails with `Conflict(LockHeld)` if the key is already set.
    pub async fn lock(&self, key: &str, ttl: Duration) -> Result<LockToken, CoreError> {
        let token = LockToken::random();
        let mut conn = self.pool.get().await?;
        let acquired: bool = redis::cmd("SET")
            .arg(Self::key(key))
            .arg(token.as_str())
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<Option<String>>(&mut *conn)
            .await?
            .is_some();
        if acquired {
            Ok(token)
        } else {
            Err(CoreError::Conflict(ConflictKind::LockHeld))
        }
    }

    /// Retry wrapper around `lock` with a fixed delay between attempts.
    pub async fn try_lock(
        &self,
        key: &str,
        ttl: Duration,
        attempts: u32,
        delay: Duration,
    ) -> Result<LockToken, CoreError> {
        let mut last_err = CoreError::Conflict(ConflictKind::LockHeld);
        for attempt in 0..attempts.max(1) {
            match self.lock(key, ttl).await {
                Ok(token) => return Ok(token),
                Err(err) => {
                    last_err = err;
                    if attempt + 1 < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(last_err)
    }

    /// Release the lock. No-op if the key already expired. Fails with
    /// `Conflict(LockMismatch)` if a different holder's token is present —
    /// never releases a lock that isn't ours.
    pub async fn unlock(&self, key: &str, token: &LockToken) -> Result<(), CoreError> {
        let mut conn = self.pool.get().await?;
        const SCRIPT: &str = r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#;
        let deleted: i64 = redis::Script::new(SCRIPT)
            .key(Self::key(key))
            .arg(token.as_str())
            .invoke_async(&mut *conn)
            .await?;
        if deleted == 1 {
            Ok(())
        } else {
            let held: Option<String> = conn.get(Self::key(key)).await?;
            match held {
                None => Ok(()),
                Some(_) => Err(CoreError::Conflict(ConflictKind::LockMismatch)),
            }
        }
    }

    /// Acquire the lock, run `body`, and guarantee release on every exit path
    /// (success, error, or panic). Release uses a fresh 2s-budget operation
    /// so a cancelled caller still frees the key for the next acquirer.
    pub async fn with_lock<F, Fut, T>(&self, key: &str, ttl: Duration, body: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let token = self.lock(key, ttl).await?;
        let result = std::panic::AssertUnwindSafe(body()).catch_unwind().await;
        let release = tokio::time::timeout(Duration::from_secs(2), self.unlock(key, &token)).await;
        if let Ok(Err(err)) = release {
            log::warn!("failed to release lock {key}: {err}");
        }
        match result {
            Ok(inner) => inner,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_not_predictable_placeholders() {
        let a = LockToken::random();
        let b = LockToken::random();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }
}
