//! Pooled connection to the coordination store, mirroring this codebase's
//! `db()` helper for PostgreSQL: one function, one environment-driven URL,
//! a ready-to-share handle.

pub type RedisPool = bb8::Pool<bb8_redis::RedisConnectionManager>;

/// Establish a pooled Redis connection.
pub async fn connect(url: &str) -> Result<RedisPool, arbiter_core::CoreError> {
    log::info!("connecting to coordination store");
    let manager = bb8_redis::RedisConnectionManager::new(url)
        .map_err(|e| arbiter_core::CoreError::Internal(e.to_string()))?;
    bb8::Pool::builder()
        .max_size(16)
        .build(manager)
        .await
        .map_err(|e| arbiter_core::CoreError::Internal(e.to_string()))
}
