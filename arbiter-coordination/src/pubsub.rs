//! Redis-backed publish side of the fan-out bus (§4.4, §6 emitted schema).
//! Subscribers are external WebSocket observers, out of scope here; the
//! core only guarantees fire-and-forget delivery with failures logged and
//! swallowed, never surfaced to the publisher.

use redis::AsyncCommands;
use serde::Serialize;

use crate::RedisPool;

/// One message on the `tournament:<id>` channel.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn match_update(payload: serde_json::Value) -> Self {
        Self { kind: "match_update", payload }
    }
    pub fn match_completed(payload: serde_json::Value) -> Self {
        Self { kind: "match_completed", payload }
    }
    pub fn leaderboard_update(payload: serde_json::Value) -> Self {
        Self { kind: "leaderboard_update", payload }
    }
    pub fn tournament_started(payload: serde_json::Value) -> Self {
        Self { kind: "tournament_started", payload }
    }
    pub fn round_completed(payload: serde_json::Value) -> Self {
        Self { kind: "round_completed", payload }
    }
}

#[derive(Clone)]
pub struct PubSub {
    pool: RedisPool,
}

impl PubSub {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish `event` to `tournament:<tournament_id>`. Failures are logged
    /// and swallowed per the propagation policy — the publisher never blocks
    /// or errors on a slow/absent subscriber.
    pub async fn publish(&self, tournament_id: &str, event: &Event) {
        let channel = format!("tournament:{tournament_id}");
        let body = match serde_json::to_string(event) {
            Ok(body) => body,
            Err(err) => {
                log::warn!("failed to encode pub/sub event for {channel}: {err}");
                return;
            }
        };
        match self.pool.get().await {
            Ok(mut conn) => {
                if let Err(err) = conn.publish::<_, _, i64>(&channel, body).await {
                    log::warn!("failed to publish to {channel}: {err}");
                }
            }
            Err(err) => log::warn!("no coordination connection to publish {channel}: {err}"),
        }
    }
}
