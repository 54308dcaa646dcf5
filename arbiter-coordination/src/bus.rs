//! In-process event fan-out hub (§9 "event fan-out"), used by in-process
//! callers (the scheduler, the rating engine) that want to observe state
//! transitions without round-tripping through Redis pub/sub.
//!
//! One `broadcast` channel per tournament, the same pattern this codebase
//! uses to bridge a room's events to every seated player: slow subscribers
//! lag and drop the oldest buffered message rather than stalling the
//! publisher.

use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

use crate::Event;

const SUBSCRIBER_BUFFER: usize = 256;

pub struct Subscription(pub broadcast::Receiver<Event>);

impl Subscription {
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.0.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("subscriber lagged, dropped {n} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    channels: RwLock<HashMap<String, broadcast::Sender<Event>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, tournament_id: &str) -> broadcast::Sender<Event> {
        if let Some(tx) = self.channels.read().unwrap().get(tournament_id) {
            return tx.clone();
        }
        let mut channels = self.channels.write().unwrap();
        channels
            .entry(tournament_id.to_string())
            .or_insert_with(|| broadcast::channel(SUBSCRIBER_BUFFER).0)
            .clone()
    }

    /// Broadcast `event` to every current subscriber of `tournament_id`.
    /// A send with no subscribers is not an error; it is simply dropped.
    pub fn publish(&self, tournament_id: &str, event: Event) {
        let _ = self.sender(tournament_id).send(event);
    }

    pub fn subscribe(&self, tournament_id: &str) -> Subscription {
        Subscription(self.sender(tournament_id).subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe("t1");
        bus.publish("t1", Event::match_update(serde_json::json!({"id": "m1"})));
        let event = sub.recv().await.expect("event delivered");
        assert_eq!(event.kind, "match_update");
    }

    #[tokio::test]
    async fn late_subscriber_misses_prior_messages() {
        let bus = EventBus::new();
        bus.publish("t1", Event::match_update(serde_json::json!({"id": "m1"})));
        let mut sub = bus.subscribe("t1");
        bus.publish("t1", Event::match_update(serde_json::json!({"id": "m2"})));
        let event = sub.recv().await.expect("only the second event arrives");
        assert_eq!(event.payload["id"], "m2");
    }
}
