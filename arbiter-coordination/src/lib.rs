//! The coordination substrate (§4.4): a keyed distributed lock, a token
//! blacklist, a fixed-window rate limiter, and a fan-out pub/sub bus, all
//! backed by a pooled Redis connection.

mod blacklist;
mod bus;
mod lock;
mod pubsub;
mod ratelimit;
mod redis_pool;

pub use blacklist::TokenBlacklist;
pub use bus::EventBus;
pub use bus::Subscription;
pub use lock::DistributedLock;
pub use lock::LockToken;
pub use pubsub::Event;
pub use pubsub::PubSub;
pub use ratelimit::RateLimiter;
pub use redis_pool::RedisPool;
pub use redis_pool::connect;
