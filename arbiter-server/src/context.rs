//! Wires the database connection, coordination pool, scheduler queue, and
//! rating engine into a single handle shared by every subcommand.

use arbiter_core::Config;
use arbiter_core::CoreResult;
use arbiter_coordination::DistributedLock;
use arbiter_coordination::EventBus;
use arbiter_coordination::PubSub;
use arbiter_rating::LeaderboardCache;
use arbiter_rating::RatingEngine;
use arbiter_scheduler::Queue;
use std::sync::Arc;
use tokio_postgres::Client;

pub struct Platform {
    pub config: Config,
    pub repo: Arc<Client>,
    pub queue: Arc<Queue<Arc<Client>>>,
    pub rating: Arc<RatingEngine<Arc<Client>>>,
    pub lock: DistributedLock,
    pub bus: Arc<EventBus>,
    pub pubsub: PubSub,
}

impl Platform {
    pub async fn connect(config: Config) -> CoreResult<Self> {
        let repo = arbiter_persistence::connect(&config.database_url).await?;
        let redis_pool = arbiter_coordination::connect(&config.coordination_url).await?;

        let queue = Arc::new(Queue::new(redis_pool.clone(), repo.clone()));
        let cache = LeaderboardCache::new(redis_pool.clone());
        let bus = Arc::new(EventBus::new());
        let pubsub = PubSub::new(redis_pool.clone());
        let rating = Arc::new(RatingEngine::new(repo.clone(), cache, bus.clone(), pubsub.clone()));
        let lock = DistributedLock::new(redis_pool);

        Ok(Self { config, repo, queue, rating, lock, bus, pubsub })
    }
}
