//! Worker pool (§4.2): N logical workers registered in a map the way this
//! codebase's room registry tracks live sessions, autoscaled by the
//! supervisor between `[min, max]`.

use arbiter_core::QueueConfig;
use arbiter_core::WorkersConfig;
use arbiter_persistence::leaderboard_repo::LeaderboardRepository;
use arbiter_persistence::match_repo::MatchRepository;
use arbiter_persistence::program_repo::ProgramRepository;
use arbiter_persistence::rating_repo::RatingRepository;
use arbiter_rating::RatingEngine;
use arbiter_scheduler::Queue;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::runner::Runner;
use crate::worker::Worker;

struct WorkerHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// A stopped pool refuses new `scale_up` calls (§4.2 Cancellation).
pub struct Pool<R> {
    queue: Arc<Queue<R>>,
    repo: R,
    rating: Arc<RatingEngine<R>>,
    runner: Arc<dyn Runner>,
    config: WorkersConfig,
    queue_config: QueueConfig,
    workers: RwLock<Vec<WorkerHandle>>,
    next_id: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    stopped: AtomicBool,
}

impl<R> Pool<R>
where
    R: MatchRepository + ProgramRepository + RatingRepository + LeaderboardRepository + Clone + Send + Sync + 'static,
{
    pub async fn new(
        queue: Arc<Queue<R>>,
        repo: R,
        rating: Arc<RatingEngine<R>>,
        runner: Arc<dyn Runner>,
        config: WorkersConfig,
        queue_config: QueueConfig,
    ) -> Self {
        let pool = Self {
            queue,
            repo,
            rating,
            runner,
            config: config.clone(),
            queue_config,
            workers: RwLock::new(Vec::new()),
            next_id: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            stopped: AtomicBool::new(false),
        };
        pool.scale_up(config.min).await;
        pool
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub async fn worker_count(&self) -> usize {
        self.workers.read().await.len()
    }

    /// Live queue depth, used by the supervisor's autoscale tick.
    pub async fn queue_depth(&self) -> arbiter_core::CoreResult<u64> {
        self.queue.depth().await
    }

    /// Spawn up to `n` additional workers, never exceeding `max`. No-op on a stopped pool.
    pub async fn scale_up(&self, n: usize) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let mut workers = self.workers.write().await;
        let room = self.config.max.saturating_sub(workers.len());
        for _ in 0..n.min(room) {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let worker = Worker::new(
                id,
                self.queue.clone(),
                self.repo.clone(),
                self.rating.clone(),
                self.runner.clone(),
                self.config.clone(),
                self.queue_config.claim_block,
                self.in_flight.clone(),
            );
            let stop = worker.stop_handle();
            let task = tokio::spawn(worker.run());
            workers.push(WorkerHandle { stop, task });
            log::info!("worker {id} started");
        }
    }

    /// Signal up to `n` idle workers to stop after their current job. Never
    /// retires below `min`.
    pub async fn scale_down(&self, n: usize) {
        let mut workers = self.workers.write().await;
        let floor = self.config.min;
        let removable = workers.len().saturating_sub(floor).min(n);
        for handle in workers.drain(..removable) {
            handle.stop.store(true, Ordering::Release);
        }
    }

    /// Signal every worker to stop after its current job completes.
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        let workers = self.workers.read().await;
        for handle in workers.iter() {
            handle.stop.store(true, Ordering::Release);
        }
    }

    /// Abort every worker task immediately, cancelling any in-progress runner call.
    pub async fn force_stop(&self) {
        self.stopped.store(true, Ordering::Release);
        let mut workers = self.workers.write().await;
        for handle in workers.drain(..) {
            handle.task.abort();
        }
    }
}
