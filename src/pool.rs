//! # Pool Facade
//!
//! Public surface of the worker pool: construction in one of three modes,
//! fire-and-forget submission, advisory introspection, and orderly idempotent
//! shutdown.
//!
//! ## Construction Modes
//! - Auto-sized: processor-count workers, observer scales within
//!   `[max(n/4, 1), n]`.
//! - Fixed ceiling: caller-supplied maximum, same scaling heuristic.
//! - Manually banded: exact per-tier worker counts, no observer, static.
//!
//! ## Shutdown Order
//! Observer first, then every worker, then joins, then the queue is cleared.
//! After `shutdown` returns no pool thread is alive and mutating operations
//! fail with [`PoolError::Disposed`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::{PoolConfig, ScalingMode};
use crate::error::PoolError;
use crate::observer::Observer;
use crate::priority::Priority;
use crate::queue::WorkQueue;
use crate::task::WorkItem;
use crate::worker::Worker;

/// Lifecycle states of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Pool is accepting and executing work.
    Running = 0,
    /// Shutdown has started; submission is rejected.
    ShuttingDown = 1,
    /// Shutdown has completed. Terminal.
    Stopped = 2,
}

impl PoolState {
    fn from_usize(value: usize) -> Self {
        match value {
            0 => PoolState::Running,
            1 => PoolState::ShuttingDown,
            _ => PoolState::Stopped,
        }
    }
}

/// Advisory snapshot of the pool. Values may be stale under concurrent
/// scaling by the time they are read.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub state: PoolState,
    pub thread_count: usize,
    pub queue_depth: usize,
    pub max_threads: usize,
}

/// State shared between the facade, the workers, and the observer.
///
/// The queue has its own lock; the worker collection has a separate one
/// (facade and observer only). Locks are never held together, so there is
/// no acquisition-order hazard.
pub(crate) struct PoolShared {
    pub(crate) queue: Arc<WorkQueue>,
    pub(crate) workers: Mutex<Vec<Worker>>,
    /// Workers retired by the observer; joined once they report their exit.
    pub(crate) retired: Mutex<Vec<Worker>>,
    pub(crate) max_threads: AtomicUsize,
    pub(crate) cancel: CancelToken,
    pub(crate) config: PoolConfig,
    next_worker_id: AtomicUsize,
    exit_tx: flume::Sender<usize>,
    exit_rx: flume::Receiver<usize>,
}

impl PoolShared {
    /// Spawn one worker at the given priority with a fresh id.
    pub(crate) fn spawn_worker(&self, priority: Priority) -> Result<Worker, PoolError> {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        Worker::spawn(
            id,
            priority,
            Arc::clone(&self.queue),
            &self.config,
            &self.cancel,
            self.exit_tx.clone(),
        )
    }

    /// Join workers whose threads have reported their exit. Keeps both the
    /// live and retired collections honest between observer cycles.
    pub(crate) fn reap_exited(&self) {
        while let Ok(id) = self.exit_rx.try_recv() {
            let retired = {
                let mut retired = self.retired.lock().unwrap();
                retired
                    .iter()
                    .position(|w| w.id() == id)
                    .map(|pos| retired.remove(pos))
            };
            if let Some(mut worker) = retired {
                if worker.join().is_err() {
                    warn!(worker_id = id, "retired worker thread panicked");
                }
                debug!(worker_id = id, "reaped retired worker");
                continue;
            }
            // A live worker may exit on its own under PanicPolicy::StopWorker.
            let live = {
                let mut workers = self.workers.lock().unwrap();
                workers
                    .iter()
                    .position(|w| w.id() == id)
                    .map(|pos| workers.remove(pos))
            };
            if let Some(mut worker) = live {
                if worker.join().is_err() {
                    warn!(worker_id = id, "worker thread panicked");
                }
                debug!(worker_id = id, "reaped stopped worker");
            }
        }
    }

    /// Floor the observer never shrinks below: a quarter of the ceiling,
    /// at least one.
    pub(crate) fn scale_floor(&self) -> usize {
        (self.max_threads.load(Ordering::Relaxed) / 4).max(1)
    }
}

/// A priority-aware worker pool with optional self-scaling.
///
/// Work is fire-and-forget: `submit` enqueues and returns immediately with
/// no completion signal. Callers needing one build it into the closure
/// (a channel, an atomic counter, a `Condvar`).
///
/// # Example
///
/// ```no_run
/// use roost::{Priority, ThreadPool};
///
/// let pool = ThreadPool::new().unwrap();
/// pool.submit(|| println!("background work")).unwrap();
/// pool.submit_with_priority(Priority::Highest, || println!("urgent")).unwrap();
/// pool.shutdown().unwrap();
/// ```
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    observer: Mutex<Option<Observer>>,
    status: AtomicUsize,
}

impl ThreadPool {
    /// Auto-sized pool: processor-count workers, autoscaling enabled.
    pub fn new() -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::default())
    }

    /// Fixed-ceiling pool: starts with `max` workers, autoscaling between
    /// `max(max / 4, 1)` and `max`.
    pub fn with_max_threads(max: usize) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig {
            scaling_mode: ScalingMode::FixedCeiling(max),
            ..PoolConfig::default()
        })
    }

    /// Manually banded pool: exact worker counts per tier, lowest first.
    /// Static for the pool's lifetime; no observer runs.
    pub fn with_tier_counts(counts: [usize; 5]) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig {
            scaling_mode: ScalingMode::Banded(counts),
            ..PoolConfig::default()
        })
    }

    /// Construct from a full configuration. The named constructors above
    /// delegate here.
    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let queue = Arc::new(WorkQueue::new(config.initial_queue_capacity));
        let (exit_tx, exit_rx) = flume::unbounded();
        let ceiling = config.scaling_mode.ceiling();
        let shared = Arc::new(PoolShared {
            queue,
            workers: Mutex::new(Vec::with_capacity(ceiling)),
            retired: Mutex::new(Vec::new()),
            max_threads: AtomicUsize::new(ceiling),
            cancel: CancelToken::new(),
            config,
            next_worker_id: AtomicUsize::new(0),
            exit_tx,
            exit_rx,
        });

        for priority in shared.config.scaling_mode.initial_priorities() {
            match shared.spawn_worker(priority) {
                Ok(worker) => shared.workers.lock().unwrap().push(worker),
                Err(e) => {
                    // Roll back the workers spawned so far before failing.
                    shared.cancel.cancel();
                    shared.queue.notify_all();
                    for mut worker in shared.workers.lock().unwrap().drain(..) {
                        let _ = worker.join();
                    }
                    return Err(e);
                }
            }
        }

        let observer = if shared.config.scaling_mode.autoscaling() {
            match Observer::spawn(Arc::clone(&shared)) {
                Ok(observer) => Some(observer),
                Err(e) => {
                    shared.cancel.cancel();
                    shared.queue.notify_all();
                    for mut worker in shared.workers.lock().unwrap().drain(..) {
                        let _ = worker.join();
                    }
                    return Err(e);
                }
            }
        } else {
            None
        };

        info!(
            workers = shared.workers.lock().unwrap().len(),
            ceiling,
            mode = ?shared.config.scaling_mode,
            "pool started"
        );

        Ok(Self {
            shared,
            observer: Mutex::new(observer),
            status: AtomicUsize::new(PoolState::Running as usize),
        })
    }

    /// Enqueue a job at `Normal` priority. Never blocks beyond the queue's
    /// brief lock hold.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Result<(), PoolError> {
        self.submit_with_priority(Priority::Normal, job)
    }

    /// Enqueue a job at the given tier. Higher tiers are always dequeued
    /// first; equal tiers have no defined order.
    pub fn submit_with_priority(
        &self,
        priority: Priority,
        job: impl FnOnce() + Send + 'static,
    ) -> Result<(), PoolError> {
        if self.state() != PoolState::Running {
            return Err(PoolError::Disposed);
        }
        self.shared.queue.push(WorkItem::new(priority, job));
        Ok(())
    }

    /// Current live worker count. Advisory: may be stale under concurrent
    /// scaling.
    pub fn thread_count(&self) -> usize {
        self.shared.reap_exited();
        self.shared.workers.lock().unwrap().len()
    }

    /// True iff the queue currently holds zero entries. Advisory.
    pub fn is_empty(&self) -> bool {
        self.shared.queue.is_empty()
    }

    /// Ceiling the observer scales up to.
    pub fn max_threads(&self) -> usize {
        self.shared.max_threads.load(Ordering::Relaxed)
    }

    /// Change the scaling ceiling. Takes effect on the observer's next
    /// cycle. Accepted but inert on a banded pool (no observer runs).
    pub fn set_max_threads(&self, max: usize) -> Result<(), PoolError> {
        if self.state() != PoolState::Running {
            return Err(PoolError::Disposed);
        }
        if max == 0 {
            return Err(PoolError::InvalidConfig(
                "worker ceiling must be at least 1".to_string(),
            ));
        }
        self.shared.max_threads.store(max, Ordering::Relaxed);
        Ok(())
    }

    pub fn state(&self) -> PoolState {
        PoolState::from_usize(self.status.load(Ordering::SeqCst))
    }

    /// Advisory snapshot of state, worker count, queue depth and ceiling.
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            state: self.state(),
            thread_count: self.thread_count(),
            queue_depth: self.shared.queue.len(),
            max_threads: self.max_threads(),
        }
    }

    /// Orderly, idempotent shutdown: stop the observer, stop every worker,
    /// join all threads, clear the queue. Concurrent and repeated calls are
    /// safe; only the first does the work, later ones return `Ok` once the
    /// pool is stopped.
    pub fn shutdown(&self) -> Result<(), PoolError> {
        let prior = self.status.compare_exchange(
            PoolState::Running as usize,
            PoolState::ShuttingDown as usize,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if prior.is_err() {
            return Ok(());
        }

        info!("pool shutting down");

        if let Some(observer) = self.observer.lock().unwrap().take() {
            if observer.stop().is_err() {
                warn!("observer thread panicked during shutdown");
            }
        }

        self.shared.cancel.cancel();

        let mut workers = {
            let mut guard = self.shared.workers.lock().unwrap();
            std::mem::take(&mut *guard)
        };
        for worker in &workers {
            worker.stop();
        }
        self.shared.queue.notify_all();

        let mut retired = {
            let mut guard = self.shared.retired.lock().unwrap();
            std::mem::take(&mut *guard)
        };

        let mut join_failures = Vec::new();
        for worker in workers.iter_mut().chain(retired.iter_mut()) {
            if worker.join().is_err() {
                join_failures.push(worker.id());
            }
        }

        self.shared.queue.clear(true);
        self.status.store(PoolState::Stopped as usize, Ordering::SeqCst);
        info!("pool stopped");

        if join_failures.is_empty() {
            Ok(())
        } else {
            Err(PoolError::Shutdown(format!(
                "worker threads panicked before join: {:?}",
                join_failures
            )))
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
