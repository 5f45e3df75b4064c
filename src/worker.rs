//! # Worker Unit
//!
//! One dedicated OS thread that repeatedly dequeues and executes a single
//! work item. Each worker owns a lifecycle record (`WorkerShared`) that the
//! observer and the pool facade reach through an `Arc`: a `running` flag, a
//! `working` flag, a per-worker cancellation token derived from the pool
//! token, and the assigned priority step.
//!
//! The worker applies its assigned OS priority to itself — at startup and
//! whenever the observer's bookkeeping value changes — so no thread ever
//! touches another thread's scheduling parameters.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error};

use crate::cancel::CancelToken;
use crate::config::{PanicPolicy, PoolConfig};
use crate::error::PoolError;
use crate::os;
use crate::priority::Priority;
use crate::queue::WorkQueue;

/// Lifecycle record shared between a worker's thread, the observer, and the
/// pool facade. Only the observer (scaling, priority steps) and the facade
/// (shutdown) mutate it from outside the worker thread.
pub(crate) struct WorkerShared {
    id: usize,
    running: AtomicBool,
    working: AtomicBool,
    cancel: CancelToken,
    priority: AtomicU8,
}

impl WorkerShared {
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// True while a job is executing on this worker's thread.
    pub(crate) fn is_working(&self) -> bool {
        self.working.load(Ordering::Relaxed)
    }

    /// Signal the worker to stop. If it is mid-job it finishes that job
    /// first; it never claims another entry afterwards.
    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.cancel.cancel();
    }

    /// Assigned priority step (bookkeeping; OS application is best-effort).
    pub(crate) fn priority(&self) -> Priority {
        Priority::from_index(self.priority.load(Ordering::Relaxed))
    }

    /// One step up the ladder, saturating at `Highest`.
    pub(crate) fn promote(&self) {
        let next = self.priority().promote();
        self.priority.store(next.as_index(), Ordering::Relaxed);
    }

    /// One step down the ladder, saturating at `Lowest`.
    pub(crate) fn demote(&self) {
        let next = self.priority().demote();
        self.priority.store(next.as_index(), Ordering::Relaxed);
    }
}

/// Handle to one worker: its shared lifecycle record plus the join handle
/// for its thread. Owned by the pool's worker collection.
pub(crate) struct Worker {
    shared: Arc<WorkerShared>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker thread with the given id and starting priority.
    ///
    /// The worker's cancellation token is derived from `pool_cancel`, so
    /// cancelling the pool stops every worker while each worker stays
    /// independently stoppable.
    pub(crate) fn spawn(
        id: usize,
        priority: Priority,
        queue: Arc<WorkQueue>,
        config: &PoolConfig,
        pool_cancel: &CancelToken,
        exit_tx: flume::Sender<usize>,
    ) -> Result<Worker, PoolError> {
        let shared = Arc::new(WorkerShared {
            id,
            running: AtomicBool::new(true),
            working: AtomicBool::new(false),
            cancel: pool_cancel.child(),
            priority: AtomicU8::new(priority.as_index()),
        });

        let thread_shared = Arc::clone(&shared);
        let idle_poll = config.idle_poll;
        let panic_policy = config.panic_policy;
        let handle = std::thread::Builder::new()
            .name(format!("{}-{}", config.thread_name_prefix, id))
            .spawn(move || {
                run_loop(thread_shared, queue, idle_poll, panic_policy, exit_tx);
            })
            .map_err(|e| {
                PoolError::ThreadSetup(format!("failed to spawn worker {}: {}", id, e))
            })?;

        Ok(Worker {
            shared,
            handle: Some(handle),
        })
    }

    pub(crate) fn id(&self) -> usize {
        self.shared.id
    }

    pub(crate) fn shared(&self) -> &Arc<WorkerShared> {
        &self.shared
    }

    /// Signal this worker to stop without waiting for it.
    pub(crate) fn stop(&self) {
        self.shared.stop();
    }

    /// Wait for the worker thread to exit. Safe to call more than once.
    pub(crate) fn join(&mut self) -> std::thread::Result<()> {
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

/// Main loop: Idle -> Executing -> Idle until stopped or cancelled.
fn run_loop(
    shared: Arc<WorkerShared>,
    queue: Arc<WorkQueue>,
    idle_poll: Duration,
    panic_policy: PanicPolicy,
    exit_tx: flume::Sender<usize>,
) {
    let mut applied = shared.priority();
    os::set_current_thread_priority(applied);
    debug!(worker_id = shared.id, priority = %applied, "worker started");

    while shared.is_running() && !shared.cancel.is_cancelled() {
        let assigned = shared.priority();
        if assigned != applied {
            os::set_current_thread_priority(assigned);
            applied = assigned;
        }

        let Some(item) = queue.pop_timeout(idle_poll) else {
            continue;
        };

        shared.working.store(true, Ordering::SeqCst);
        let job = item.job;
        let result = panic::catch_unwind(AssertUnwindSafe(move || job()));
        shared.working.store(false, Ordering::SeqCst);

        if let Err(payload) = result {
            let message = panic_message(payload.as_ref());
            error!(worker_id = shared.id, %message, "submitted job panicked");
            match panic_policy {
                PanicPolicy::Resume => {}
                PanicPolicy::StopWorker => {
                    shared.running.store(false, Ordering::SeqCst);
                }
                PanicPolicy::Escalate => {
                    std::process::abort();
                }
            }
        }
    }

    debug!(worker_id = shared.id, "worker stopped");
    // Disconnected receiver just means the pool is already tearing down.
    let _ = exit_tx.send(shared.id);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    }
}
