//! The unit of work flowing through the pool.

use std::fmt;

use crate::priority::Priority;

/// A submitted job. The caller's state object is whatever the closure
/// captures; the pool never inspects it.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// One queued entry: a priority tier plus the job to run.
///
/// Created at submission, consumed exactly once at dequeue, never mutated
/// and never re-enqueued by the pool. Ordering in the queue considers the
/// tier only; entries with equal tiers have no defined relative order.
pub struct WorkItem {
    /// Tier used to order this entry in the queue.
    pub priority: Priority,
    /// The callback to invoke on a worker thread.
    pub job: Job,
}

impl WorkItem {
    pub fn new(priority: Priority, job: impl FnOnce() + Send + 'static) -> Self {
        Self {
            priority,
            job: Box::new(job),
        }
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("priority", &self.priority)
            .finish()
    }
}
