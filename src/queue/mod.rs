//! Shared work queue: the priority heap behind a blocking lock.
//!
//! The queue is the single resource shared by every worker and the pool
//! facade; all mutation happens under one mutex. Idle workers park on a
//! condvar signalled on every push instead of busy-polling, which preserves
//! the dequeue-order contract (highest tier first among visible entries)
//! while keeping idle CPU cost near zero.

pub mod heap;

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::priority::Priority;
use crate::task::WorkItem;

pub use heap::PriorityHeap;

/// Thread-safe priority queue adapter over [`PriorityHeap`].
pub struct WorkQueue {
    heap: Mutex<PriorityHeap>,
    available: Condvar,
}

impl WorkQueue {
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            heap: Mutex::new(PriorityHeap::new(initial_capacity)),
            available: Condvar::new(),
        }
    }

    /// Enqueue one entry and wake one parked worker. Never blocks beyond the
    /// brief lock hold.
    pub fn push(&self, item: WorkItem) {
        self.heap.lock().unwrap().insert(item);
        self.available.notify_one();
    }

    /// Dequeue the highest-tier entry if any is present right now.
    pub fn try_pop(&self) -> Option<WorkItem> {
        self.heap.lock().unwrap().remove_max().ok()
    }

    /// Dequeue the highest-tier entry, waiting up to `timeout` for one to
    /// arrive. Non-emptiness is re-checked under the lock after every wakeup,
    /// so a worker that loses the race to a sibling simply waits again.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<WorkItem> {
        let deadline = Instant::now() + timeout;
        let mut heap = self.heap.lock().unwrap();
        loop {
            if let Ok(item) = heap.remove_max() {
                return Some(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, wait) = self
                .available
                .wait_timeout(heap, deadline - now)
                .unwrap();
            heap = guard;
            if wait.timed_out() {
                return heap.remove_max().ok();
            }
        }
    }

    /// Snapshot of the current queue depth.
    pub fn len(&self) -> usize {
        self.heap.lock().unwrap().len()
    }

    /// Snapshot; may change by the time the value is used.
    pub fn is_empty(&self) -> bool {
        self.heap.lock().unwrap().is_empty()
    }

    /// Linear scan for an entry at `tier`.
    pub fn contains_tier(&self, tier: Priority) -> bool {
        self.heap.lock().unwrap().contains_tier(tier)
    }

    /// Drop all queued entries; see [`PriorityHeap::clear`] for `deep`.
    pub fn clear(&self, deep: bool) {
        self.heap.lock().unwrap().clear(deep);
    }

    /// Wake every parked worker so it re-checks its lifecycle flags. Used at
    /// shutdown and when retiring a worker.
    pub fn notify_all(&self) {
        self.available.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_push_pop_order() {
        let queue = WorkQueue::new(4);
        queue.push(WorkItem::new(Priority::Lowest, || {}));
        queue.push(WorkItem::new(Priority::Highest, || {}));
        queue.push(WorkItem::new(Priority::Normal, || {}));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop().unwrap().priority, Priority::Highest);
        assert_eq!(queue.try_pop().unwrap().priority, Priority::Normal);
        assert_eq!(queue.try_pop().unwrap().priority, Priority::Lowest);
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_pop_timeout_expires_empty() {
        let queue = WorkQueue::new(4);
        let start = Instant::now();
        assert!(queue.pop_timeout(Duration::from_millis(20)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_pop_timeout_wakes_on_push() {
        let queue = Arc::new(WorkQueue::new(4));
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                queue.push(WorkItem::new(Priority::AboveNormal, || {}));
            })
        };
        let item = queue.pop_timeout(Duration::from_secs(5));
        producer.join().unwrap();
        assert_eq!(item.unwrap().priority, Priority::AboveNormal);
    }

    #[test]
    fn test_clear_empties_queue() {
        let queue = WorkQueue::new(4);
        for _ in 0..10 {
            queue.push(WorkItem::new(Priority::Normal, || {}));
        }
        queue.clear(true);
        assert!(queue.is_empty());
        assert!(!queue.contains_tier(Priority::Normal));
    }
}
