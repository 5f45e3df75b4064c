//! Array-backed binary heap ordering work items by tier.
//!
//! Keyed so the *highest* tier surfaces at the root: `remove_max` always
//! returns the extremal entry among those present. The heap is not stable —
//! entries with equal tiers come back in an implementation-defined order.
//!
//! Capacity management is explicit. The backing storage doubles before an
//! insert would overflow it, and a deep clear releases storage back down to
//! the capacity the heap was constructed with.

use crate::error::QueueError;
use crate::priority::Priority;
use crate::task::WorkItem;

/// Growable binary heap of [`WorkItem`]s, strongest tier first.
pub struct PriorityHeap {
    items: Vec<WorkItem>,
    /// Capacity at construction; deep clears return to this.
    initial_capacity: usize,
}

impl PriorityHeap {
    /// Create a heap with room for `initial_capacity` entries before the
    /// first growth. A zero capacity is rounded up to one.
    pub fn new(initial_capacity: usize) -> Self {
        let initial_capacity = initial_capacity.max(1);
        Self {
            items: Vec::with_capacity(initial_capacity),
            initial_capacity,
        }
    }

    /// Insert an entry, doubling the backing storage first when full.
    /// O(log n).
    pub fn insert(&mut self, item: WorkItem) {
        if self.items.len() == self.items.capacity() {
            // Double rather than letting Vec pick a growth factor, so the
            // externally observable capacity contract holds.
            self.items.reserve_exact(self.items.capacity());
        }
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    /// Remove and return the highest-tier entry. O(log n).
    pub fn remove_max(&mut self) -> Result<WorkItem, QueueError> {
        if self.items.is_empty() {
            return Err(QueueError::Empty);
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let item = self.items.pop().ok_or(QueueError::Empty)?;
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        Ok(item)
    }

    /// Tier of the entry `remove_max` would return next. O(1).
    pub fn peek(&self) -> Result<Priority, QueueError> {
        self.items.first().map(|it| it.priority).ok_or(QueueError::Empty)
    }

    /// Drop all entries. A deep clear additionally releases backing storage
    /// back to the construction capacity; a shallow clear keeps whatever
    /// capacity has been grown.
    pub fn clear(&mut self, deep: bool) {
        self.items.clear();
        if deep {
            self.items.shrink_to(self.initial_capacity);
        }
    }

    /// Linear scan for any entry at the given tier. Not on the hot path.
    pub fn contains_tier(&self, tier: Priority) -> bool {
        self.items.iter().any(|it| it.priority == tier)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.items[i].priority > self.items[parent].priority {
                self.items.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * i + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            // Pick the stronger child; ties between siblings go right, which
            // is part of why equal-tier ordering is unspecified.
            let mut strongest = left;
            if right < len && self.items[right].priority >= self.items[left].priority {
                strongest = right;
            }
            if self.items[strongest].priority > self.items[i].priority {
                self.items.swap(i, strongest);
                i = strongest;
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::ALL_TIERS;

    fn item(tier: Priority) -> WorkItem {
        WorkItem::new(tier, || {})
    }

    #[test]
    fn test_remove_max_returns_highest_tier() {
        let mut heap = PriorityHeap::new(8);
        heap.insert(item(Priority::Lowest));
        heap.insert(item(Priority::Highest));
        heap.insert(item(Priority::Normal));
        heap.insert(item(Priority::BelowNormal));
        heap.insert(item(Priority::AboveNormal));

        let mut seen = Vec::new();
        while let Ok(it) = heap.remove_max() {
            seen.push(it.priority);
        }
        assert_eq!(
            seen,
            vec![
                Priority::Highest,
                Priority::AboveNormal,
                Priority::Normal,
                Priority::BelowNormal,
                Priority::Lowest,
            ]
        );
    }

    #[test]
    fn test_every_entry_returned_exactly_once() {
        let mut heap = PriorityHeap::new(4);
        let mut expected = [0usize; 5];
        for round in 0..40 {
            let tier = ALL_TIERS[round % 5];
            expected[tier.as_index() as usize] += 1;
            heap.insert(item(tier));
        }
        let mut counts = [0usize; 5];
        let mut prev = Priority::Highest;
        while let Ok(it) = heap.remove_max() {
            // Never ascending: the extremal entry always comes out first.
            assert!(it.priority <= prev);
            prev = it.priority;
            counts[it.priority.as_index() as usize] += 1;
        }
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_empty_heap_errors() {
        let mut heap = PriorityHeap::new(2);
        assert_eq!(heap.remove_max().unwrap_err(), QueueError::Empty);
        assert_eq!(heap.peek().unwrap_err(), QueueError::Empty);
    }

    #[test]
    fn test_peek_matches_remove_max() {
        let mut heap = PriorityHeap::new(2);
        heap.insert(item(Priority::BelowNormal));
        heap.insert(item(Priority::AboveNormal));
        assert_eq!(heap.peek().unwrap(), Priority::AboveNormal);
        assert_eq!(heap.remove_max().unwrap().priority, Priority::AboveNormal);
        assert_eq!(heap.peek().unwrap(), Priority::BelowNormal);
    }

    #[test]
    fn test_growth_doubles_and_preserves_entries() {
        let mut heap = PriorityHeap::new(4);
        let before = heap.capacity();
        for i in 0..(before * 3) {
            heap.insert(item(ALL_TIERS[i % 5]));
        }
        assert!(heap.capacity() >= before * 2);
        assert!(heap.capacity() >= heap.len());

        // Nothing lost across growth, still in priority order.
        let mut prev = Priority::Highest;
        let mut drained = 0;
        while let Ok(it) = heap.remove_max() {
            assert!(it.priority <= prev);
            prev = it.priority;
            drained += 1;
        }
        assert_eq!(drained, before * 3);
    }

    #[test]
    fn test_shallow_clear_keeps_grown_capacity() {
        let mut heap = PriorityHeap::new(2);
        for _ in 0..32 {
            heap.insert(item(Priority::Normal));
        }
        let grown = heap.capacity();
        assert!(grown > 2);
        heap.clear(false);
        assert!(heap.is_empty());
        assert_eq!(heap.capacity(), grown);
    }

    #[test]
    fn test_deep_clear_restores_initial_capacity() {
        let mut heap = PriorityHeap::new(2);
        for _ in 0..32 {
            heap.insert(item(Priority::Normal));
        }
        assert!(heap.capacity() > 2);
        heap.clear(true);
        assert!(heap.is_empty());
        assert_eq!(heap.capacity(), 2);
    }

    #[test]
    fn test_contains_tier() {
        let mut heap = PriorityHeap::new(4);
        heap.insert(item(Priority::Highest));
        heap.insert(item(Priority::Lowest));
        assert!(heap.contains_tier(Priority::Highest));
        assert!(heap.contains_tier(Priority::Lowest));
        assert!(!heap.contains_tier(Priority::Normal));
    }
}
