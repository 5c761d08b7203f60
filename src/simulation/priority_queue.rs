//! Min-priority queue used by the grid search
//!
//! Entries are ordered by `(priority, insertion sequence)`, so items with the
//! same priority come out in the order they went in. The queue never
//! deduplicates; callers keep their own closed set.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct HeapNode<T> {
    key: Reverse<(i64, u64)>,
    item: T,
}

// Ordering looks at the key only, so `T` needs no bounds
impl<T> PartialEq for HeapNode<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for HeapNode<T> {}

impl<T> PartialOrd for HeapNode<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for HeapNode<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Stable min-priority queue
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    heap: BinaryHeap<HeapNode<T>>,
    next_seq: u64,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// The capacity is only an allocation hint
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn enqueue(&mut self, item: T, priority: i64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapNode {
            key: Reverse((priority, seq)),
            item,
        });
    }

    /// Removes the lowest-priority item, or `None` when the queue is empty
    pub fn dequeue(&mut self) -> Option<T> {
        self.heap.pop().map(|node| node.item)
    }

    /// Empties the queue and restarts the insertion sequence
    pub fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }
}
