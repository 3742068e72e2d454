//! Timer heap for the virtual clock.
//!
//! A min-heap of deadlines paired with a callback table. Cleared timers are
//! removed from the table only; their heap entries are skipped when popped.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Handle returned by [`set_timer`](super::set_timer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Returns the raw generation number.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct TimerEntry {
    deadline: u64,
    /// Insertion order; breaks deadline ties first-in first-out.
    generation: u64,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest deadline first)
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) type TimerCallback = Box<dyn FnOnce()>;

/// A min-heap of timers ordered by deadline.
#[derive(Default)]
pub(crate) struct TimerHeap {
    heap: BinaryHeap<TimerEntry>,
    callbacks: HashMap<u64, TimerCallback>,
    next_generation: u64,
}

impl TimerHeap {
    /// Number of live (not cleared) timers.
    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub(crate) fn insert(&mut self, deadline: u64, callback: TimerCallback) -> TimerId {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.heap.push(TimerEntry {
            deadline,
            generation,
        });
        self.callbacks.insert(generation, callback);
        TimerId(generation)
    }

    /// Removes a pending timer, handing its callback back so the caller can
    /// drop it outside any borrow of the event loop.
    pub(crate) fn remove(&mut self, id: TimerId) -> Option<TimerCallback> {
        self.callbacks.remove(&id.0)
    }

    /// Earliest live deadline, discarding stale entries on the way.
    pub(crate) fn peek_deadline(&mut self) -> Option<u64> {
        while let Some(entry) = self.heap.peek() {
            if self.callbacks.contains_key(&entry.generation) {
                return Some(entry.deadline);
            }
            self.heap.pop();
        }
        None
    }

    /// Pops the earliest timer whose deadline is at or before `limit`.
    pub(crate) fn pop_due(&mut self, limit: u64) -> Option<(u64, TimerCallback)> {
        let deadline = self.peek_deadline()?;
        if deadline > limit {
            return None;
        }
        let entry = self.heap.pop()?;
        let callback = self.callbacks.remove(&entry.generation)?;
        Some((entry.deadline, callback))
    }

    /// Drains every callback, live or not, for teardown.
    pub(crate) fn take_all(&mut self) -> Vec<TimerCallback> {
        self.heap.clear();
        self.callbacks.drain().map(|(_, cb)| cb).collect()
    }
}
