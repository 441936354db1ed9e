use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Entry<T> {
    due: f64,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .total_cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Cooperative timer queue polled from the frame loop.
///
/// Tasks fire in `(due, insertion order)` order; nothing runs until
/// [`TimerQueue::pop_due`] is called with a clock value at or past `due`.
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn schedule(&mut self, due: f64, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { due, seq, task }));
    }

    /// Removes and returns the earliest task whose due time is `<= now`.
    pub fn pop_due(&mut self, now: f64) -> Option<(f64, T)> {
        if self.heap.peek()?.0.due > now {
            return None;
        }
        self.heap.pop().map(|Reverse(entry)| (entry.due, entry.task))
    }

    pub fn next_due(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.0.due)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|entry| &entry.0.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order_then_insertion_order() {
        let mut queue = TimerQueue::default();
        queue.schedule(2.0, "late");
        queue.schedule(1.0, "first");
        queue.schedule(1.0, "second");

        assert_eq!(queue.pop_due(0.5), None);
        assert_eq!(queue.pop_due(1.0), Some((1.0, "first")));
        assert_eq!(queue.pop_due(1.0), Some((1.0, "second")));
        assert_eq!(queue.pop_due(1.5), None);
        assert_eq!(queue.next_due(), Some(2.0));
        assert_eq!(queue.pop_due(10.0), Some((2.0, "late")));
        assert!(queue.is_empty());
    }
}
