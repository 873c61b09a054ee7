//! Bounded in-memory history of recent log entries.
//!
//! The buffer is a fixed-capacity FIFO ring: pushing into a full buffer evicts
//! the oldest entry, so the length never exceeds the capacity.

use std::collections::VecDeque;

pub const LOG_BUFFER_CAPACITY: usize = 1_000;

#[derive(Debug, Clone)]
pub struct LogRingBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
    evicted_total: u64,
}

impl<T> Default for LogRingBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(LOG_BUFFER_CAPACITY)
    }
}

impl<T> LogRingBuffer<T> {
    /// A zero capacity is bumped to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            evicted_total: 0,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted_total = self.evicted_total.saturating_add(1);
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries dropped to make room since creation.
    pub const fn evicted_total(&self) -> u64 {
        self.evicted_total
    }

    /// The most recent `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &T> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
