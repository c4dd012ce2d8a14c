//! seen.rs: bounded FIFO set of entry identifiers already handled.

use std::collections::{HashSet, VecDeque};

pub const DEFAULT_MAX_SEEN: usize = 200;

#[derive(Debug, Clone)]
pub struct SeenEntrySet {
    order: VecDeque<String>,
    members: HashSet<String>,
    cap: usize,
}

impl Default for SeenEntrySet {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SEEN)
    }
}

impl SeenEntrySet {
    /// A capacity of 0 is treated as 1.
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            order: VecDeque::with_capacity(cap.min(10_000)),
            members: HashSet::with_capacity(cap.min(10_000)),
            cap,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Inserts `id` as the newest member, evicting the oldest once over capacity.
    /// Re-recording a present id is a no-op and keeps its original position.
    /// Returns true when `id` was not present before.
    pub fn record(&mut self, id: &str) -> bool {
        if self.members.contains(id) {
            return false;
        }
        self.order.push_back(id.to_string());
        self.members.insert(id.to_string());

        if self.order.len() > self.cap {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}
