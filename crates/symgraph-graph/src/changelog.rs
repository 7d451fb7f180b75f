use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use symgraph_core::{SymbolChange, SymbolId};

/// Bounded history of symbol changes, newest at the back.
///
/// The log is the source of truth for "what changed and when"; capacity and
/// retention bound its memory.
#[derive(Debug)]
pub struct ChangeLog {
    entries: VecDeque<SymbolChange>,
    capacity: usize,
}

impl ChangeLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, change: SymbolChange) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(change);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<SymbolChange> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent entries touching `id`, newest first.
    pub fn for_symbol(&self, id: SymbolId, limit: usize) -> Vec<SymbolChange> {
        self.entries
            .iter()
            .rev()
            .filter(|c| c.symbol_id == id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Drop entries older than `cutoff`; returns how many were removed.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        // Entries are appended in time order, so pruning stops at the first
        // entry inside the window.
        while let Some(front) = self.entries.front() {
            if front.timestamp < cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
        before - self.entries.len()
    }
}
