//! Most-recent-first activity log with bounded retention.

use std::collections::VecDeque;

use maestro_protocol::{LogEvent, StatusKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Arrival order within the session, starting at 1
    pub seq: u64,
    pub agent: String,
    pub text: String,
    pub status: StatusKind,
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
    next_seq: u64,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            next_seq: 1,
        }
    }

    /// Prepend an entry, evicting the oldest once over capacity.
    pub fn record(&mut self, event: &LogEvent) -> &ActivityEntry {
        let entry = ActivityEntry {
            seq: self.next_seq,
            agent: event.agent.clone(),
            text: event.text.clone(),
            status: event.status_kind(),
        };
        self.next_seq += 1;
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn latest(&self, count: usize) -> Vec<ActivityEntry> {
        self.entries.iter().take(count).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
