//! Fixed-size ring buffer of past `GameState` snapshots, used to
//! rewind shot origins for lag compensation. Size =
//! ceil(lag_budget_ms / tick_interval_ms) = 6 at 30 TPS / 200ms budget.

use crate::config;
use crate::match_engine::state::GameState;

#[derive(Debug, Clone)]
struct Entry {
    wall_clock_ms: u64,
    state: GameState,
}

pub struct StateHistoryRing {
    capacity: usize,
    entries: Vec<Entry>,
    next_write: usize,
}

impl StateHistoryRing {
    pub fn new() -> Self {
        Self::with_capacity(config::HISTORY_RING_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity, entries: Vec::with_capacity(capacity), next_write: 0 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write a snapshot into the ring, overwriting the oldest entry by
    /// index arithmetic. The buffer never grows beyond `capacity`.
    pub fn push(&mut self, wall_clock_ms: u64, state: GameState) {
        let entry = Entry { wall_clock_ms, state };
        if self.entries.len() < self.capacity {
            self.entries.push(entry);
        } else {
            self.entries[self.next_write] = entry;
        }
        self.next_write = (self.next_write + 1) % self.capacity;
    }

    /// The snapshot whose stored wall-clock time is closest to
    /// `timestamp_ms`. Falls back to `live` if the ring is empty.
    pub fn state_at<'a>(&'a self, timestamp_ms: u64, live: &'a GameState) -> &'a GameState {
        if self.entries.is_empty() {
            return live;
        }
        self.entries
            .iter()
            .min_by_key(|e| e.wall_clock_ms.abs_diff(timestamp_ms))
            .map(|e| &e.state)
            .unwrap_or(live)
    }
}

impl Default for StateHistoryRing {
    fn default() -> Self {
        Self::new()
    }
}
