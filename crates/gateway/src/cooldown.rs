//! Per-(user, command) cooldown table.
//!
//! `check_and_set` is one critical section per key — DashMap's entry API
//! holds the shard lock across the read-compare-write, so two racing
//! invocations of the same key serialize and exactly one passes.

use {
    dashmap::{DashMap, mapref::entry::Entry},
    herald_common::UserId,
    std::time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    /// Proceed; the timestamp was recorded.
    Ready,
    /// Rejected; this long remains of the window.
    Wait(Duration),
}

#[derive(Default)]
pub struct CooldownTable {
    entries: DashMap<(UserId, String), Instant>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check the window and record `now` if it passed.
    pub fn check_and_set(
        &self,
        user: UserId,
        command: &str,
        window: Duration,
        now: Instant,
    ) -> CooldownDecision {
        match self.entries.entry((user, command.to_string())) {
            Entry::Occupied(mut occupied) => {
                let elapsed = now.saturating_duration_since(*occupied.get());
                if elapsed < window {
                    CooldownDecision::Wait(window - elapsed)
                } else {
                    occupied.insert(now);
                    CooldownDecision::Ready
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                CooldownDecision::Ready
            },
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
