//! Completion ledger and phase progress.
//!
//! The ledger is the set of completed day numbers. Everything shown as
//! progress (streak, phase, phase completion, next day) is derived from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Days per phase
pub const PHASE_LENGTH: u32 = 30;

/// Set of completed days
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionLedger {
    days: BTreeSet<u32>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a day as completed. Returns false if it already was.
    pub fn record_completion(&mut self, day: u32) -> bool {
        let inserted = self.days.insert(day);
        if inserted {
            tracing::info!("Recorded completion of day {}", day);
        } else {
            tracing::debug!("Day {} already completed", day);
        }
        inserted
    }

    pub fn contains(&self, day: u32) -> bool {
        self.days.contains(&day)
    }

    /// Completed days in ascending order
    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        self.days.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Number of distinct completed days
    pub fn streak(&self) -> u32 {
        self.days.len() as u32
    }

    /// 1-based phase the user is in
    pub fn current_phase(&self) -> u32 {
        self.streak() / PHASE_LENGTH + 1
    }

    /// Day offset the current phase starts after
    pub fn phase_start(&self) -> u32 {
        (self.current_phase() - 1) * PHASE_LENGTH
    }

    /// Completed days within `(phase_start, phase_start + 30]`
    pub fn phase_progress(&self) -> u32 {
        let start = self.phase_start();
        self.days.range(start + 1..=start + PHASE_LENGTH).count() as u32
    }

    /// Phase completion as a whole percentage
    pub fn phase_percent(&self) -> u32 {
        (f64::from(self.phase_progress()) * 100.0 / f64::from(PHASE_LENGTH)).round() as u32
    }

    /// The day after the highest completed day, or day 1
    ///
    /// Saturates at `u32::MAX`, which stays the next day once completed.
    pub fn next_available_day(&self) -> u32 {
        self.days.last().map_or(1, |last| last.saturating_add(1))
    }

    /// Forget every completed day
    pub fn reset(&mut self) {
        tracing::info!("Clearing {} completed days", self.days.len());
        self.days.clear();
    }
}

impl FromIterator<u32> for CompletionLedger {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

/// Whether a day is ahead of the next sequential day.
///
/// This is a presentation policy; the engine itself accepts any day.
pub fn is_day_locked(day: u32, next_available_day: u32) -> bool {
    day > next_available_day
}
