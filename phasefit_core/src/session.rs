//! Live workout session state machine.
//!
//! A session walks the plan one exercise at a time:
//!
//! ```text
//! Idle --start--> Exercising --complete--> Resting --tick to 0 / skip rest--> Exercising(next)
//!                     |                                                         ...
//!                     +--complete on last exercise--> Idle (summary + ledger write)
//! ```
//!
//! Every operation returns a [`Transition`]. Calls that are not legal in the
//! current state return [`Transition::Ignored`] and leave the session as is.

use crate::accounting;
use crate::catalog::Catalog;
use crate::ledger::CompletionLedger;
use crate::plan::generate_plan;
use crate::{Category, PlanItem, SessionSummary};
use chrono::{DateTime, Utc};

/// Where the session currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Exercising,
    Resting,
}

/// Outcome of a session operation
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Not legal in the current state; nothing changed
    Ignored,
    /// Now performing the exercise at `index`
    Exercising { index: usize },
    /// Rest countdown running with `remaining` seconds left
    Resting { remaining: u32 },
    /// Last exercise done; the day was recorded
    Completed(SessionSummary),
    /// Session discarded without recording
    Aborted,
}

/// An in-progress workout
#[derive(Clone, Debug, Default)]
pub struct Session {
    active: bool,
    day: u32,
    exercise_index: usize,
    resting: bool,
    rest_remaining: u32,
    rest_duration: u32,
    started_at: Option<DateTime<Utc>>,
    focus: Option<Category>,
    plan: Vec<PlanItem>,
}

impl Session {
    /// A session with nothing in progress
    pub fn idle() -> Self {
        Self::default()
    }

    /// Begin a workout for `day`
    pub fn start(
        catalog: &Catalog,
        day: u32,
        focus: Option<Category>,
        rest_duration_seconds: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let plan = generate_plan(catalog, day, focus);
        tracing::info!(
            "Starting day {} ({} exercises, focus: {:?})",
            day,
            plan.len(),
            focus
        );

        Self {
            // An empty plan has nothing to walk through
            active: !plan.is_empty(),
            day,
            exercise_index: 0,
            resting: false,
            rest_remaining: rest_duration_seconds,
            rest_duration: rest_duration_seconds,
            started_at: Some(now),
            focus,
            plan,
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.active, self.resting) {
            (false, _) => SessionState::Idle,
            (true, false) => SessionState::Exercising,
            (true, true) => SessionState::Resting,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_resting(&self) -> bool {
        self.active && self.resting
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn focus(&self) -> Option<Category> {
        self.focus
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn rest_remaining(&self) -> u32 {
        self.rest_remaining
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn plan(&self) -> &[PlanItem] {
        &self.plan
    }

    /// The exercise being performed, or the one just finished while resting
    pub fn current_exercise(&self) -> Option<&PlanItem> {
        self.active.then(|| self.plan.get(self.exercise_index)).flatten()
    }

    /// The exercise that follows the current one
    pub fn next_exercise(&self) -> Option<&PlanItem> {
        self.active
            .then(|| self.plan.get(self.exercise_index + 1))
            .flatten()
    }

    fn is_last(&self) -> bool {
        self.exercise_index + 1 >= self.plan.len()
    }

    /// Finish the current exercise
    ///
    /// Before the last exercise this starts the rest countdown. On the last
    /// exercise it records the day in `ledger`, deactivates the session and
    /// returns the summary.
    pub fn complete_current_exercise(
        &mut self,
        ledger: &mut CompletionLedger,
        body_weight_kg: f64,
        now: DateTime<Utc>,
    ) -> Transition {
        if self.state() != SessionState::Exercising {
            return Transition::Ignored;
        }

        if !self.is_last() {
            self.resting = true;
            self.rest_remaining = self.rest_duration;
            tracing::debug!(
                "Exercise {} done, resting {}s",
                self.exercise_index,
                self.rest_remaining
            );
            return Transition::Resting {
                remaining: self.rest_remaining,
            };
        }

        let summary = accounting::summarize(
            self.day,
            self.focus,
            &self.plan,
            body_weight_kg,
            self.started_at,
            now,
        );
        ledger.record_completion(self.day);
        self.deactivate();

        tracing::info!(
            "Day {} complete: {} kcal in {} min",
            summary.day,
            summary.calories_burned,
            summary.duration_minutes
        );
        Transition::Completed(summary)
    }

    /// Jump to the next exercise without resting. Not available on the last one.
    pub fn skip_forward(&mut self) -> Transition {
        if self.state() != SessionState::Exercising || self.is_last() {
            return Transition::Ignored;
        }
        self.exercise_index += 1;
        self.resting = false;
        Transition::Exercising {
            index: self.exercise_index,
        }
    }

    /// Go back to the previous exercise
    pub fn skip_backward(&mut self) -> Transition {
        if self.state() != SessionState::Exercising || self.exercise_index == 0 {
            return Transition::Ignored;
        }
        self.exercise_index -= 1;
        self.resting = false;
        Transition::Exercising {
            index: self.exercise_index,
        }
    }

    /// End the rest countdown now
    pub fn skip_rest(&mut self) -> Transition {
        if self.state() != SessionState::Resting {
            return Transition::Ignored;
        }
        self.rest_remaining = 0;
        self.finish_rest()
    }

    /// One second of rest elapsed
    ///
    /// Ticks outside of a rest period, including any delivered after the
    /// session ended, are ignored.
    pub fn tick(&mut self) -> Transition {
        if self.state() != SessionState::Resting {
            return Transition::Ignored;
        }

        self.rest_remaining = self.rest_remaining.saturating_sub(1);
        if self.rest_remaining > 0 {
            return Transition::Resting {
                remaining: self.rest_remaining,
            };
        }
        self.finish_rest()
    }

    /// Discard the session. The ledger is never touched.
    pub fn abort(&mut self) -> Transition {
        if !self.active {
            return Transition::Ignored;
        }
        tracing::info!(
            "Aborted day {} at exercise {}",
            self.day,
            self.exercise_index
        );
        self.deactivate();
        Transition::Aborted
    }

    // Shared by the countdown and skip_rest
    fn finish_rest(&mut self) -> Transition {
        self.resting = false;
        if !self.is_last() {
            self.exercise_index += 1;
        }
        Transition::Exercising {
            index: self.exercise_index,
        }
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.resting = false;
    }
}
