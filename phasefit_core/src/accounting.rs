//! Energy and duration accounting for finished sessions.

use crate::{Category, PlanItem, SessionSummary};
use chrono::{DateTime, Utc};

/// Nominal time charged to every exercise in a plan
pub const NOMINAL_EXERCISE_SECONDS: f64 = 60.0;

/// Energy expenditure in kcal using the MET formula
pub fn calories_for(item: &PlanItem, duration_seconds: f64, body_weight_kg: f64) -> f64 {
    item.met() * body_weight_kg * (duration_seconds / 3600.0)
}

/// Total kcal for a plan, charging each exercise a flat nominal minute
pub fn total_calories(plan: &[PlanItem], body_weight_kg: f64) -> u32 {
    let total: f64 = plan
        .iter()
        .map(|item| calories_for(item, NOMINAL_EXERCISE_SECONDS, body_weight_kg))
        .sum();
    total.max(0.0).round() as u32
}

/// Whole minutes of wall-clock time between start and now
///
/// A clock that moved backwards yields zero.
pub fn elapsed_minutes(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let minutes = (now - started_at).num_seconds().max(0) / 60;
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Build the summary emitted when a session completes
pub fn summarize(
    day: u32,
    focus: Option<Category>,
    plan: &[PlanItem],
    body_weight_kg: f64,
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SessionSummary {
    SessionSummary {
        day,
        focus,
        calories_burned: total_calories(plan, body_weight_kg),
        duration_minutes: started_at.map_or(0, |start| elapsed_minutes(start, now)),
        exercise_count: plan.len(),
    }
}
