//! Daily plan generation.
//!
//! A plan is a pure function of the day number and an optional focus
//! category:
//! - With a focus, every exercise of that category is included
//! - Without one, each category contributes the exercise at
//!   `day mod len`, rotating through the category as days advance
//!
//! Reps grow linearly by 5% of the baseline per day, without a ceiling.

use crate::catalog::Catalog;
use crate::{Category, Exercise, PlanItem};

/// Per-day growth of the rep multiplier
pub const DAILY_INTENSITY_STEP: f64 = 0.05;

/// Rep multiplier for a day. Day 1 is the baseline.
pub fn intensity(day: u32) -> f64 {
    1.0 + f64::from(day.max(1) - 1) * DAILY_INTENSITY_STEP
}

/// Baseline reps scaled for a day, rounded to the nearest integer
pub fn scale_reps(base_reps: u32, day: u32) -> u32 {
    (f64::from(base_reps) * intensity(day)).round() as u32
}

fn plan_item(exercise: &Exercise, day: u32) -> PlanItem {
    PlanItem {
        exercise: exercise.clone(),
        reps: scale_reps(exercise.base_reps, day),
    }
}

/// Generate the ordered exercise plan for a day
pub fn generate_plan(catalog: &Catalog, day: u32, focus: Option<Category>) -> Vec<PlanItem> {
    let plan: Vec<PlanItem> = match focus {
        Some(category) => catalog
            .exercises_in(category)
            .iter()
            .map(|e| plan_item(e, day))
            .collect(),
        None => Category::ALL
            .iter()
            .filter_map(|&category| {
                let exercises = catalog.exercises_in(category);
                if exercises.is_empty() {
                    return None;
                }
                let pick = day as usize % exercises.len();
                Some(plan_item(&exercises[pick], day))
            })
            .collect(),
    };

    tracing::debug!(
        "Generated plan for day {} (focus: {:?}): {} exercises at {:.2}x",
        day,
        focus,
        plan.len(),
        intensity(day)
    );

    plan
}
