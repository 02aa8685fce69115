//! Core domain types for phasefit.
//!
//! This module defines the fundamental types used throughout the system:
//! - Body-part categories and catalog exercises
//! - Plan items with day-scaled repetition targets
//! - Session summaries produced at completion and their history records
//! - The persisted user profile and workout settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Categories
// ============================================================================

/// Body-part category an exercise belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Chest,
    Back,
    Legs,
    Arms,
    Core,
}

impl Category {
    /// Every category, in the fixed order plans are built in
    pub const ALL: [Category; 5] = [
        Category::Chest,
        Category::Back,
        Category::Legs,
        Category::Arms,
        Category::Core,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Chest => "chest",
            Category::Back => "back",
            Category::Legs => "legs",
            Category::Arms => "arms",
            Category::Core => "core",
        }
    }

    /// Position of this category in [`Category::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chest" => Ok(Category::Chest),
            "back" => Ok(Category::Back),
            "legs" => Ok(Category::Legs),
            "arms" => Ok(Category::Arms),
            "core" | "abs" => Ok(Category::Core),
            _ => Err(crate::Error::UnknownCategory(s.to_string())),
        }
    }
}

// ============================================================================
// Exercises and Plans
// ============================================================================

/// A catalog exercise. Defined once at startup and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: Category,
    /// Metabolic equivalent of task
    pub met: f64,
    pub base_reps: u32,
}

/// An exercise with its repetition target for a specific day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanItem {
    pub exercise: Exercise,
    pub reps: u32,
}

impl PlanItem {
    pub fn id(&self) -> &str {
        &self.exercise.id
    }

    pub fn name(&self) -> &str {
        &self.exercise.name
    }

    pub fn category(&self) -> Category {
        self.exercise.category
    }

    pub fn met(&self) -> f64 {
        self.exercise.met
    }
}

// ============================================================================
// Session Results
// ============================================================================

/// Result of a naturally completed session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub day: u32,
    pub focus: Option<Category>,
    pub calories_burned: u32,
    pub duration_minutes: u32,
    pub exercise_count: usize,
}

/// A completed workout as written to the history log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub day: u32,
    #[serde(default)]
    pub focus: Option<Category>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
    pub calories_burned: u32,
    pub duration_minutes: u32,
    #[serde(default)]
    pub exercise_ids: Vec<String>,
}

impl WorkoutRecord {
    /// Build the history entry for a finished session
    pub fn from_summary(
        summary: &SessionSummary,
        plan: &[PlanItem],
        started_at: Option<DateTime<Utc>>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            day: summary.day,
            focus: summary.focus,
            started_at,
            completed_at,
            calories_burned: summary.calories_burned,
            duration_minutes: summary.duration_minutes,
            exercise_ids: plan.iter().map(|item| item.id().to_string()).collect(),
        }
    }
}

// ============================================================================
// Persisted User State
// ============================================================================

/// The user's body metrics. Only `weight_kg` feeds the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    pub weight_kg: f64,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Athlete".into(),
            age: None,
            height_cm: None,
            weight_kg: 70.0,
        }
    }
}

/// Workout timing preferences
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutSettings {
    #[serde(default = "default_session_duration_minutes")]
    pub session_duration_minutes: u32,

    #[serde(default = "default_rest_duration_seconds")]
    pub rest_duration_seconds: u32,
}

impl Default for WorkoutSettings {
    fn default() -> Self {
        Self {
            session_duration_minutes: default_session_duration_minutes(),
            rest_duration_seconds: default_rest_duration_seconds(),
        }
    }
}

fn default_session_duration_minutes() -> u32 {
    30
}

fn default_rest_duration_seconds() -> u32 {
    30
}
