//! Default exercise catalog.
//!
//! Exercises are grouped by category and kept in declaration order, which
//! is the order the plan generator rotates through.

use crate::{Category, Error, Exercise, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Exercises grouped by category, indexed by [`Category::index`]
#[derive(Clone, Debug)]
pub struct Catalog {
    groups: [Vec<Exercise>; 5],
}

impl Catalog {
    /// Build a catalog from a flat list, preserving order within each category
    pub fn from_exercises(exercises: impl IntoIterator<Item = Exercise>) -> Self {
        let mut groups: [Vec<Exercise>; 5] = Default::default();
        for exercise in exercises {
            groups[exercise.category.index()].push(exercise);
        }
        Self { groups }
    }

    /// Exercises in a category, in declaration order
    pub fn exercises_in(&self, category: Category) -> &[Exercise] {
        &self.groups[category.index()]
    }

    /// Look up an exercise by id
    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.iter().find(|e| e.id == id)
    }

    /// All exercises, category by category
    pub fn iter(&self) -> impl Iterator<Item = &Exercise> {
        self.groups.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for category in Category::ALL {
            if self.exercises_in(category).is_empty() {
                errors.push(format!("Category '{}' has no exercises", category));
            }
        }

        for exercise in self.iter() {
            if exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            } else if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise ID '{}'", exercise.id));
            }
            if exercise.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", exercise.id));
            }
            if exercise.met.is_nan() || exercise.met <= 0.0 {
                errors.push(format!(
                    "Exercise '{}' has non-positive MET {}",
                    exercise.id, exercise.met
                ));
            }
            if exercise.base_reps == 0 {
                errors.push(format!("Exercise '{}' has zero base reps", exercise.id));
            }
        }

        errors
    }

    /// Fail with [`Error::CatalogValidation`] if [`Catalog::validate`] finds anything
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(());
        }
        for error in &errors {
            tracing::error!("Catalog validation error: {}", error);
        }
        Err(Error::CatalogValidation(format!(
            "{} problem(s): {}",
            errors.len(),
            errors.join("; ")
        )))
    }
}

fn exercise(id: &str, name: &str, category: Category, met: f64, base_reps: u32) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        category,
        met,
        base_reps,
    }
}

/// Builds the default catalog
///
/// Prefer [`default_catalog`] in production code; this is kept for tests and
/// custom catalogs.
pub fn build_default_catalog() -> Catalog {
    use Category::*;

    Catalog::from_exercises([
        // Chest
        exercise("push_up", "Push-up", Chest, 8.0, 10),
        exercise("wide_push_up", "Wide Push-up", Chest, 8.0, 8),
        exercise("incline_push_up", "Incline Push-up", Chest, 6.0, 12),
        // Back
        exercise("superman", "Superman Hold", Back, 3.5, 12),
        exercise("reverse_snow_angel", "Reverse Snow Angel", Back, 4.0, 10),
        exercise("bird_dog", "Bird Dog", Back, 3.0, 12),
        // Legs
        exercise("squat", "Bodyweight Squat", Legs, 5.0, 15),
        exercise("lunge", "Alternating Lunge", Legs, 4.0, 12),
        exercise("glute_bridge", "Glute Bridge", Legs, 3.5, 15),
        // Arms
        exercise("tricep_dip", "Tricep Dip", Arms, 5.0, 10),
        exercise("diamond_push_up", "Diamond Push-up", Arms, 8.0, 8),
        exercise("arm_circle", "Arm Circles", Arms, 3.0, 20),
        // Core
        exercise("crunch", "Crunch", Core, 3.8, 15),
        exercise("mountain_climber", "Mountain Climber", Core, 8.0, 20),
        exercise("leg_raise", "Leg Raise", Core, 4.0, 12),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(errors.is_empty(), "Catalog errors: {:?}", errors);
    }

    #[test]
    fn test_every_category_has_three_exercises() {
        let catalog = default_catalog();
        for category in Category::ALL {
            let exercises = catalog.exercises_in(category);
            assert_eq!(exercises.len(), 3, "category {}", category);
            assert!(exercises.iter().all(|e| e.category == category));
        }
        assert_eq!(catalog.len(), 15);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let catalog = default_catalog();
        let ids: Vec<_> = catalog
            .exercises_in(Category::Chest)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, ["push_up", "wide_push_up", "incline_push_up"]);
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = default_catalog();
        let squat = catalog.get("squat").unwrap();
        assert_eq!(squat.category, Category::Legs);
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn test_validate_catches_problems() {
        let catalog = Catalog::from_exercises([
            exercise("a", "A", Category::Chest, 0.0, 10),
            exercise("a", "", Category::Chest, 5.0, 0),
        ]);
        let errors = catalog.validate();

        assert!(errors.iter().any(|e| e.contains("has no exercises")));
        assert!(errors.iter().any(|e| e.contains("Duplicate")));
        assert!(errors.iter().any(|e| e.contains("non-positive MET")));
        assert!(errors.iter().any(|e| e.contains("empty name")));
        assert!(errors.iter().any(|e| e.contains("zero base reps")));
    }

    #[test]
    fn test_ensure_valid() {
        assert!(default_catalog().ensure_valid().is_ok());

        let broken = Catalog::from_exercises([exercise("a", "A", Category::Legs, 5.0, 10)]);
        match broken.ensure_valid() {
            Err(Error::CatalogValidation(msg)) => {
                assert!(msg.contains("Category 'chest' has no exercises"), "{}", msg);
            }
            other => panic!("expected CatalogValidation, got {:?}", other),
        }
    }
}
