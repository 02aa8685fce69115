//! Workout history loading.
//!
//! Recent workouts come from both the live WAL and the archived CSV.

use crate::csv_rollup::CsvRow;
use crate::{Result, WorkoutRecord};
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

/// Load workouts completed in the last `days` days from both WAL and CSV
///
/// Returns records sorted by completion time (newest first), with records
/// present in both files counted once.
pub fn load_recent_workouts(
    wal_path: &Path,
    csv_path: &Path,
    days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<WorkoutRecord>> {
    let cutoff = now - Duration::days(days);
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for record in crate::wal::read_records(wal_path)? {
            if record.completed_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} workouts from WAL", records.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for record in load_records_from_csv(csv_path)? {
            if record.completed_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} workouts from CSV", csv_count);
    }

    records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    tracing::info!(
        "Loaded {} workouts from the last {} days",
        records.len(),
        days
    );

    Ok(records)
}

fn load_records_from_csv(path: &Path) -> Result<Vec<WorkoutRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match WorkoutRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Failed to parse CSV row: {}", e),
            },
            Err(e) => tracing::warn!("Failed to deserialize CSV row: {}", e),
        }
    }

    Ok(records)
}
