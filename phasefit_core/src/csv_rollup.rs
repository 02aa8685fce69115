//! CSV rollup for archiving the workout WAL.
//!
//! The CSV is written and synced before the WAL is renamed, so a crash at
//! any point leaves every workout in at least one of the two files.

use crate::{Category, Error, Result, WorkoutRecord};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV archive. Exercise ids are joined with `;`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct CsvRow {
    id: String,
    day: u32,
    focus: Option<String>,
    started_at: Option<String>,
    completed_at: String,
    calories_burned: u32,
    duration_minutes: u32,
    exercises: String,
}

impl From<&WorkoutRecord> for CsvRow {
    fn from(record: &WorkoutRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            day: record.day,
            focus: record.focus.map(|c| c.to_string()),
            started_at: record.started_at.map(|t| t.to_rfc3339()),
            completed_at: record.completed_at.to_rfc3339(),
            calories_burned: record.calories_burned,
            duration_minutes: record.duration_minutes,
            exercises: record.exercise_ids.join(";"),
        }
    }
}

impl TryFrom<CsvRow> for WorkoutRecord {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;

        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let started_at = row
            .started_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let focus = row
            .focus
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<Category>)
            .transpose()?;

        let exercise_ids = row
            .exercises
            .split(';')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(WorkoutRecord {
            id,
            day: row.day,
            focus,
            started_at,
            completed_at,
            calories_burned: row.calories_burned,
            duration_minutes: row.duration_minutes,
            exercise_ids,
        })
    }
}

/// Roll up WAL workouts into CSV and archive the WAL
///
/// This function:
/// 1. Reads all workouts from the WAL
/// 2. Appends them to the CSV file (writing headers if it is new)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to `.wal.processed`
/// 5. Returns the number of workouts processed
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::wal::read_records(wal_path)?;

    if records.is_empty() {
        tracing::info!("No workouts in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in &records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workouts to CSV", records.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(records.len())
}

/// Remove every `.processed` WAL in a directory
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::{JsonlSink, WorkoutSink};

    fn record(day: u32, focus: Option<Category>) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            day,
            focus,
            started_at: Some(Utc::now()),
            completed_at: Utc::now(),
            calories_burned: 30,
            duration_minutes: 15,
            exercise_ids: vec!["squat".into(), "lunge".into()],
        }
    }

    #[test]
    fn test_rollup_writes_csv_and_archives_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        let mut sink = JsonlSink::new(&wal_path);
        for day in 1..=3 {
            sink.append(&record(day, None)).unwrap();
        }

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 3);
        assert!(!wal_path.exists());
        assert!(temp_dir.path().join("workouts.wal.processed").exists());

        let csv_content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_content.lines().count(), 4); // header + 3 rows
        assert!(csv_content.starts_with("id,day,focus"));
    }

    #[test]
    fn test_second_rollup_does_not_repeat_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        JsonlSink::new(&wal_path).append(&record(1, None)).unwrap();
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        JsonlSink::new(&wal_path).append(&record(2, None)).unwrap();
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let csv_content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_content.lines().count(), 3);
        assert_eq!(csv_content.matches("id,day").count(), 1);
    }

    #[test]
    fn test_empty_wal_is_noop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 0);
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_csv_row_converts_back() {
        let original = record(7, Some(Category::Legs));
        let row = CsvRow::from(&original);
        let parsed = WorkoutRecord::try_from(row).unwrap();

        assert_eq!(parsed.id, original.id);
        assert_eq!(parsed.focus, Some(Category::Legs));
        assert_eq!(parsed.exercise_ids, original.exercise_ids);
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.wal.processed"), "").unwrap();
        std::fs::write(temp_dir.path().join("b.wal.processed"), "").unwrap();
        std::fs::write(temp_dir.path().join("workouts.wal"), "").unwrap();

        assert_eq!(cleanup_processed_wals(temp_dir.path()).unwrap(), 2);
        assert!(temp_dir.path().join("workouts.wal").exists());
    }
}
