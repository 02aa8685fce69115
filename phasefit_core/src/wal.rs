//! Write-Ahead Log (WAL) for completed workouts.
//!
//! Workouts are appended to a JSONL (JSON Lines) file with file locking
//! so a crash mid-write can only lose the last line.

use crate::{Result, WorkoutRecord};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Sink for finished workouts
pub trait WorkoutSink {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()>;
}

/// JSONL-based workout sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl WorkoutSink for JsonlSink {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended workout {} (day {}) to WAL", record.id, record.day);
        Ok(())
    }
}

/// Read all workouts from a WAL file
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_records(path: &Path) -> Result<Vec<WorkoutRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse workout at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workouts from WAL", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn create_test_record(day: u32) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            day,
            focus: None,
            started_at: Some(Utc::now()),
            completed_at: Utc::now(),
            calories_burned: 25,
            duration_minutes: 12,
            exercise_ids: vec!["push_up".into(), "squat".into()],
        }
    }

    #[test]
    fn test_append_and_read_single_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("history/workouts.wal");

        let record = create_test_record(1);
        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&record).unwrap();

        let records = read_records(&wal_path).unwrap();
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_append_multiple_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");

        let mut sink = JsonlSink::new(&wal_path);
        for day in 1..=5 {
            sink.append(&create_test_record(day)).unwrap();
        }

        let days: Vec<_> = read_records(&wal_path)
            .unwrap()
            .iter()
            .map(|r| r.day)
            .collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_read_missing_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = read_records(&temp_dir.path().join("nonexistent.wal")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");

        let good = serde_json::to_string(&create_test_record(2)).unwrap();
        std::fs::write(&wal_path, format!("{{ broken\n\n{}\n{{\"day\":", good)).unwrap();

        let records = read_records(&wal_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].day, 2);
    }
}
