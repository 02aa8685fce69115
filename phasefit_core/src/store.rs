//! Persisted key-value store with file locking.
//!
//! All user state lives in a single JSON object keyed by fixed identifiers.
//! Reads never fail: a missing, unreadable or corrupt file is treated as an
//! empty store, and a malformed value falls back to its type's default.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key for the serialized [`crate::UserProfile`]
pub const PROFILE_KEY: &str = "user_profile";
/// Key for the serialized [`crate::WorkoutSettings`]
pub const SETTINGS_KEY: &str = "workout_settings";
/// Key for the completed days, stored as an array of integers
pub const COMPLETED_DAYS_KEY: &str = "completed_days";

/// JSON-file backed key-value store
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl StateStore {
    /// Open the store at `path` with shared locking
    ///
    /// Never fails; problems are logged and an empty store is returned.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_values(&path).unwrap_or_default();
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Typed read with default fallback
    pub fn get_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let Some(value) = self.values.get(key) else {
            tracing::debug!("No value stored for '{}', using default", key);
            return T::default();
        };

        match T::deserialize(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Malformed value for '{}': {}. Using default.", key, e);
                T::default()
            }
        }
    }

    /// Store a value and write the whole store back to disk
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.save()
    }

    /// Remove every key and persist the empty store
    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        self.save()
    }

    /// Write the store with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::State("state path missing parent".into()))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, &self.values)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved state store to {:?}", self.path);
        Ok(())
    }
}

fn read_values(path: &Path) -> Option<Map<String, Value>> {
    if !path.exists() {
        tracing::info!("No state file found at {:?}, starting fresh", path);
        return None;
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open state file {:?}: {}. Using defaults.", path, e);
            return None;
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock state file {:?}: {}. Using defaults.", path, e);
        return None;
    }

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let _ = file.unlock();

    if let Err(e) = read {
        tracing::warn!("Failed to read state file {:?}: {}. Using defaults.", path, e);
        return None;
    }

    match serde_json::from_str::<Map<String, Value>>(&contents) {
        Ok(values) => {
            tracing::debug!("Loaded {} keys from {:?}", values.len(), path);
            Some(values)
        }
        Err(e) => {
            tracing::warn!("Failed to parse state file {:?}: {}. Using defaults.", path, e);
            None
        }
    }
}
