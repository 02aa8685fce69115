#![forbid(unsafe_code)]

//! Core domain model and business logic for phasefit.
//!
//! This crate provides:
//! - Domain types (categories, exercises, plan items, summaries)
//! - The static exercise catalog
//! - Daily plan generation
//! - The live session state machine and calorie/duration accounting
//! - The completion ledger with phase progress
//! - Persistence (key-value state store, workout WAL, CSV rollup)
//! - The `Tracker` facade hosts drive

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod plan;
pub mod accounting;
pub mod ledger;
pub mod session;
pub mod store;
pub mod wal;
pub mod csv_rollup;
pub mod history;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, default_catalog, Catalog};
pub use config::Config;
pub use plan::generate_plan;
pub use ledger::{is_day_locked, CompletionLedger};
pub use session::{Session, SessionState, Transition};
pub use store::StateStore;
pub use wal::{JsonlSink, WorkoutSink};
pub use history::load_recent_workouts;
pub use tracker::{Clock, RestTimer, SystemClock, Tracker};
