//! Application facade tying the engine to persisted state.
//!
//! The [`Tracker`] owns the one live [`Session`] and everything it touches:
//! the completion ledger, the profile and settings, the history log, a
//! [`Clock`] and a [`RestTimer`]. Hosts call its transition methods from a
//! single thread and render the returned [`Transition`]s.
//!
//! Persistence is a side effect of each mutation. A failed write is logged
//! and the in-memory state stays authoritative.

use crate::catalog::{default_catalog, Catalog};
use crate::ledger::CompletionLedger;
use crate::session::{Session, SessionState, Transition};
use crate::store::{StateStore, COMPLETED_DAYS_KEY, PROFILE_KEY, SETTINGS_KEY};
use crate::wal::{JsonlSink, WorkoutSink};
use crate::{Category, Result, UserProfile, WorkoutRecord, WorkoutSettings};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Host facility delivering one `tick` per second during rest
///
/// Both methods must be idempotent: starting a running timer or cancelling a
/// stopped one does nothing.
pub trait RestTimer {
    fn start(&mut self);
    fn cancel(&mut self);
}

/// Timer for hosts that drive ticks themselves
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTimer;

impl RestTimer for NoopTimer {
    fn start(&mut self) {}
    fn cancel(&mut self) {}
}

/// File layout under the data directory
#[derive(Clone, Debug)]
pub struct DataPaths {
    pub state: PathBuf,
    pub history_dir: PathBuf,
    pub wal: PathBuf,
    pub csv: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: &Path) -> Self {
        let history_dir = data_dir.join("history");
        Self {
            state: data_dir.join("state.json"),
            wal: history_dir.join("workouts.wal"),
            csv: history_dir.join("workouts.csv"),
            history_dir,
        }
    }
}

/// The workout engine with its persisted state
pub struct Tracker {
    catalog: &'static Catalog,
    paths: DataPaths,
    store: StateStore,
    ledger: CompletionLedger,
    profile: UserProfile,
    settings: WorkoutSettings,
    session: Session,
    sink: Box<dyn WorkoutSink>,
    clock: Box<dyn Clock>,
    timer: Box<dyn RestTimer>,
}

impl Tracker {
    /// Load state from `data_dir`, falling back to defaults for anything
    /// missing or malformed
    pub fn open(data_dir: &Path) -> Self {
        let paths = DataPaths::new(data_dir);
        let store = StateStore::open(&paths.state);

        let ledger: CompletionLedger = store.get_or_default(COMPLETED_DAYS_KEY);
        let profile: UserProfile = store.get_or_default(PROFILE_KEY);
        let settings: WorkoutSettings = store.get_or_default(SETTINGS_KEY);

        tracing::info!(
            "Loaded state: {} completed days, next day {}",
            ledger.streak(),
            ledger.next_available_day()
        );

        Self {
            catalog: default_catalog(),
            sink: Box::new(JsonlSink::new(&paths.wal)),
            paths,
            store,
            ledger,
            profile,
            settings,
            session: Session::idle(),
            clock: Box::new(SystemClock),
            timer: Box::new(NoopTimer),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_timer(mut self, timer: impl RestTimer + 'static) -> Self {
        self.timer = Box::new(timer);
        self
    }

    pub fn with_sink(mut self, sink: impl WorkoutSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn settings(&self) -> &WorkoutSettings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Session transitions
    // ------------------------------------------------------------------

    /// Start a workout, replacing any session in progress
    ///
    /// `None` picks the next sequential day.
    pub fn start(&mut self, day: Option<u32>, focus: Option<Category>) -> &Session {
        let day = day.unwrap_or_else(|| self.ledger.next_available_day()).max(1);
        if self.session.is_active() {
            tracing::info!("Replacing session for day {}", self.session.day());
        }
        self.timer.cancel();
        self.session = Session::start(
            self.catalog,
            day,
            focus,
            self.settings.rest_duration_seconds,
            self.clock.now(),
        );
        &self.session
    }

    pub fn complete_current_exercise(&mut self) -> Transition {
        let now = self.clock.now();
        let started_at = self.session.started_at();
        let transition =
            self.session
                .complete_current_exercise(&mut self.ledger, self.profile.weight_kg, now);

        if let Transition::Completed(summary) = &transition {
            persist(&mut self.store, COMPLETED_DAYS_KEY, &self.ledger);
            let record =
                WorkoutRecord::from_summary(summary, self.session.plan(), started_at, now);
            if let Err(e) = self.sink.append(&record) {
                tracing::warn!("Failed to log workout for day {}: {}", summary.day, e);
            }
        }

        self.sync_timer();
        transition
    }

    pub fn skip_forward(&mut self) -> Transition {
        self.session.skip_forward()
    }

    pub fn skip_backward(&mut self) -> Transition {
        self.session.skip_backward()
    }

    pub fn skip_rest(&mut self) -> Transition {
        let transition = self.session.skip_rest();
        self.sync_timer();
        transition
    }

    /// Deliver one timer tick
    pub fn tick(&mut self) -> Transition {
        let transition = self.session.tick();
        self.sync_timer();
        transition
    }

    pub fn abort(&mut self) -> Transition {
        let transition = self.session.abort();
        self.sync_timer();
        transition
    }

    // Keep the timer running exactly while the session rests
    fn sync_timer(&mut self) {
        match self.session.state() {
            SessionState::Resting => self.timer.start(),
            SessionState::Idle | SessionState::Exercising => self.timer.cancel(),
        }
    }

    // ------------------------------------------------------------------
    // Profile, settings and reset
    // ------------------------------------------------------------------

    pub fn update_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
        persist(&mut self.store, PROFILE_KEY, &self.profile);
    }

    /// New settings apply to the next session started
    pub fn update_settings(&mut self, settings: WorkoutSettings) {
        self.settings = settings;
        persist(&mut self.store, SETTINGS_KEY, &self.settings);
    }

    /// Wipe every piece of persisted state. Irreversible.
    pub fn reset(&mut self) -> Result<()> {
        self.session.abort();
        self.timer.cancel();
        self.ledger.reset();
        self.profile = UserProfile::default();
        self.settings = WorkoutSettings::default();
        self.store.clear()?;

        if self.paths.history_dir.exists() {
            std::fs::remove_dir_all(&self.paths.history_dir)?;
        }

        tracing::info!("All data wiped");
        Ok(())
    }
}

fn persist<T: serde::Serialize>(store: &mut StateStore, key: &str, value: &T) {
    if let Err(e) = store.put(key, value) {
        tracing::warn!("Failed to persist '{}': {}. Keeping in-memory state.", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::read_records;
    use chrono::Duration;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone)]
    struct FixedClock(Rc<Cell<DateTime<Utc>>>);

    impl FixedClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(Utc::now())))
        }

        fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    #[derive(Clone, Default)]
    struct RecordingTimer {
        running: Rc<Cell<bool>>,
        starts: Rc<Cell<u32>>,
    }

    impl RestTimer for RecordingTimer {
        fn start(&mut self) {
            if !self.running.get() {
                self.running.set(true);
                self.starts.set(self.starts.get() + 1);
            }
        }

        fn cancel(&mut self) {
            self.running.set(false);
        }
    }

    struct FailingSink(Rc<RefCell<u32>>);

    impl WorkoutSink for FailingSink {
        fn append(&mut self, _record: &WorkoutRecord) -> Result<()> {
            *self.0.borrow_mut() += 1;
            Err(crate::Error::Other("disk full".into()))
        }
    }

    fn finish_session(tracker: &mut Tracker) -> Transition {
        loop {
            match tracker.complete_current_exercise() {
                Transition::Resting { .. } => {
                    tracker.skip_rest();
                }
                other => return other,
            }
        }
    }

    #[test]
    fn test_fresh_tracker_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::open(temp_dir.path());

        assert!(tracker.ledger().is_empty());
        assert_eq!(tracker.profile(), &UserProfile::default());
        assert_eq!(tracker.settings(), &WorkoutSettings::default());
        assert_eq!(tracker.session().state(), SessionState::Idle);
    }

    #[test]
    fn test_start_defaults_to_next_day() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::open(temp_dir.path());

        assert_eq!(tracker.start(None, None).day(), 1);
        assert!(matches!(finish_session(&mut tracker), Transition::Completed(_)));
        assert_eq!(tracker.start(None, None).day(), 2);

        // Any day may be started explicitly
        assert_eq!(tracker.start(Some(40), None).day(), 40);
    }

    #[test]
    fn test_completion_persists_ledger_and_history() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::new();
        let mut tracker = Tracker::open(temp_dir.path()).with_clock(clock.clone());

        tracker.start(Some(1), None);
        clock.advance(Duration::minutes(9));
        let Transition::Completed(summary) = finish_session(&mut tracker) else {
            panic!("expected completion");
        };
        assert_eq!(summary.duration_minutes, 9);

        let reopened = Tracker::open(temp_dir.path());
        assert!(reopened.ledger().contains(1));

        let records = read_records(&tracker.paths().wal).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].day, 1);
        assert_eq!(records[0].calories_burned, summary.calories_burned);
        assert_eq!(records[0].exercise_ids.len(), 5);
    }

    #[test]
    fn test_abort_persists_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::open(temp_dir.path());

        tracker.start(Some(1), None);
        tracker.complete_current_exercise();
        assert_eq!(tracker.abort(), Transition::Aborted);
        assert_eq!(tracker.tick(), Transition::Ignored);

        assert!(tracker.ledger().is_empty());
        assert!(!tracker.paths().wal.exists());
        let reopened = Tracker::open(temp_dir.path());
        assert!(reopened.ledger().is_empty());
    }

    #[test]
    fn test_ticks_after_completion_are_ignored() {
        let temp_dir = tempfile::tempdir().unwrap();
        let timer = RecordingTimer::default();
        let mut tracker = Tracker::open(temp_dir.path()).with_timer(timer.clone());

        tracker.start(Some(1), None);
        assert!(matches!(finish_session(&mut tracker), Transition::Completed(_)));

        assert_eq!(tracker.tick(), Transition::Ignored);
        assert_eq!(tracker.skip_rest(), Transition::Ignored);
        assert_eq!(tracker.session().state(), SessionState::Idle);
        assert_eq!(tracker.ledger().days().collect::<Vec<_>>(), vec![1]);
        assert!(!timer.running.get());
        assert_eq!(read_records(&tracker.paths().wal).unwrap().len(), 1);
    }

    #[test]
    fn test_timer_follows_rest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let timer = RecordingTimer::default();
        let mut tracker = Tracker::open(temp_dir.path()).with_timer(timer.clone());
        tracker.update_settings(WorkoutSettings {
            session_duration_minutes: 30,
            rest_duration_seconds: 3,
        });

        tracker.start(None, None);
        assert!(!timer.running.get());

        tracker.complete_current_exercise();
        assert!(timer.running.get());

        assert_eq!(tracker.tick(), Transition::Resting { remaining: 2 });
        assert_eq!(tracker.tick(), Transition::Resting { remaining: 1 });
        assert!(timer.running.get());
        assert_eq!(tracker.tick(), Transition::Exercising { index: 1 });
        assert!(!timer.running.get());

        tracker.complete_current_exercise();
        tracker.abort();
        assert!(!timer.running.get());
        assert_eq!(timer.starts.get(), 2);
    }

    #[test]
    fn test_restart_replaces_session_and_stops_timer() {
        let temp_dir = tempfile::tempdir().unwrap();
        let timer = RecordingTimer::default();
        let mut tracker = Tracker::open(temp_dir.path()).with_timer(timer.clone());

        tracker.start(Some(4), None);
        tracker.complete_current_exercise();
        assert!(timer.running.get());

        let session = tracker.start(Some(2), Some(Category::Back));
        assert_eq!(session.day(), 2);
        assert_eq!(session.exercise_index(), 0);
        assert_eq!(session.state(), SessionState::Exercising);
        assert!(!timer.running.get());
    }

    #[test]
    fn test_history_write_failure_does_not_block() {
        let temp_dir = tempfile::tempdir().unwrap();
        let attempts = Rc::new(RefCell::new(0));
        let mut tracker =
            Tracker::open(temp_dir.path()).with_sink(FailingSink(attempts.clone()));

        tracker.start(Some(1), None);
        assert!(matches!(finish_session(&mut tracker), Transition::Completed(_)));
        assert_eq!(*attempts.borrow(), 1);
        assert!(tracker.ledger().contains(1));
        assert_eq!(tracker.session().state(), SessionState::Idle);
    }

    #[test]
    fn test_profile_weight_drives_calories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::open(temp_dir.path());
        tracker.update_profile(UserProfile {
            weight_kg: 100.0,
            ..UserProfile::default()
        });

        tracker.start(Some(1), None);
        let expected = crate::accounting::total_calories(tracker.session().plan(), 100.0);
        let Transition::Completed(summary) = finish_session(&mut tracker) else {
            panic!("expected completion");
        };
        assert_eq!(summary.calories_burned, expected);

        let reopened = Tracker::open(temp_dir.path());
        assert_eq!(reopened.profile().weight_kg, 100.0);
    }

    #[test]
    fn test_settings_persist_and_apply_to_next_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::open(temp_dir.path());
        tracker.update_settings(WorkoutSettings {
            session_duration_minutes: 45,
            rest_duration_seconds: 60,
        });

        tracker.start(None, None);
        assert_eq!(
            tracker.complete_current_exercise(),
            Transition::Resting { remaining: 60 }
        );

        let reopened = Tracker::open(temp_dir.path());
        assert_eq!(reopened.settings().session_duration_minutes, 45);
    }

    #[test]
    fn test_reset_wipes_everything() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::open(temp_dir.path());
        tracker.update_profile(UserProfile {
            name: "Kim".into(),
            ..UserProfile::default()
        });
        tracker.start(Some(1), None);
        finish_session(&mut tracker);
        tracker.start(Some(2), None);

        tracker.reset().unwrap();

        assert!(tracker.ledger().is_empty());
        assert_eq!(tracker.session().state(), SessionState::Idle);
        assert!(!tracker.paths().history_dir.exists());

        let reopened = Tracker::open(temp_dir.path());
        assert!(reopened.ledger().is_empty());
        assert_eq!(reopened.profile(), &UserProfile::default());
    }

    #[test]
    fn test_completing_highest_possible_day() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::open(temp_dir.path());

        tracker.start(Some(u32::MAX), None);
        assert!(matches!(finish_session(&mut tracker), Transition::Completed(_)));
        assert_eq!(tracker.ledger().next_available_day(), u32::MAX);

        let reopened = Tracker::open(temp_dir.path());
        assert!(reopened.ledger().contains(u32::MAX));
        assert_eq!(reopened.ledger().next_available_day(), u32::MAX);
    }

    #[test]
    fn test_stored_max_day_loads() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("state.json"),
            r#"{"completed_days":[4294967295]}"#,
        )
        .unwrap();

        let mut tracker = Tracker::open(temp_dir.path());
        assert_eq!(tracker.ledger().next_available_day(), u32::MAX);
        assert_eq!(tracker.start(None, None).day(), u32::MAX);
    }

    #[test]
    fn test_corrupt_state_falls_back_to_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("state.json"), "{{{{ nope").unwrap();

        let mut tracker = Tracker::open(temp_dir.path());
        assert!(tracker.ledger().is_empty());

        // And the next write repairs the file
        tracker.start(None, None);
        finish_session(&mut tracker);
        assert!(Tracker::open(temp_dir.path()).ledger().contains(1));
    }
}
