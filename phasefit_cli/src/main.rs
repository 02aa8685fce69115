mod ticker;

use clap::{Parser, Subcommand};
use phasefit_core::ledger::PHASE_LENGTH;
use phasefit_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use ticker::{spawn_input_reader, Event, ThreadTicker};

#[derive(Parser)]
#[command(name = "phasefit")]
#[command(about = "Daily bodyweight workouts in 30-day phases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show phase, streak and next day (default)
    Status,

    /// Show the plan for a day
    Plan {
        /// Day number (defaults to the next available day)
        #[arg(long)]
        day: Option<u32>,

        /// Restrict to one category (chest, back, legs, arms, core)
        #[arg(long)]
        focus: Option<String>,
    },

    /// Run a workout session
    Start {
        /// Day number (defaults to the next available day)
        #[arg(long)]
        day: Option<u32>,

        /// Restrict to one category (chest, back, legs, arms, core)
        #[arg(long)]
        focus: Option<String>,

        /// Complete every exercise and skip every rest without prompting
        #[arg(long, conflicts_with = "auto_abort")]
        auto_complete: bool,

        /// Abort after the first exercise without prompting
        #[arg(long, conflicts_with = "auto_complete")]
        auto_abort: bool,
    },

    /// Show or change workout timing
    Settings {
        /// Target session length in minutes
        #[arg(long, value_parser = clap::value_parser!(u32).range(10..=120))]
        session_minutes: Option<u32>,

        /// Rest between exercises in seconds
        #[arg(long, value_parser = clap::value_parser!(u32).range(10..=90))]
        rest_seconds: Option<u32>,
    },

    /// Show or change the user profile
    Profile {
        #[arg(long)]
        name: Option<String>,

        /// Body weight in kilograms
        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        age: Option<u32>,

        /// Height in centimetres
        #[arg(long)]
        height: Option<f64>,
    },

    /// List recently completed workouts
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Roll up the workout WAL to CSV
    Rollup {
        /// Delete processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Wipe all completed days, profile, settings and history
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    phasefit_core::logging::init_with_level(&config.logging.level);
    if let Some(e) = config_error {
        tracing::warn!("Ignoring unreadable config file: {}", e);
    }

    default_catalog().ensure_valid()?;

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut tracker = Tracker::open(&data_dir);

    match cli.command {
        None | Some(Commands::Status) => cmd_status(&tracker),
        Some(Commands::Plan { day, focus }) => cmd_plan(&tracker, day, parse_focus(focus)?),
        Some(Commands::Start {
            day,
            focus,
            auto_complete,
            auto_abort,
        }) => cmd_start(tracker, day, parse_focus(focus)?, auto_complete, auto_abort),
        Some(Commands::Settings {
            session_minutes,
            rest_seconds,
        }) => cmd_settings(&mut tracker, session_minutes, rest_seconds),
        Some(Commands::Profile {
            name,
            weight,
            age,
            height,
        }) => cmd_profile(&mut tracker, name, weight, age, height),
        Some(Commands::History { days }) => cmd_history(&tracker, days),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&tracker, cleanup),
        Some(Commands::Reset { yes }) => cmd_reset(&mut tracker, yes),
    }
}

fn parse_focus(focus: Option<String>) -> Result<Option<Category>> {
    focus.map(|f| f.parse::<Category>()).transpose()
}

fn cmd_status(tracker: &Tracker) -> Result<()> {
    let ledger = tracker.ledger();
    let profile = tracker.profile();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  PHASE {}", ledger.current_phase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Progress: {} {}/{} ({}%)",
        progress_bar(ledger.phase_progress()),
        ledger.phase_progress(),
        PHASE_LENGTH,
        ledger.phase_percent()
    );
    println!("  Streak:   {} days", ledger.streak());
    println!("  Next day: {}", ledger.next_available_day());
    println!();
    println!("  {} · {:.1} kg", profile.name, profile.weight_kg);
    println!();
    Ok(())
}

fn progress_bar(done: u32) -> String {
    let filled = (done.min(PHASE_LENGTH) / 3) as usize;
    let empty = (PHASE_LENGTH / 3) as usize - filled;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(empty))
}

fn cmd_plan(tracker: &Tracker, day: Option<u32>, focus: Option<Category>) -> Result<()> {
    let next = tracker.ledger().next_available_day();
    let day = day.unwrap_or(next).max(1);
    let plan = generate_plan(tracker.catalog(), day, focus);

    println!();
    print!("  Day {}", day);
    if let Some(category) = focus {
        print!(" · {} focus", category);
    }
    if tracker.ledger().contains(day) {
        print!(" · completed");
    } else if is_day_locked(day, next) {
        print!(" · locked");
    }
    println!("  ({:.2}x intensity)", phasefit_core::plan::intensity(day));
    println!();

    for (i, item) in plan.iter().enumerate() {
        println!(
            "  {}. {:<22} {:>3} reps  [{}]",
            i + 1,
            item.name(),
            item.reps,
            item.category()
        );
    }
    println!();
    Ok(())
}

fn cmd_start(
    mut tracker: Tracker,
    day: Option<u32>,
    focus: Option<Category>,
    auto_complete: bool,
    auto_abort: bool,
) -> Result<()> {
    let next = tracker.ledger().next_available_day();
    let day = day.unwrap_or(next).max(1);
    if is_day_locked(day, next) {
        return Err(Error::DayLocked { day, next });
    }

    if auto_complete || auto_abort {
        tracker.start(Some(day), focus);
        display_exercise(tracker.session());
        return run_scripted(&mut tracker, auto_abort);
    }

    let (tx, rx) = channel::<Event>();
    let ticker = ThreadTicker::new(tx.clone());
    let gate = ticker.gate();
    let mut tracker = tracker.with_timer(ticker);
    spawn_input_reader(tx);

    tracker.start(Some(day), focus);
    display_exercise(tracker.session());
    print_controls();

    for event in rx.iter() {
        let from_input = !matches!(event, Event::Tick(_));
        let transition = match event {
            Event::Tick(generation) if !gate.accepts(generation) => {
                tracing::debug!("Dropping stale tick from generation {}", generation);
                continue;
            }
            Event::Tick(_) => tracker.tick(),
            Event::Input(line) => match dispatch_input(&mut tracker, &line) {
                Some(transition) => transition,
                None => {
                    println!("  Unknown command '{}'", line.trim());
                    print_controls();
                    continue;
                }
            },
            Event::InputClosed => tracker.abort(),
        };

        if !render_transition(&tracker, &transition, from_input)? {
            break;
        }
    }

    Ok(())
}

fn dispatch_input(tracker: &mut Tracker, line: &str) -> Option<Transition> {
    let transition = match line.trim().to_lowercase().as_str() {
        "" if tracker.session().is_resting() => tracker.skip_rest(),
        "" | "d" => tracker.complete_current_exercise(),
        "n" => tracker.skip_forward(),
        "p" => tracker.skip_backward(),
        "s" => tracker.skip_rest(),
        "q" => tracker.abort(),
        _ => return None,
    };
    Some(transition)
}

fn run_scripted(tracker: &mut Tracker, abort_after_first: bool) -> Result<()> {
    loop {
        let transition = match tracker.complete_current_exercise() {
            Transition::Resting { .. } if abort_after_first => tracker.abort(),
            Transition::Resting { .. } => tracker.skip_rest(),
            other => other,
        };

        if !render_transition(tracker, &transition, true)? {
            return Ok(());
        }
    }
}

/// Print the effect of a transition. Returns false once the session is over.
fn render_transition(tracker: &Tracker, transition: &Transition, from_input: bool) -> Result<bool> {
    match transition {
        Transition::Ignored => {
            if from_input {
                println!("  Not available right now");
            }
            Ok(tracker.session().is_active())
        }
        Transition::Resting { remaining } => {
            print!("\r  Rest: {:>3}s  (Enter to skip)  ", remaining);
            io::stdout().flush()?;
            Ok(true)
        }
        Transition::Exercising { .. } => {
            println!();
            display_exercise(tracker.session());
            Ok(true)
        }
        Transition::Completed(summary) => {
            display_summary(summary);
            Ok(false)
        }
        Transition::Aborted => {
            println!("\n  Workout aborted. Day {} not recorded.", tracker.session().day());
            Ok(false)
        }
    }
}

fn display_exercise(session: &Session) {
    let Some(item) = session.current_exercise() else {
        println!("  Nothing to do for day {}.", session.day());
        return;
    };

    println!();
    println!(
        "  Day {} · [{}/{}] {}",
        session.day(),
        session.exercise_index() + 1,
        session.plan().len(),
        item.name()
    );
    println!("  → {} reps  ({})", item.reps, item.category());
    if let Some(next) = session.next_exercise() {
        println!("    up next: {}", next.name());
    }
}

fn display_summary(summary: &SessionSummary) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  DAY {} COMPLETE", summary.day);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Exercises: {}", summary.exercise_count);
    println!("  Calories:  {} kcal", summary.calories_burned);
    println!("  Duration:  {} min", summary.duration_minutes);
    println!();
    println!("✓ Day {} complete!", summary.day);
}

fn print_controls() {
    println!("─────────────────────────────────────────");
    println!("Enter/'d' done · 'n' next · 'p' previous · 's' skip rest · 'q' quit");
}

fn cmd_settings(
    tracker: &mut Tracker,
    session_minutes: Option<u32>,
    rest_seconds: Option<u32>,
) -> Result<()> {
    if session_minutes.is_some() || rest_seconds.is_some() {
        let mut settings = tracker.settings().clone();
        if let Some(minutes) = session_minutes {
            settings.session_duration_minutes = minutes;
        }
        if let Some(seconds) = rest_seconds {
            settings.rest_duration_seconds = seconds;
        }
        tracker.update_settings(settings);
        println!("✓ Settings saved");
    }

    let settings = tracker.settings();
    println!("  Session length: {} min", settings.session_duration_minutes);
    println!("  Rest:           {} s", settings.rest_duration_seconds);
    Ok(())
}

fn cmd_profile(
    tracker: &mut Tracker,
    name: Option<String>,
    weight: Option<f64>,
    age: Option<u32>,
    height: Option<f64>,
) -> Result<()> {
    if weight.is_some_and(|w| !(w.is_finite() && w > 0.0)) {
        return Err(Error::Other("Weight must be a positive number of kg".into()));
    }

    if name.is_some() || weight.is_some() || age.is_some() || height.is_some() {
        let mut profile = tracker.profile().clone();
        if let Some(name) = name {
            profile.name = name;
        }
        if let Some(weight) = weight {
            profile.weight_kg = weight;
        }
        if age.is_some() {
            profile.age = age;
        }
        if height.is_some() {
            profile.height_cm = height;
        }
        tracker.update_profile(profile);
        println!("✓ Profile saved");
    }

    let profile = tracker.profile();
    println!("  Name:   {}", profile.name);
    println!("  Weight: {:.1} kg", profile.weight_kg);
    if let Some(age) = profile.age {
        println!("  Age:    {}", age);
    }
    if let Some(height) = profile.height_cm {
        println!("  Height: {:.0} cm", height);
    }
    Ok(())
}

fn cmd_history(tracker: &Tracker, days: i64) -> Result<()> {
    let paths = tracker.paths();
    let records = load_recent_workouts(&paths.wal, &paths.csv, days, tracker.now())?;

    if records.is_empty() {
        println!("No workouts in the last {} days.", days);
        return Ok(());
    }

    for record in &records {
        let focus = record
            .focus
            .map(|c| format!(" ({})", c))
            .unwrap_or_default();
        println!(
            "  {}  Day {:>3}{}  {} kcal  {} min",
            record.completed_at.format("%Y-%m-%d %H:%M"),
            record.day,
            focus,
            record.calories_burned,
            record.duration_minutes
        );
    }
    Ok(())
}

fn cmd_rollup(tracker: &Tracker, cleanup: bool) -> Result<()> {
    let paths = tracker.paths();

    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = csv_rollup::wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} workouts to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = csv_rollup::cleanup_processed_wals(&paths.history_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_reset(tracker: &mut Tracker, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Other(
            "Refusing to wipe all data without --yes".into(),
        ));
    }
    tracker.reset()?;
    println!("✓ All data wiped");
    Ok(())
}
