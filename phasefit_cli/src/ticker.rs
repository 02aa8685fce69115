//! Event sources for the interactive session loop.
//!
//! The rest countdown and the keyboard both feed one channel so the main
//! thread applies transitions one at a time.

use phasefit_core::RestTimer;
use std::io::BufRead;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug)]
pub enum Event {
    /// One second elapsed on the ticker started as this generation
    Tick(u64),
    Input(String),
    InputClosed,
}

/// Shared view of the ticker's current generation
#[derive(Clone, Debug)]
pub struct TickGate(Arc<AtomicU64>);

impl TickGate {
    /// Whether a tick stamped with `generation` belongs to the running rest.
    /// Ticks already queued when the timer was cancelled or restarted fail.
    pub fn accepts(&self, generation: u64) -> bool {
        self.0.load(Ordering::SeqCst) == generation
    }
}

/// One-second ticker running on a background thread
///
/// Every start or cancel bumps a generation counter; a ticker thread exits
/// as soon as the generation it was spawned with is no longer current, so a
/// restart never leaves two threads ticking. Each tick carries its
/// generation so the receiver can drop ones sent before a cancel.
pub struct ThreadTicker {
    tx: Sender<Event>,
    generation: Arc<AtomicU64>,
    running: bool,
    interval: Duration,
}

impl ThreadTicker {
    pub fn new(tx: Sender<Event>) -> Self {
        Self {
            tx,
            generation: Arc::new(AtomicU64::new(0)),
            running: false,
            interval: Duration::from_secs(1),
        }
    }

    pub fn gate(&self) -> TickGate {
        TickGate(Arc::clone(&self.generation))
    }
}

impl RestTimer for ThreadTicker {
    fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;

        let generation = Arc::clone(&self.generation);
        let current = generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = self.tx.clone();
        let interval = self.interval;

        thread::spawn(move || loop {
            thread::sleep(interval);
            if generation.load(Ordering::SeqCst) != current || tx.send(Event::Tick(current)).is_err() {
                break;
            }
        });
        tracing::debug!("Rest ticker started (generation {})", current);
    }

    fn cancel(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Rest ticker cancelled");
    }
}

/// Forward stdin lines as events until EOF
pub fn spawn_input_reader(tx: Sender<Event>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });
}
