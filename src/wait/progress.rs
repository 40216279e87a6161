//! Progress reporting while waiting
//!
//! The console form prints a `.` for every poll that sees the same status,
//! the status name on a new line whenever it changes, and `Done: <status>`
//! once the simulation is finished.

use std::io::{self, Write};
use std::sync::Mutex;

use prepost_cloud::SimulationStatus;

/// Something that happened during a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A list wait is starting on a non-terminal simulation
    Waiting { id: String },
    /// A status was fetched
    Observed {
        id: String,
        status: SimulationStatus,
        changed: bool,
    },
    /// The simulation reached a terminal status
    Done { id: String, status: SimulationStatus },
    /// Simulations that appeared in an execution after the first wait
    Reconciled {
        execution_id: String,
        new_ids: Vec<String>,
    },
}

/// Receives progress events from a waiter
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Console text for an event
pub fn render(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Waiting { id } => format!("Waiting for {}\n", id),
        ProgressEvent::Observed { status, changed: true, .. } => format!("\n{}", status),
        ProgressEvent::Observed { changed: false, .. } => ".".to_string(),
        ProgressEvent::Done { status, .. } => format!("\nDone: {}\n", status),
        ProgressEvent::Reconciled { new_ids, .. } if new_ids.is_empty() => String::new(),
        ProgressEvent::Reconciled { new_ids, .. } => {
            format!("Waiting for {} new simulation(s)\n", new_ids.len())
        }
    }
}

/// Prints progress to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: &ProgressEvent) {
        let text = render(event);
        if text.is_empty() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Discards progress
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Keeps every event for assertions
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Concatenated console rendering of every event
    pub fn transcript(&self) -> String {
        self.events().iter().map(render).collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
