//! Signal handling for interrupting a wait (SIGINT/SIGTERM)
//!
//! On the first signal the cancellation flag is raised; waiters check it
//! between polls and stop with a cancelled error naming the simulation they
//! were waiting for. Remote simulations are left running.
//!
//! On a second signal the process exits immediately with
//! [`EXIT_CODE_CANCELLED`].

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::ExitCode;

/// Exit code for interrupted tasks
pub const EXIT_CODE_CANCELLED: i32 = ExitCode::Cancelled as i32;

/// Signal handler state
#[derive(Debug, Default)]
pub struct SignalState {
    cancel_requested: AtomicBool,
    immediate_exit: AtomicBool,
    signal_count: AtomicU8,
    /// Simulations currently being waited on
    waiting_on: Mutex<Vec<String>>,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Check if immediate exit has been requested (double-SIGINT)
    pub fn is_immediate_exit(&self) -> bool {
        self.immediate_exit.load(Ordering::SeqCst)
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Handle a signal (SIGINT/SIGTERM)
    ///
    /// Returns the appropriate action to take
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);

        if count == 0 {
            self.cancel_requested.store(true, Ordering::SeqCst);
            SignalAction::InitiateCancellation
        } else if count == 1 {
            self.immediate_exit.store(true, Ordering::SeqCst);
            SignalAction::ImmediateExit
        } else {
            SignalAction::Ignore
        }
    }

    /// Record that a simulation is being waited on
    pub fn register_wait(&self, simulation_id: &str) {
        if let Ok(mut ids) = self.waiting_on.lock() {
            ids.push(simulation_id.to_string());
        }
    }

    /// Record that a wait has finished
    pub fn unregister_wait(&self, simulation_id: &str) {
        if let Ok(mut ids) = self.waiting_on.lock() {
            ids.retain(|id| id != simulation_id);
        }
    }

    /// Simulations currently being waited on
    pub fn waiting_on(&self) -> Vec<String> {
        self.waiting_on.lock().map(|ids| ids.clone()).unwrap_or_default()
    }

    /// Reset the signal state (for testing)
    pub fn reset(&self) {
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.immediate_exit.store(false, Ordering::SeqCst);
        self.signal_count.store(0, Ordering::SeqCst);
        if let Ok(mut ids) = self.waiting_on.lock() {
            ids.clear();
        }
    }
}

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: stop waiting at the next poll
    InitiateCancellation,
    /// Second signal: exit now
    ImmediateExit,
    /// Third+ signal: ignore
    Ignore,
}

/// Signal handler that manages the signal state
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState::new()),
        }
    }

    pub fn with_state(state: Arc<SignalState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install the signal handlers
    ///
    /// Must be called once at program startup.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::InitiateCancellation => {
                eprintln!("\nReceived interrupt signal, stopping after the current poll...");
            }
            SignalAction::ImmediateExit => {
                let waiting = state.waiting_on();
                if waiting.is_empty() {
                    eprintln!("\nReceived second interrupt, exiting immediately...");
                } else {
                    eprintln!(
                        "\nReceived second interrupt, exiting immediately (still running remotely: {})",
                        waiting.join(", ")
                    );
                }
                std::process::exit(EXIT_CODE_CANCELLED);
            }
            SignalAction::Ignore => {}
        })
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
