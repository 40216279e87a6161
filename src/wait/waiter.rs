//! Completion waiters
//!
//! A [`Waiter`] polls simulation status through a [`CloudClient`] until a
//! simulation, a list of simulations, or a whole execution is finished.
//!
//! The wait is unbounded by default. A deadline, Ctrl-C cancellation and
//! bounded retry of transient fetch failures can be switched on through
//! [`PollConfig`] and [`Waiter::with_cancellation`]; all three are checked
//! only between polls.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use prepost_cloud::{Simulation, SimulationStatus};

use crate::cloud::{CloudClient, CloudError, CloudResult};
use crate::signal::SignalState;

use super::clock::{Clock, SystemClock};
use super::policy::PollConfig;
use super::progress::{ConsoleReporter, ProgressEvent, ProgressReporter};

/// Wait errors
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("Deadline of {deadline:?} exceeded after {elapsed:?} while waiting for simulation {id}")]
    DeadlineExceeded {
        id: String,
        deadline: Duration,
        elapsed: Duration,
    },

    #[error("Cancelled while waiting for simulation {id}")]
    Cancelled { id: String },
}

pub type WaitResult<T> = Result<T, WaitError>;

/// Simulations present in `refreshed` whose ids are not in `original_ids`,
/// in `refreshed` order
pub fn reconcile(original_ids: &HashSet<String>, refreshed: &[Simulation]) -> Vec<Simulation> {
    refreshed
        .iter()
        .filter(|s| !original_ids.contains(s.id()))
        .cloned()
        .collect()
}

/// Polls the cloud until simulations finish
pub struct Waiter {
    client: CloudClient,
    config: PollConfig,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn ProgressReporter>,
    cancel: Option<Arc<SignalState>>,
    /// Clock reading when the waiter was created; the deadline counts from here
    started: Duration,
}

impl Waiter {
    /// Waiter with wall-clock time and console progress
    pub fn new(client: CloudClient, config: PollConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        Self {
            client,
            config,
            started: clock.elapsed(),
            clock,
            reporter: Arc::new(ConsoleReporter),
            cancel: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.started = clock.elapsed();
        self.clock = clock;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cancellation(mut self, state: Arc<SignalState>) -> Self {
        self.cancel = Some(state);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll one simulation until its status is terminal and return the final record
    pub fn wait_simulation(&self, simulation_id: &str) -> WaitResult<Simulation> {
        if let Some(state) = &self.cancel {
            state.register_wait(simulation_id);
        }
        let result = self.poll_until_terminal(simulation_id);
        if let Some(state) = &self.cancel {
            state.unregister_wait(simulation_id);
        }
        result
    }

    /// Wait, one after another, for every simulation not already terminal.
    ///
    /// Returns the final record of each simulation in input order. A
    /// simulation ending `Failed` does not stop the others; a fetch error does.
    pub fn wait_simulations(&self, simulations: &[Simulation]) -> WaitResult<Vec<Simulation>> {
        let mut finished = Vec::with_capacity(simulations.len());

        for simulation in simulations {
            if simulation.is_terminal() {
                finished.push(simulation.clone());
                continue;
            }

            self.reporter.report(&ProgressEvent::Waiting {
                id: simulation.id().to_string(),
            });
            finished.push(self.wait_simulation(simulation.id())?);
        }

        Ok(finished)
    }

    /// Wait for every simulation of an execution, including simulations that
    /// appeared while the first set was running.
    ///
    /// Only one reconciliation round is made: simulations spawned while the
    /// newly discovered ones run are not waited for, though they appear in
    /// the returned set.
    pub fn wait_execution(&self, execution_id: &str) -> WaitResult<Vec<Simulation>> {
        let original = self.fetch_execution(execution_id)?;
        let original_ids: HashSet<String> = original.iter().map(|s| s.id().to_string()).collect();
        tracing::info!(
            "Execution {} has {} simulation(s)",
            execution_id,
            original.len()
        );

        self.wait_simulations(&original)?;

        let refreshed = self.fetch_execution(execution_id)?;
        let unchecked = reconcile(&original_ids, &refreshed);
        self.reporter.report(&ProgressEvent::Reconciled {
            execution_id: execution_id.to_string(),
            new_ids: unchecked.iter().map(|s| s.id().to_string()).collect(),
        });

        if !unchecked.is_empty() {
            tracing::info!(
                "Execution {} spawned {} new simulation(s)",
                execution_id,
                unchecked.len()
            );
            self.wait_simulations(&unchecked)?;
        }

        self.fetch_execution(execution_id)
    }

    fn poll_until_terminal(&self, simulation_id: &str) -> WaitResult<Simulation> {
        let mut simulation = self.fetch_simulation(simulation_id)?;
        let mut last_status: Option<SimulationStatus> = None;

        loop {
            let changed = last_status.as_ref() != Some(&simulation.status);
            self.reporter.report(&ProgressEvent::Observed {
                id: simulation_id.to_string(),
                status: simulation.status.clone(),
                changed,
            });

            if simulation.is_terminal() {
                self.reporter.report(&ProgressEvent::Done {
                    id: simulation_id.to_string(),
                    status: simulation.status.clone(),
                });
                return Ok(simulation);
            }

            last_status = Some(simulation.status.clone());
            self.check_interrupt(simulation_id)?;
            self.clock.sleep(self.config.interval);
            simulation = self.fetch_simulation(simulation_id)?;
        }
    }

    fn check_interrupt(&self, simulation_id: &str) -> WaitResult<()> {
        if self.cancel.as_ref().is_some_and(|s| s.is_cancel_requested()) {
            return Err(WaitError::Cancelled {
                id: simulation_id.to_string(),
            });
        }

        if let Some(deadline) = self.config.deadline {
            let elapsed = self.clock.elapsed().saturating_sub(self.started);
            if elapsed >= deadline {
                return Err(WaitError::DeadlineExceeded {
                    id: simulation_id.to_string(),
                    deadline,
                    elapsed,
                });
            }
        }

        Ok(())
    }

    fn fetch_simulation(&self, simulation_id: &str) -> WaitResult<Simulation> {
        self.with_retry(simulation_id, || self.client.get_simulation(simulation_id))
    }

    fn fetch_execution(&self, execution_id: &str) -> WaitResult<Vec<Simulation>> {
        self.with_retry(execution_id, || self.client.get_execution(execution_id))
    }

    /// Run a fetch, retrying transient failures up to `fetch_retries` times
    fn with_retry<T>(&self, id: &str, fetch: impl Fn() -> CloudResult<T>) -> WaitResult<T> {
        let mut attempt = 0;

        loop {
            match fetch() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.config.fetch_retries => {
                    attempt += 1;
                    let delay = self.config.backoff(attempt);
                    tracing::warn!(
                        "Fetching {} failed ({}), retry {}/{} in {:?}",
                        id,
                        e,
                        attempt,
                        self.config.fetch_retries,
                        delay
                    );
                    self.check_interrupt(id)?;
                    self.clock.sleep(delay);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
