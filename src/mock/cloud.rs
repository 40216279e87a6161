//! Mock Cloud
//!
//! Configurable mock of the vendor cloud CLI.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::json;

use prepost_cloud::{CloudCommand, CommandResponse, ListSimulationResponse, Simulation, SimulationStatus};

use crate::cloud::TransportError;

use super::failure::{FailureConfig, FailureInjector, FailureKind};
use super::state::{MockSimulation, MockState};

/// Configurable mock cloud for testing
#[derive(Clone, Default)]
pub struct MockCloud {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    // === Public API for test configuration ===

    /// Add a simulation whose status never changes
    pub fn add_simulation(&self, simulation: Simulation) {
        let mut state = self.state.lock().unwrap();
        state.insert(MockSimulation::new(simulation));
    }

    /// Add a simulation whose successive fetches return `statuses` in order.
    ///
    /// The record starts in the first status, so an execution listing made
    /// before any fetch already reports it.
    pub fn add_simulation_with_progression(&self, simulation: Simulation, statuses: &[&str]) {
        let mut sim = MockSimulation::new(simulation);
        if let Some(first) = statuses.first() {
            sim.record.status = SimulationStatus::from(*first);
        }
        sim.progression = statuses.iter().map(|s| SimulationStatus::from(*s)).collect();
        let mut state = self.state.lock().unwrap();
        state.insert(sim);
    }

    /// Add a simulation that only shows up from the `list_call`-th listing
    /// of its execution onwards (a child spawned mid-flight)
    pub fn add_late_simulation(&self, simulation: Simulation, statuses: &[&str], list_call: u32) {
        let mut sim = MockSimulation::new(simulation);
        if let Some(first) = statuses.first() {
            sim.record.status = SimulationStatus::from(*first);
        }
        sim.progression = statuses.iter().map(|s| SimulationStatus::from(*s)).collect::<VecDeque<_>>();
        sim.visible_from_list_call = list_call;
        let mut state = self.state.lock().unwrap();
        state.insert(sim);
    }

    /// Inject a failure for a command label such as `"simulation list"`
    pub fn inject_failure(&self, label: &str, config: FailureConfig) {
        let mut failures = self.failures.lock().unwrap();
        failures.inject(label, config);
    }

    /// Clear all failure injections
    pub fn clear_failures(&self) {
        let mut failures = self.failures.lock().unwrap();
        failures.clear();
    }

    // === Assertions ===

    /// Number of `simulation list --SimulationId <id>` calls made
    pub fn fetch_count(&self, simulation_id: &str) -> u32 {
        self.state.lock().unwrap().fetch_count(simulation_id)
    }

    /// Number of `simulation list --ExecutionId <id>` calls made
    pub fn execution_list_count(&self, execution_id: &str) -> u32 {
        self.state.lock().unwrap().execution_list_count(execution_id)
    }

    /// Every command received, in order
    pub fn commands(&self) -> Vec<CloudCommand> {
        self.state.lock().unwrap().commands().to_vec()
    }

    // === Command handling ===

    /// Handle a command as the CLI would
    pub fn handle(&self, command: &CloudCommand) -> Result<Vec<CommandResponse>, TransportError> {
        self.state.lock().unwrap().record_command(command);

        if let Some(failure) = self.check_failure(&command.label()) {
            return match failure.kind {
                FailureKind::Transport => Err(TransportError::CommandFailed {
                    command: command.label(),
                    status: "exit status: 1".to_string(),
                    stderr: failure.message,
                }),
                FailureKind::Response => Ok(vec![CommandResponse::failure(failure.message)]),
            };
        }

        let responses = match (command.group.as_str(), command.action.as_str()) {
            ("simulation", "list") => self.handle_list(command),
            ("datahub", "download") => vec![CommandResponse::message(format!(
                "Downloaded {} to {}",
                command.get_all("RemoteGlobPatterns").join(", "),
                command.get("OutputDirectory").unwrap_or("")
            ))],
            ("datahub", "upload") => vec![CommandResponse::message(format!(
                "Uploaded {} to {}",
                command.get_all("GlobPatterns").join(", "),
                command.get("RemoteFolder").unwrap_or("")
            ))],
            ("solution", "download") => vec![CommandResponse::message(format!(
                "Downloaded {} for solution {}",
                command.get("SolutionType").unwrap_or(""),
                command.get("SolutionId").unwrap_or("")
            ))],
            _ => vec![CommandResponse::failure(format!("Unknown command: {}", command.label()))],
        };

        Ok(responses)
    }

    fn check_failure(&self, label: &str) -> Option<FailureConfig> {
        let mut failures = self.failures.lock().unwrap();
        failures.check(label).cloned()
    }

    fn handle_list(&self, command: &CloudCommand) -> Vec<CommandResponse> {
        let mut state = self.state.lock().unwrap();

        let records = if let Some(id) = command.get("SimulationId") {
            state.fetch_simulation(id).map(|s| vec![s])
        } else if let Some(id) = command.get("ExecutionId") {
            Some(state.list_execution(id)).filter(|r| !r.is_empty())
        } else {
            return vec![CommandResponse::failure("SimulationId or ExecutionId is required")];
        };

        let data = ListSimulationResponse {
            simulation_records: records,
        };
        let data = serde_json::to_value(&data).unwrap_or_else(|_| json!({"SimulationRecords": null}));
        vec![CommandResponse::message("Listing simulations"), CommandResponse::success(data)]
    }
}
