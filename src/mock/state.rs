//! Mock Cloud State Management
//!
//! Tracks simulations, their scripted status progressions, and call counts
//! for assertions.

use std::collections::{HashMap, VecDeque};

use prepost_cloud::{CloudCommand, Simulation, SimulationStatus};

/// A simulation held by the mock cloud
#[derive(Debug, Clone)]
pub struct MockSimulation {
    /// Record returned to callers; `status` is the last observed status
    pub record: Simulation,
    /// Statuses returned by successive fetches; the last one sticks
    pub progression: VecDeque<SimulationStatus>,
    /// First execution list call (1-based) that includes this simulation
    pub visible_from_list_call: u32,
}

impl MockSimulation {
    pub fn new(record: Simulation) -> Self {
        Self {
            record,
            progression: VecDeque::new(),
            visible_from_list_call: 1,
        }
    }

    /// Advance to the next scripted status, if any, and return the record
    pub fn advance(&mut self) -> Simulation {
        if let Some(next) = self.progression.pop_front() {
            self.record.status = next;
        }
        self.record.clone()
    }

    fn execution_id(&self) -> Option<&str> {
        self.record.execution_id.as_ref().map(|g| g.value.as_str())
    }
}

/// Mock cloud state
#[derive(Debug, Default)]
pub struct MockState {
    simulations: Vec<MockSimulation>,
    fetch_counts: HashMap<String, u32>,
    execution_list_counts: HashMap<String, u32>,
    commands: Vec<CloudCommand>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a simulation
    pub fn insert(&mut self, simulation: MockSimulation) {
        let id = simulation.record.id().to_string();
        self.simulations.retain(|s| s.record.id() != id);
        self.simulations.push(simulation);
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MockSimulation> {
        self.simulations.iter_mut().find(|s| s.record.id() == id)
    }

    /// Fetch one simulation, advancing its progression
    pub fn fetch_simulation(&mut self, id: &str) -> Option<Simulation> {
        *self.fetch_counts.entry(id.to_string()).or_insert(0) += 1;
        self.get_mut(id).map(MockSimulation::advance)
    }

    /// List an execution's visible simulations without advancing them
    pub fn list_execution(&mut self, execution_id: &str) -> Vec<Simulation> {
        let call = {
            let count = self
                .execution_list_counts
                .entry(execution_id.to_string())
                .or_insert(0);
            *count += 1;
            *count
        };

        self.simulations
            .iter()
            .filter(|s| s.execution_id() == Some(execution_id))
            .filter(|s| s.visible_from_list_call <= call)
            .map(|s| s.record.clone())
            .collect()
    }

    pub fn record_command(&mut self, command: &CloudCommand) {
        self.commands.push(command.clone());
    }

    pub fn fetch_count(&self, id: &str) -> u32 {
        self.fetch_counts.get(id).copied().unwrap_or(0)
    }

    pub fn execution_list_count(&self, execution_id: &str) -> u32 {
        self.execution_list_counts.get(execution_id).copied().unwrap_or(0)
    }

    pub fn commands(&self) -> &[CloudCommand] {
        &self.commands
    }
}
