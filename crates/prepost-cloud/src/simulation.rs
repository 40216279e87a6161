//! Simulation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::SimulationStatus;

/// Identifier wrapper used by the cloud for every id field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GuidValue {
    pub value: String,
}

impl GuidValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

/// A single simulation as returned by `simulation list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Simulation {
    /// Simulation identifier
    pub id: GuidValue,
    /// Current status
    pub status: SimulationStatus,
    /// Execution this simulation belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<GuidValue>,
    /// Solution produced by the simulation, once available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_id: Option<GuidValue>,
    /// Display name of the model being solved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Simulation {
    /// Create a bare record with only id and status set.
    pub fn new(id: impl Into<String>, status: impl Into<SimulationStatus>) -> Self {
        Self {
            id: GuidValue::new(id),
            status: status.into(),
            execution_id: None,
            solution_id: None,
            model_name: None,
            created_at: None,
            completed_at: None,
        }
    }

    /// Attach the owning execution.
    pub fn with_execution(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(GuidValue::new(execution_id));
        self
    }

    /// The identifier string (`Id.Value`).
    pub fn id(&self) -> &str {
        &self.id.value
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Payload of `simulation list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListSimulationResponse {
    #[serde(default)]
    pub simulation_records: Option<Vec<Simulation>>,
}

impl ListSimulationResponse {
    pub fn new(records: Vec<Simulation>) -> Self {
        Self {
            simulation_records: Some(records),
        }
    }

    /// Records, or `None` when the service returned none at all.
    ///
    /// An empty array is treated the same as a missing one.
    pub fn records(self) -> Option<Vec<Simulation>> {
        self.simulation_records.filter(|r| !r.is_empty())
    }
}
