//! Simulation status vocabulary.
//!
//! The cloud reports status as a free-form string. Known values map onto
//! dedicated variants; anything else is kept verbatim so it round-trips and
//! is treated as still in progress.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status strings after which a simulation no longer progresses.
///
/// These must match the service exactly: a status missing from this list
/// makes a waiter block until its deadline.
pub const TERMINAL_STATUSES: [&str; 4] = ["CompletedSuccess", "Failed", "Cancelled", "CompletedError"];

/// Status of a remote simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SimulationStatus {
    /// Created but not yet scheduled
    Pending,
    /// Waiting for capacity
    Queued,
    /// Executing
    Running,
    /// Finished without errors
    CompletedSuccess,
    /// Finished, but the engine reported errors
    CompletedError,
    /// Failed to run
    Failed,
    /// Cancelled by a user or the service
    Cancelled,
    /// Any status this crate does not know about
    Other(String),
}

impl SimulationStatus {
    /// Wire representation of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::CompletedSuccess => "CompletedSuccess",
            Self::CompletedError => "CompletedError",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Other(s) => s.as_str(),
        }
    }

    /// True when the status is a member of [`TERMINAL_STATUSES`].
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUSES.contains(&self.as_str())
    }

    /// True only for `CompletedSuccess`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::CompletedSuccess)
    }
}

impl From<String> for SimulationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => Self::Pending,
            "Queued" => Self::Queued,
            "Running" => Self::Running,
            "CompletedSuccess" => Self::CompletedSuccess,
            "CompletedError" => Self::CompletedError,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for SimulationStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<SimulationStatus> for String {
    fn from(status: SimulationStatus) -> Self {
        match status {
            SimulationStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for SimulationStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
