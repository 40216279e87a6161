//! Outcome of a wait over several simulations

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use prepost_cloud::Simulation;

/// Final statuses of a set of simulations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSummary {
    /// Number of simulations
    pub total: usize,

    /// Count per final status
    pub by_status: BTreeMap<String, usize>,

    /// Simulations that finished without `CompletedSuccess`
    pub unsuccessful: Vec<String>,

    /// Simulations still not terminal (only when the set was read early)
    pub unfinished: Vec<String>,
}

impl WaitSummary {
    pub fn from_records(records: &[Simulation]) -> Self {
        let mut by_status = BTreeMap::new();
        let mut unsuccessful = Vec::new();
        let mut unfinished = Vec::new();

        for record in records {
            *by_status.entry(record.status.to_string()).or_insert(0) += 1;

            if !record.status.is_terminal() {
                unfinished.push(record.id().to_string());
            } else if !record.status.is_success() {
                unsuccessful.push(record.id().to_string());
            }
        }

        Self {
            total: records.len(),
            by_status,
            unsuccessful,
            unfinished,
        }
    }

    /// True when every simulation ended in `CompletedSuccess`
    pub fn all_succeeded(&self) -> bool {
        self.unsuccessful.is_empty() && self.unfinished.is_empty()
    }
}

impl fmt::Display for WaitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} simulation(s)", self.total)?;
        if !self.by_status.is_empty() {
            let counts: Vec<String> = self
                .by_status
                .iter()
                .map(|(status, count)| format!("{}={}", status, count))
                .collect();
            write!(f, ": {}", counts.join(", "))?;
        }
        Ok(())
    }
}
