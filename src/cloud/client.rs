//! Cloud Client
//!
//! Typed operations over a [`CloudTransport`]: simulation lookups for the
//! waiters, data hub transfers and solution downloads.

use std::path::Path;
use std::sync::Arc;

use prepost_cloud::{
    response_data, CloudCommand, CommandResponse, ListSimulationResponse, Simulation, SolutionType,
    WireError,
};

use super::transport::{CloudTransport, TransportError};

/// Cloud client errors
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Could not find simulation with Id: {id}")]
    SimulationNotFound { id: String },

    #[error("Could not find execution with Id: {id}")]
    ExecutionNotFound { id: String },

    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Invalid response to `{command}`: {source}")]
    InvalidResponse {
        command: String,
        #[source]
        source: WireError,
    },
}

impl CloudError {
    /// True when retrying the same command may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CloudError::Transport(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type for cloud operations
pub type CloudResult<T> = Result<T, CloudError>;

/// Cloud client
#[derive(Clone)]
pub struct CloudClient {
    transport: Arc<dyn CloudTransport>,
}

impl CloudClient {
    pub fn new(transport: Arc<dyn CloudTransport>) -> Self {
        Self { transport }
    }

    /// Run a command, failing if any response reports an error
    fn execute(&self, command: &CloudCommand) -> CloudResult<Vec<CommandResponse>> {
        let responses = self.transport.execute(command)?;

        if let Some(failed) = responses.iter().find(|r| r.is_error()) {
            return Err(CloudError::CommandFailed {
                command: command.label(),
                message: failed.message.clone().unwrap_or_else(|| failed.status.clone()),
            });
        }

        for message in responses.iter().filter_map(|r| r.message.as_deref()) {
            tracing::debug!("{}: {}", command.label(), message);
        }

        Ok(responses)
    }

    fn list(&self, command: &CloudCommand) -> CloudResult<Option<Vec<Simulation>>> {
        let responses = self.execute(command)?;
        let data: Option<ListSimulationResponse> =
            response_data(&responses).map_err(|source| CloudError::InvalidResponse {
                command: command.label(),
                source,
            })?;
        Ok(data.and_then(ListSimulationResponse::records))
    }

    /// Fetch a single simulation by id
    pub fn get_simulation(&self, simulation_id: &str) -> CloudResult<Simulation> {
        let records = self.list(&CloudCommand::list_simulation(simulation_id))?;
        records
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| CloudError::SimulationNotFound {
                id: simulation_id.to_string(),
            })
    }

    /// Fetch every simulation belonging to an execution
    pub fn get_execution(&self, execution_id: &str) -> CloudResult<Vec<Simulation>> {
        self.list(&CloudCommand::list_execution(execution_id))?
            .ok_or_else(|| CloudError::ExecutionNotFound {
                id: execution_id.to_string(),
            })
    }

    /// Download data hub files matching remote glob patterns
    pub fn datahub_download(&self, patterns: &[String], output_directory: &Path) -> CloudResult<Vec<CommandResponse>> {
        let command = CloudCommand::datahub_download(
            patterns.iter().cloned(),
            &output_directory.to_string_lossy(),
        );
        self.execute(&command)
    }

    /// Upload local files matching glob patterns into a data hub folder
    pub fn datahub_upload(
        &self,
        local_folder: &Path,
        remote_folder: &str,
        patterns: &[String],
        is_versioned: bool,
    ) -> CloudResult<Vec<CommandResponse>> {
        let command = CloudCommand::datahub_upload(
            &local_folder.to_string_lossy(),
            remote_folder,
            patterns.iter().cloned(),
            is_versioned,
        );
        self.execute(&command)
    }

    /// Download one kind of solution data
    pub fn download_solution(
        &self,
        solution_id: &str,
        output_directory: &Path,
        solution_type: SolutionType,
        overwrite: bool,
    ) -> CloudResult<Vec<CommandResponse>> {
        let command = CloudCommand::solution_download(
            solution_id,
            &output_directory.to_string_lossy(),
            solution_type,
            overwrite,
        );
        self.execute(&command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::MockTransport;
    use crate::mock::FailureConfig;
    use prepost_cloud::SimulationStatus;

    fn client_with(transport: Arc<MockTransport>) -> CloudClient {
        CloudClient::new(transport)
    }

    #[test]
    fn test_get_simulation() {
        let transport = Arc::new(MockTransport::new());
        transport.cloud().add_simulation(Simulation::new("sim-1", "Running"));
        let client = client_with(Arc::clone(&transport));

        let sim = client.get_simulation("sim-1").unwrap();
        assert_eq!(sim.id(), "sim-1");
        assert_eq!(sim.status, SimulationStatus::Running);
        assert_eq!(transport.cloud().fetch_count("sim-1"), 1);
    }

    #[test]
    fn test_unknown_simulation_not_found() {
        let client = client_with(Arc::new(MockTransport::new()));
        let err = client.get_simulation("missing").unwrap_err();
        assert!(matches!(err, CloudError::SimulationNotFound { ref id } if id == "missing"));
        assert_eq!(err.to_string(), "Could not find simulation with Id: missing");
    }

    #[test]
    fn test_unknown_execution_not_found() {
        let client = client_with(Arc::new(MockTransport::new()));
        let err = client.get_execution("exec-x").unwrap_err();
        assert!(err.to_string().contains("exec-x"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_get_execution_lists_members() {
        let transport = Arc::new(MockTransport::new());
        transport.cloud().add_simulation(Simulation::new("a", "Running").with_execution("e1"));
        transport.cloud().add_simulation(Simulation::new("b", "Queued").with_execution("e1"));
        transport.cloud().add_simulation(Simulation::new("c", "Running").with_execution("e2"));
        let client = client_with(transport);

        let sims = client.get_execution("e1").unwrap();
        let ids: Vec<&str> = sims.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_failed_response_maps_to_command_failed() {
        let transport = Arc::new(MockTransport::new());
        transport
            .cloud()
            .inject_failure("datahub download", FailureConfig::response("quota exceeded"));
        let client = client_with(transport);

        let err = client
            .datahub_download(&["*.parquet".to_string()], Path::new("/output"))
            .unwrap_err();
        assert!(matches!(err, CloudError::CommandFailed { ref message, .. } if message == "quota exceeded"));
    }

    #[test]
    fn test_transport_failure_is_transient() {
        let transport = Arc::new(MockTransport::new());
        transport.cloud().add_simulation(Simulation::new("sim-1", "Running"));
        transport
            .cloud()
            .inject_failure("simulation list", FailureConfig::transport("connection reset"));
        let client = client_with(transport);

        let err = client.get_simulation("sim-1").unwrap_err();
        assert!(err.is_transient());
    }
}
