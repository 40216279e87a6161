//! Transport Layer for the Cloud Client
//!
//! Abstracts the vendor CLI process for testability. Provides:
//! - CloudTransport trait: run one command, get its responses
//! - MockTransport: in-process mock cloud for tests
//! - CliTransport: spawns the vendor CLI for production

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use prepost_cloud::{parse_responses, CloudCommand, CommandResponse, WireError};

use crate::mock::MockCloud;

/// Transport trait for cloud commands
pub trait CloudTransport: Send + Sync {
    /// Execute a command and return every response it printed
    fn execute(&self, command: &CloudCommand) -> Result<Vec<CommandResponse>, TransportError>;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Protocol error: {0}")]
    Wire(#[from] WireError),
}

impl TransportError {
    /// True for failures worth retrying: the process ran but did not
    /// complete, or its output was cut short.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Spawn { .. } => false,
            TransportError::CommandFailed { .. } => true,
            TransportError::Io(_) => true,
            TransportError::Wire(WireError::InvalidJson(_)) => true,
            TransportError::Wire(_) => false,
        }
    }
}

/// Mock transport for testing - routes commands to MockCloud in-process
pub struct MockTransport {
    cloud: MockCloud,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            cloud: MockCloud::new(),
        }
    }

    /// Create a mock transport over a pre-configured cloud
    pub fn with_cloud(cloud: MockCloud) -> Self {
        Self { cloud }
    }

    /// Get the underlying mock cloud for test configuration and assertions
    pub fn cloud(&self) -> &MockCloud {
        &self.cloud
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudTransport for MockTransport {
    fn execute(&self, command: &CloudCommand) -> Result<Vec<CommandResponse>, TransportError> {
        self.cloud.handle(command)
    }
}

/// CLI transport configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path to the vendor CLI executable
    pub program: PathBuf,
    /// Extra environment for the child process
    pub env: Vec<(String, String)>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("cloud"),
            env: Vec::new(),
        }
    }
}

/// Transport that spawns the vendor CLI once per command.
///
/// Format: arguments on the command line, JSON responses on stdout.
pub struct CliTransport {
    config: CliConfig,
}

impl CliTransport {
    pub fn new(config: CliConfig) -> Self {
        Self { config }
    }

    pub fn program(&self) -> &PathBuf {
        &self.config.program
    }
}

impl CloudTransport for CliTransport {
    fn execute(&self, command: &CloudCommand) -> Result<Vec<CommandResponse>, TransportError> {
        let argv = command.to_argv();
        tracing::debug!("Running {} {}", self.config.program.display(), argv.join(" "));

        let output = Command::new(&self.config.program)
            .args(&argv)
            .envs(self.config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| TransportError::Spawn {
                program: self.config.program.display().to_string(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::CommandFailed {
                command: command.label(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(parse_responses(&output.stdout)?)
    }
}
