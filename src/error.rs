//! Task-level errors and exit codes

use crate::cloud::{CloudError, TransportError};
use crate::config::ConfigError;
use crate::datahub::DatahubError;
use crate::duck::DuckError;
use crate::horizon::HorizonError;
use crate::tasks::UtilityError;
use crate::wait::WaitError;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Task completed
    Success = 0,
    /// Unclassified failure (IO, bad arguments)
    Other = 1,
    /// Simulations finished, but not all of them successfully
    Unsuccessful = 2,
    /// Configuration could not be loaded or is invalid
    Config = 10,
    /// Vendor cloud CLI failed or returned an error
    Cloud = 20,
    /// Wait deadline exceeded
    WaitTimeout = 30,
    /// DuckDB failed
    Duck = 40,
    /// Interrupted by a signal
    Cancelled = 80,
}

impl ExitCode {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

/// Any failure of a task
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error(transparent)]
    Datahub(#[from] DatahubError),

    #[error(transparent)]
    Duck(#[from] DuckError),

    #[error(transparent)]
    Horizon(#[from] HorizonError),

    #[error(transparent)]
    Utility(#[from] UtilityError),

    #[error("{0}")]
    Unsuccessful(String),

    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for TaskError {
    fn from(e: TransportError) -> Self {
        TaskError::Cloud(CloudError::Transport(e))
    }
}

impl TaskError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            TaskError::Config(_) => ExitCode::Config,
            TaskError::Cloud(_) => ExitCode::Cloud,
            TaskError::Wait(WaitError::Cloud(_)) => ExitCode::Cloud,
            TaskError::Wait(WaitError::DeadlineExceeded { .. }) => ExitCode::WaitTimeout,
            TaskError::Wait(WaitError::Cancelled { .. }) => ExitCode::Cancelled,
            TaskError::Datahub(DatahubError::Cloud(_)) => ExitCode::Cloud,
            TaskError::Datahub(_) => ExitCode::Other,
            TaskError::Duck(_) => ExitCode::Duck,
            TaskError::Horizon(_) => ExitCode::Other,
            TaskError::Utility(_) => ExitCode::Other,
            TaskError::Unsuccessful(_) => ExitCode::Unsuccessful,
            TaskError::Usage(_) => ExitCode::Other,
            TaskError::Io(_) => ExitCode::Other,
        }
    }
}
