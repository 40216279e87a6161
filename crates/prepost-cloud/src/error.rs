//! Wire-level errors.

use thiserror::Error;

/// Errors decoding CLI output.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid response JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("command failed: {0}")]
    CommandFailed(String),
}
