//! Command response envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// One response object printed by the CLI.
///
/// A single command may print several (progress events followed by the
/// final result), so commands always yield a `Vec<CommandResponse>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandResponse {
    /// Outcome reported by the CLI ("Success", "Failed", ...)
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    /// Successful response carrying a payload.
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            status: "Success".to_string(),
            event_type: Some("Result".to_string()),
            message: None,
            data: Some(data),
        }
    }

    /// Successful response without a payload (progress or acknowledgement).
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "Success".to_string(),
            event_type: Some("Message".to_string()),
            message: Some(message.into()),
            data: None,
        }
    }

    /// Failed response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: "Failed".to_string(),
            event_type: Some("Error".to_string()),
            message: Some(message.into()),
            data: None,
        }
    }

    /// True when the CLI reported the command as failed.
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("failed") || self.status.eq_ignore_ascii_case("error")
    }
}

/// Parse the raw stdout of the CLI.
///
/// The CLI prints either a JSON array of responses or a single object.
pub fn parse_responses(stdout: &[u8]) -> Result<Vec<CommandResponse>, WireError> {
    let value: serde_json::Value = serde_json::from_slice(stdout).map_err(WireError::InvalidJson)?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(WireError::InvalidJson),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(value).map_err(WireError::InvalidJson)?]),
        other => Err(WireError::UnexpectedShape(other.to_string())),
    }
}

/// Extract the payload of a command: the `Data` of the last response that
/// carries one, decoded as `T`.
///
/// Returns `Ok(None)` when no response carries data. Fails with
/// [`WireError::CommandFailed`] when any response reports an error.
pub fn response_data<T: DeserializeOwned>(responses: &[CommandResponse]) -> Result<Option<T>, WireError> {
    if let Some(failed) = responses.iter().find(|r| r.is_error()) {
        return Err(WireError::CommandFailed(
            failed.message.clone().unwrap_or_else(|| failed.status.clone()),
        ));
    }

    match responses.iter().rev().find_map(|r| r.data.as_ref()) {
        Some(data) if !data.is_null() => serde_json::from_value(data.clone())
            .map(Some)
            .map_err(WireError::InvalidJson),
        _ => Ok(None),
    }
}
