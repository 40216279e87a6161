//! prepost - pre- and post-processing tasks for cloud simulations
//!
//! Tasks run inside a simulation workflow: moving files between the data
//! hub and the local output directory, waiting for simulations and
//! executions to finish, building DuckDB views and reporting extracts over
//! the solution output, and writing horizon parameter files.
//!
//! The vendor cloud and DuckDB are both reached through their command-line
//! tools, behind [`cloud::CloudTransport`] and [`duck::SqlRunner`].

pub mod cloud;
pub mod config;
pub mod datahub;
pub mod duck;
pub mod error;
pub mod horizon;
pub mod logging;
pub mod mock;
pub mod signal;
pub mod tasks;
pub mod wait;

pub use cloud::{CliConfig, CliTransport, CloudClient, CloudError, CloudTransport, MockTransport};
pub use config::{ConfigError, EffectiveConfig, Settings};
pub use error::{ExitCode, TaskError};
pub use wait::{PollConfig, WaitError, WaitSummary, Waiter};

use std::sync::Arc;

/// Cloud client talking to the CLI configured in `settings`
pub fn cloud_client(settings: &Settings) -> CloudClient {
    let transport = CliTransport::new(CliConfig {
        program: settings.cloud_cli_path.clone(),
        env: Vec::new(),
    });
    CloudClient::new(Arc::new(transport))
}
