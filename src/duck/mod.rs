//! DuckDB tasks
//!
//! View configuration over a model's Parquet output, reporting extracts and
//! the membership export. SQL runs through a [`SqlRunner`]; production uses
//! the `duckdb` shell.

pub mod memberships;
pub mod report;
pub mod runner;
pub mod sql;
pub mod views;

pub use memberships::write_memberships;
pub use report::{sample_query, write_report, ReportFiles};
pub use runner::{Database, DuckCli, RecordedScript, RecordingRunner, SqlRunner};
pub use sql::{quote_ident, quote_literal, quote_path};
pub use views::{configure_views, plan_views, read_model_directory, view_name, ViewDefinition};

/// DuckDB task errors
#[derive(Debug, thiserror::Error)]
pub enum DuckError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("DuckDB failed ({status}): {stderr}")]
    StatementFailed { status: String, stderr: String },

    #[error("Unable to read directory mapping {path}: {message}")]
    Mapping { path: String, message: String },

    #[error("Unable to find output for model name provided {model}")]
    ModelNotFound { model: String },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
