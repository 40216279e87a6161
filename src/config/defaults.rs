//! Built-in task defaults (layer 1)
//!
//! Hardcoded defaults matching the container layout the tasks run in.

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Local output directory (default: "/output")
    pub output_path: String,

    /// Simulation input directory (default: "/simulation")
    pub simulation_path: String,

    /// Model name to Parquet directory mapping file
    pub directory_map_path: String,

    /// Vendor cloud CLI executable (default: "cloud", resolved on PATH)
    pub cloud_cli_path: String,

    /// DuckDB CLI executable (default: "duckdb", resolved on PATH)
    pub duckdb_cli_path: String,

    /// Seconds between status polls (default: 5)
    pub poll_interval_seconds: u64,

    /// Retries for a failed status fetch (default: 0, no retry)
    pub poll_fetch_retries: u32,

    /// First retry delay in milliseconds (default: 2000)
    pub poll_retry_initial_delay_ms: u64,

    /// Retry delay cap in milliseconds (default: 30000)
    pub poll_retry_max_delay_ms: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            output_path: "/output".to_string(),
            simulation_path: "/simulation".to_string(),
            directory_map_path: "/simulation/directorymapping.json".to_string(),
            cloud_cli_path: "cloud".to_string(),
            duckdb_cli_path: "duckdb".to_string(),
            poll_interval_seconds: 5,
            poll_fetch_retries: 0,
            poll_retry_initial_delay_ms: 2000,
            poll_retry_max_delay_ms: 30000,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    ///
    /// `duck_db_path` and `poll.deadline_seconds` are left null: the first
    /// is derived from `output_path` after merging, the second means "no
    /// deadline".
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "output_path": self.output_path,
            "simulation_path": self.simulation_path,
            "duck_db_path": null,
            "directory_map_path": self.directory_map_path,
            "cloud_cli_path": self.cloud_cli_path,
            "duckdb_cli_path": self.duckdb_cli_path,
            "simulation_id": null,
            "poll": {
                "interval_seconds": self.poll_interval_seconds,
                "deadline_seconds": null,
                "fetch_retries": self.poll_fetch_retries,
                "retry_initial_delay_ms": self.poll_retry_initial_delay_ms,
                "retry_max_delay_ms": self.poll_retry_max_delay_ms
            }
        })
    }
}
