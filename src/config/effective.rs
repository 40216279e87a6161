//! Effective configuration with provenance
//!
//! The effective config captures the merged configuration plus information
//! about where each layer came from, and decodes it into typed [`Settings`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use super::merge::{merge_layers, toml_to_json};
use crate::wait::PollConfig;

/// Environment variables read by the tasks, and the config key each sets.
///
/// Names are lowercase to match the variables the pipeline exports.
pub const ENV_VARS: &[(&str, &str)] = &[
    ("output_path", "output_path"),
    ("simulation_path", "simulation_path"),
    ("duck_db_path", "duck_db_path"),
    ("directory_map_path", "directory_map_path"),
    ("cloud_cli_path", "cloud_cli_path"),
    ("duckdb_cli_path", "duckdb_cli_path"),
    ("simulation_id", "simulation_id"),
];

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Env,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (file layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (file layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Keys set by this layer (env layer only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

/// Merged configuration with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Typed settings decoded from the merged configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub output_path: PathBuf,
    pub simulation_path: PathBuf,
    #[serde(default)]
    pub duck_db_path: Option<PathBuf>,
    pub directory_map_path: PathBuf,
    pub cloud_cli_path: PathBuf,
    pub duckdb_cli_path: PathBuf,
    #[serde(default)]
    pub simulation_id: Option<String>,
    pub poll: PollSettings,
}

/// Polling settings as configured (seconds and milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    pub interval_seconds: u64,
    #[serde(default)]
    pub deadline_seconds: Option<u64>,
    pub fetch_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl EffectiveConfig {
    /// Build effective config from layers: builtin, file, environment, CLI.
    ///
    /// A file path that does not exist is an error: it was asked for
    /// explicitly.
    pub fn build<I, K, V>(
        config_file: Option<&Path>,
        env: I,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
            keys: Vec::new(),
        }];

        if let Some(path) = config_file {
            let (value, digest) = load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
                keys: Vec::new(),
            });
        }

        if let Some((value, keys)) = env_layer(env) {
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Env,
                path: None,
                digest: None,
                keys,
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
                keys: Vec::new(),
            });
        }

        Ok(Self {
            config: merge_layers(layers),
            sources,
        })
    }

    /// Decode and validate typed settings
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::ParseError(format!("invalid configuration: {}", e)))?;
        settings.poll_config()?;
        Ok(settings)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

impl Settings {
    /// DuckDB database file; defaults to `<output_path>/solution_views.ddb`
    pub fn duck_db_path(&self) -> PathBuf {
        self.duck_db_path
            .clone()
            .unwrap_or_else(|| self.output_path.join("solution_views.ddb"))
    }

    /// Reference SQLite database shipped with the simulation inputs
    pub fn reference_db_path(&self) -> PathBuf {
        self.simulation_path.join("reference.db")
    }

    /// Membership extract written by the membership task
    pub fn memberships_csv_path(&self) -> PathBuf {
        self.output_path.join("memberships_data.csv")
    }

    /// Validated polling configuration
    pub fn poll_config(&self) -> Result<PollConfig, ConfigError> {
        let config = PollConfig::from_settings(&self.poll);
        config
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(config)
    }
}

/// Load and parse a TOML file, returning the value and digest
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let toml_value: toml::Value = toml::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    Ok((toml_to_json(toml_value), digest))
}

/// Build the environment layer from `(name, value)` pairs.
///
/// Only names listed in [`ENV_VARS`] are used; empty values are ignored.
/// Returns `None` when no relevant variable is set.
fn env_layer<I, K, V>(vars: I) -> Option<(Value, Vec<String>)>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut map = Map::new();
    let mut keys = Vec::new();

    for (name, value) in vars {
        let Some((_, key)) = ENV_VARS.iter().find(|(var, _)| *var == name.as_ref()) else {
            continue;
        };
        let value: String = value.into();
        if value.is_empty() {
            continue;
        }
        map.insert(key.to_string(), Value::String(value));
        keys.push(key.to_string());
    }

    if map.is_empty() {
        None
    } else {
        keys.sort();
        Some((Value::Object(map), keys))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
