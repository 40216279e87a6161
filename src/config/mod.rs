//! Configuration merge system
//!
//! Implements the 4-layer configuration merge:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config` or `PREPOST_CONFIG`)
//! 3. Environment variables exported by the pipeline
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, PollSettings, Settings, ENV_VARS,
};
pub use merge::{deep_merge, merge_layers, toml_to_json};
