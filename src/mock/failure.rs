//! Failure Injection for the Mock Cloud
//!
//! Failures are keyed by command label (`"simulation list"`,
//! `"datahub upload"`, ...).

use std::collections::HashMap;

/// How an injected failure surfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The CLI process fails (non-zero exit)
    Transport,
    /// The CLI succeeds but prints a failed response
    Response,
}

/// Failure configuration for a command
#[derive(Debug, Clone)]
pub struct FailureConfig {
    pub kind: FailureKind,
    /// Message carried by the failure
    pub message: String,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Fail as a crashed or unreachable CLI
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
            fail_count: None,
        }
    }

    /// Fail with a `Failed` response
    pub fn response(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Response,
            message: message.into(),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Failure injector for the mock cloud
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<String, FailureConfig>,
    call_counts: HashMap<String, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for a command label
    pub fn inject(&mut self, label: impl Into<String>, config: FailureConfig) {
        let label = label.into();
        self.call_counts.insert(label.clone(), 0);
        self.configs.insert(label, config);
    }

    /// Clear all failure injections
    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Check if a failure should occur for a command label
    pub fn check(&mut self, label: &str) -> Option<&FailureConfig> {
        let config = self.configs.get(label)?;
        let count = self.call_counts.entry(label.to_string()).or_insert(0);
        *count += 1;

        if let Some(limit) = config.fail_count {
            if *count > limit {
                return None;
            }
        }

        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_injector_basic() {
        let mut injector = FailureInjector::new();

        assert!(injector.check("simulation list").is_none());

        injector.inject("simulation list", FailureConfig::transport("down"));

        let config = injector.check("simulation list").unwrap();
        assert_eq!(config.kind, FailureKind::Transport);
        assert_eq!(config.message, "down");
        assert!(injector.check("datahub upload").is_none());
    }

    #[test]
    fn test_failure_injector_fail_count() {
        let mut injector = FailureInjector::new();
        injector.inject("simulation list", FailureConfig::transport("flaky").with_fail_count(2));

        assert!(injector.check("simulation list").is_some());
        assert!(injector.check("simulation list").is_some());
        assert!(injector.check("simulation list").is_none());
    }

    #[test]
    fn test_failure_injector_clear() {
        let mut injector = FailureInjector::new();
        injector.inject("datahub download", FailureConfig::response("denied"));
        injector.clear();
        assert!(injector.check("datahub download").is_none());
    }
}
