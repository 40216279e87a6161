//! Poll configuration
//!
//! - `interval`: sleep between status fetches (default 5 s)
//! - `deadline`: optional bound on one wait; none means wait forever
//! - `fetch_retries`: retries of a transient fetch failure (default 0)
//! - `retry_initial_delay` / `retry_max_delay`: doubling backoff between retries

use std::time::Duration;

use crate::config::PollSettings;

/// Longest accepted poll interval
pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);

/// Polling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub deadline: Option<Duration>,
    pub fetch_retries: u32,
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            deadline: None,
            fetch_retries: 0,
            retry_initial_delay: Duration::from_millis(2000),
            retry_max_delay: Duration::from_millis(30000),
        }
    }
}

impl PollConfig {
    /// Create PollConfig from configured settings
    pub fn from_settings(settings: &PollSettings) -> Self {
        Self {
            interval: Duration::from_secs(settings.interval_seconds),
            deadline: settings.deadline_seconds.map(Duration::from_secs),
            fetch_retries: settings.fetch_retries,
            retry_initial_delay: Duration::from_millis(settings.retry_initial_delay_ms),
            retry_max_delay: Duration::from_millis(settings.retry_max_delay_ms),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_fetch_retries(mut self, retries: u32) -> Self {
        self.fetch_retries = retries;
        self
    }

    pub fn validate(&self) -> Result<(), PollConfigError> {
        // interval must be in (0, 3600s]
        if self.interval.is_zero() || self.interval > MAX_INTERVAL {
            return Err(PollConfigError::IntervalOutOfBounds {
                value: self.interval.as_secs_f64(),
            });
        }

        if let Some(deadline) = self.deadline {
            if deadline < self.interval {
                return Err(PollConfigError::DeadlineBelowInterval {
                    deadline: deadline.as_secs(),
                    interval: self.interval.as_secs(),
                });
            }
        }

        if self.retry_initial_delay > self.retry_max_delay {
            return Err(PollConfigError::RetryDelayInverted {
                initial: self.retry_initial_delay.as_millis() as u64,
                max: self.retry_max_delay.as_millis() as u64,
            });
        }

        Ok(())
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.retry_initial_delay.saturating_mul(1u32 << exponent);
        delay.min(self.retry_max_delay)
    }
}

/// Poll configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum PollConfigError {
    #[error("poll interval must be in (0, 3600] seconds, got {value}")]
    IntervalOutOfBounds { value: f64 },

    #[error("poll deadline ({deadline}s) must not be shorter than the poll interval ({interval}s)")]
    DeadlineBelowInterval { deadline: u64, interval: u64 },

    #[error("retry_initial_delay_ms ({initial}) must not exceed retry_max_delay_ms ({max})")]
    RetryDelayInverted { initial: u64, max: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(config.deadline.is_none());
        assert_eq!(config.fetch_retries, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = PollConfig::default().with_interval(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PollConfigError::IntervalOutOfBounds { .. }));
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_interval_too_large_rejected() {
        let config = PollConfig::default().with_interval(Duration::from_secs(3601));
        assert!(config.validate().is_err());

        let config = PollConfig::default().with_interval(MAX_INTERVAL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deadline_below_interval_rejected() {
        let config = PollConfig::default()
            .with_interval(Duration::from_secs(10))
            .with_deadline(Duration::from_secs(5));
        assert!(matches!(
            config.validate(),
            Err(PollConfigError::DeadlineBelowInterval { .. })
        ));
    }

    #[test]
    fn test_inverted_retry_delays_rejected() {
        let config = PollConfig {
            retry_initial_delay: Duration::from_secs(60),
            retry_max_delay: Duration::from_secs(1),
            ..PollConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PollConfigError::RetryDelayInverted { .. })
        ));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = PollConfig::default();
        assert_eq!(config.backoff(1), Duration::from_secs(2));
        assert_eq!(config.backoff(2), Duration::from_secs(4));
        assert_eq!(config.backoff(3), Duration::from_secs(8));
        assert_eq!(config.backoff(5), Duration::from_secs(30));
        assert_eq!(config.backoff(100), Duration::from_secs(30));
    }

    #[test]
    fn test_from_settings() {
        let settings = PollSettings {
            interval_seconds: 30,
            deadline_seconds: Some(600),
            fetch_retries: 3,
            retry_initial_delay_ms: 500,
            retry_max_delay_ms: 4000,
        };
        let config = PollConfig::from_settings(&settings);
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.deadline, Some(Duration::from_secs(600)));
        assert_eq!(config.fetch_retries, 3);
        assert_eq!(config.backoff(4), Duration::from_millis(4000));
    }
}
