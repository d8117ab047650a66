//! Debounce and pacing parameters for the presence monitor.

use std::time::Duration;

use chrono::TimeDelta;

/// Default sleep between probe cycles (seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Absent probes required to confirm a disconnect, including the one that
/// opened the confirmation window.
pub const DEFAULT_CONFIRM_ATTEMPTS: u32 = 9;
/// Sleep between re-probes inside the confirmation window (seconds).
pub const DEFAULT_CONFIRM_INTERVAL_SECS: u64 = 15;
/// A disconnect must last longer than this to be reported as a reconnect (seconds).
pub const DEFAULT_RECONNECT_THRESHOLD_SECS: u64 = 90;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("confirm attempts must be at least 1")]
    ZeroConfirmAttempts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceConfig {
    pub poll_interval: Duration,
    pub confirm_attempts: u32,
    pub confirm_interval: Duration,
    pub reconnect_threshold: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            confirm_attempts: DEFAULT_CONFIRM_ATTEMPTS,
            confirm_interval: Duration::from_secs(DEFAULT_CONFIRM_INTERVAL_SECS),
            reconnect_threshold: Duration::from_secs(DEFAULT_RECONNECT_THRESHOLD_SECS),
        }
    }
}

impl DebounceConfig {
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_confirm_attempts(mut self, attempts: u32) -> Self {
        self.confirm_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_confirm_interval(mut self, interval: Duration) -> Self {
        self.confirm_interval = interval;
        self
    }

    #[must_use]
    pub fn with_reconnect_threshold(mut self, threshold: Duration) -> Self {
        self.reconnect_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.confirm_attempts == 0 {
            return Err(ConfigError::ZeroConfirmAttempts);
        }
        Ok(())
    }

    /// Reconnect threshold as a signed delta for comparison with dwell times.
    pub fn reconnect_threshold_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.reconnect_threshold).unwrap_or(TimeDelta::MAX)
    }

    /// Longest time a confirmation window can spend sleeping.
    pub fn confirmation_window(&self) -> Duration {
        self.confirm_interval
            .saturating_mul(self.confirm_attempts.saturating_sub(1))
    }
}
