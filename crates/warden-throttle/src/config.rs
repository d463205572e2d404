//! Throttle parameters.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Failures allowed before an identity is locked out.
pub const DEFAULT_THRESHOLD: u32 = 3;

/// How long a lockout lasts.
pub const DEFAULT_LOCK_DURATION: Duration = Duration::from_secs(10 * 60);

/// What to do with a login when the attempt store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreFailurePolicy {
    /// Deny the attempt. Nobody can log in while the store is down.
    #[default]
    FailClosed,

    /// Allow the attempt without throttling and log a warning.
    FailOpen,
}

/// Fixed-threshold, fixed-duration lockout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Consecutive failures that trigger a lockout. At least 1.
    pub threshold: u32,

    /// Length of a lockout.
    pub lock_duration: Duration,

    /// Behaviour when the attempt store fails.
    pub on_store_failure: StoreFailurePolicy,
}

impl ThrottleConfig {
    pub fn new(threshold: u32, lock_duration: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            lock_duration,
            on_store_failure: StoreFailurePolicy::default(),
        }
    }

    pub fn with_store_failure(mut self, policy: StoreFailurePolicy) -> Self {
        self.on_store_failure = policy;
        self
    }

    /// Instant at which a lock that starts at `now` ends.
    ///
    /// Saturates instead of overflowing for absurd durations.
    pub fn lock_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let delta = TimeDelta::from_std(self.lock_duration).unwrap_or(TimeDelta::MAX);
        now.checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Lock duration in whole minutes, rounded up.
    pub fn lock_minutes(&self) -> u64 {
        self.lock_duration.as_secs().div_ceil(60)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_LOCK_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let config = ThrottleConfig::default();
        assert_eq!(config.threshold, 3);
        assert_eq!(config.lock_duration, Duration::from_secs(600));
        assert_eq!(config.on_store_failure, StoreFailurePolicy::FailClosed);
        assert_eq!(config.lock_minutes(), 10);
    }

    #[test]
    fn test_zero_threshold_is_clamped() {
        assert_eq!(ThrottleConfig::new(0, DEFAULT_LOCK_DURATION).threshold, 1);
    }

    #[test]
    fn test_lock_until() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let config = ThrottleConfig::default();
        assert_eq!(
            config.lock_until(now),
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 10, 0).unwrap()
        );
    }

    #[test]
    fn test_lock_until_saturates() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let config = ThrottleConfig::new(3, Duration::from_secs(u64::MAX));
        assert_eq!(config.lock_until(now), DateTime::<Utc>::MAX_UTC);
    }
}
