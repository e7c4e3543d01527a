use std::time::Duration;

use crate::error::ConfigError;

/// Retry delay policy applied after a failed long-poll.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay after the first consecutive failure.
    pub first_ms: u64,
    /// Upper bound for the delay.
    pub max_ms: u64,
    /// Multiplier applied per further consecutive failure.
    pub factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            first_ms: 1_000,
            max_ms: 30_000,
            factor: 2.0,
        }
    }
}

impl BackoffConfig {
    /// Delay before retrying after `failures` consecutive failures (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exp = i32::try_from(failures - 1).unwrap_or(i32::MAX);
        let ms = (self.first_ms as f64) * self.factor.powi(exp);
        Duration::from_millis(ms.min(self.max_ms as f64) as u64)
    }
}

/// Cadences of the watch loops.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    /// How long the server may hold a long-poll open (default: 5 minutes).
    pub long_poll_wait_ms: u64,
    /// Minimum duration of one record watch iteration (default: 0, no floor).
    pub min_interval_ms: u64,
    /// Interval between health check polls (default: 2 seconds).
    pub health_interval_ms: u64,
    pub backoff: BackoffConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            long_poll_wait_ms: 300_000,
            min_interval_ms: 0,
            health_interval_ms: 2_000,
            backoff: BackoffConfig::default(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.long_poll_wait_ms == 0 {
            return Err(ConfigError::InvalidWatch(
                "long_poll_wait_ms must be positive".into(),
            ));
        }
        if self.health_interval_ms == 0 {
            return Err(ConfigError::InvalidWatch(
                "health_interval_ms must be positive".into(),
            ));
        }
        if self.backoff.first_ms > self.backoff.max_ms {
            return Err(ConfigError::InvalidWatch(format!(
                "backoff first_ms ({}) exceeds max_ms ({})",
                self.backoff.first_ms, self.backoff.max_ms
            )));
        }
        if self.backoff.factor.is_nan() || self.backoff.factor < 1.0 {
            return Err(ConfigError::InvalidWatch(format!(
                "backoff factor must be >= 1.0, got {}",
                self.backoff.factor
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn long_poll_wait(&self) -> Duration {
        Duration::from_millis(self.long_poll_wait_ms)
    }

    #[inline]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    #[inline]
    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(WatchConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_cadences() {
        let cfg = WatchConfig {
            long_poll_wait_ms: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = WatchConfig {
            health_interval_ms: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_or_shrinking_backoff() {
        let mut cfg = WatchConfig::default();
        cfg.backoff.first_ms = 10_000;
        cfg.backoff.max_ms = 1_000;
        assert!(cfg.validate().is_err());

        let mut cfg = WatchConfig::default();
        cfg.backoff.factor = 0.5;
        assert!(cfg.validate().is_err());

        let mut cfg = WatchConfig::default();
        cfg.backoff.factor = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn backoff_grows_and_caps() {
        let b = BackoffConfig::default();
        assert_eq!(b.delay(0), Duration::ZERO);
        assert_eq!(b.delay(1), Duration::from_millis(1_000));
        assert_eq!(b.delay(2), Duration::from_millis(2_000));
        assert_eq!(b.delay(3), Duration::from_millis(4_000));
        assert_eq!(b.delay(10), Duration::from_millis(30_000));
        assert_eq!(b.delay(u32::MAX), Duration::from_millis(30_000));
    }
}
