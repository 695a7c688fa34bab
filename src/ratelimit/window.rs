//! Rate limit window parameters and the shared remaining-hits decision.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HitwindowError, Result};

/// Algorithm backing a limiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// TTL-bounded counter, re-armed on every hit
    #[default]
    FixedWindow,
    /// Timestamped log pruned to a trailing span
    SlidingWindow,
}

impl Algorithm {
    /// Marker embedded in storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::FixedWindow => "fixed",
            Algorithm::SlidingWindow => "sliding",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call limiter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length. Minutes for the fixed window, seconds for the sliding window.
    pub interval: u32,
    /// Hits allowed within one window
    pub max_hits: u64,
}

impl RateLimitConfig {
    /// Create a new configuration.
    pub fn new(interval: u32, max_hits: u64) -> Self {
        Self { interval, max_hits }
    }

    /// Reject a zero interval or a zero threshold.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(HitwindowError::InvalidConfig(
                "interval must be greater than zero".to_owned(),
            ));
        }
        if self.max_hits == 0 {
            return Err(HitwindowError::InvalidConfig(
                "max_hits must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// Counter lifetime used by the fixed window.
    pub fn fixed_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval) * 60)
    }

    /// Trailing span used by the sliding window.
    pub fn sliding_span(&self) -> Duration {
        Duration::from_millis(u64::from(self.interval) * 1000)
    }
}

/// Validate a resource name and its configuration before touching the store.
pub(crate) fn validate_hit(name: &str, config: &RateLimitConfig) -> Result<()> {
    if name.trim().is_empty() {
        return Err(HitwindowError::InvalidConfig(
            "resource name must not be empty".to_owned(),
        ));
    }
    config.validate()
}

/// Hits left after `hits` have been observed in the current window.
pub fn hits_remaining(hits: u64, max_hits: u64) -> u64 {
    if hits > max_hits {
        0
    } else {
        max_hits - hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_durations() {
        let config = RateLimitConfig::new(2, 10);
        assert_eq!(config.fixed_ttl(), Duration::from_secs(120));
        assert_eq!(config.sliding_span(), Duration::from_millis(2000));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let err = RateLimitConfig::new(0, 5).validate().unwrap_err();
        assert!(matches!(err, HitwindowError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_rejects_zero_max_hits() {
        let err = RateLimitConfig::new(1, 0).validate().unwrap_err();
        assert!(matches!(err, HitwindowError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_hit_rejects_blank_name() {
        let config = RateLimitConfig::new(1, 5);
        assert!(validate_hit("  ", &config).is_err());
        assert!(validate_hit("api", &config).is_ok());
    }

    #[test]
    fn test_hits_remaining() {
        assert_eq!(hits_remaining(1, 5), 4);
        assert_eq!(hits_remaining(5, 5), 0);
        assert_eq!(hits_remaining(6, 5), 0);
        assert_eq!(hits_remaining(u64::MAX, 5), 0);
    }

    #[test]
    fn test_algorithm_serde_names() {
        let algorithm: Algorithm = serde_yaml::from_str("sliding_window").unwrap();
        assert_eq!(algorithm, Algorithm::SlidingWindow);
        assert_eq!(Algorithm::FixedWindow.to_string(), "fixed");
    }
}
