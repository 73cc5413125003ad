//! Configuration for the TTL cache.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default TTL applied when a caller does not pass one (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default interval between background sweeps (5 minutes).
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Default number of keys removed per write-lock acquisition during a sweep.
pub const DEFAULT_SWEEP_BATCH_SIZE: usize = 1024;

/// Configuration for the TTL cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL used by [`TtlCache::set`](crate::TtlCache::set).
    pub default_ttl: Duration,

    /// Interval between background sweeps.
    pub cleanup_interval: Duration,

    /// Whether to run the background sweep task.
    /// If false, expired entries are only removed on access or by a manual sweep.
    pub enable_cleanup_task: bool,

    /// Maximum number of expired keys removed while holding the write lock.
    /// Zero is treated as one.
    pub sweep_batch_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            enable_cleanup_task: true,
            sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the cleanup interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Enable or disable the background cleanup task.
    pub fn with_cleanup_task(mut self, enabled: bool) -> Self {
        self.enable_cleanup_task = enabled;
        self
    }

    /// Set the sweep batch size.
    pub fn with_sweep_batch_size(mut self, size: usize) -> Self {
        self.sweep_batch_size = size;
        self
    }

    /// Check that both durations are positive.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(Error::InvalidDuration(
                "default_ttl must be positive".to_string(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(Error::InvalidDuration(
                "cleanup_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Convert a signed millisecond count into a TTL.
///
/// Zero is a valid TTL (immediate expiry); negative values are rejected.
pub fn duration_from_millis(ms: i64) -> Result<Duration> {
    u64::try_from(ms)
        .map(Duration::from_millis)
        .map_err(|_| Error::InvalidDuration(format!("negative TTL: {ms}ms")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_five_minutes() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.cleanup_interval, Duration::from_secs(300));
        assert!(config.enable_cleanup_task);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_durations_rejected() {
        let config = CacheConfig::new().with_cleanup_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidDuration(_))));

        let config = CacheConfig::new().with_default_ttl(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidDuration(_))));
    }

    #[test]
    fn test_duration_from_millis() {
        assert_eq!(duration_from_millis(0).unwrap(), Duration::ZERO);
        assert_eq!(
            duration_from_millis(1500).unwrap(),
            Duration::from_millis(1500)
        );
        assert!(matches!(
            duration_from_millis(-1),
            Err(Error::InvalidDuration(_))
        ));
    }
}
