//! Configuration validation
//!
//! Shared range checks and the error type every configuration value reports.

use std::time::Duration;

pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid cache TTL: {0}")]
    InvalidTtl(String),

    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration conflict: {0}")]
    Conflict(String),

    #[error("Malformed configuration document: {0}")]
    Parse(String),
}

/// Configuration validation trait
pub trait Validator {
    /// Validates the configuration settings
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigurationError` found.
    fn validate(&self) -> ConfigResult<()>;
}

/// Common validation helpers
pub struct ConfigValidator;

impl ConfigValidator {
    /// Longest window a cached verification may be served for
    pub const MAX_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
    /// Upper bound for dedicated worker threads
    pub const MAX_WORKER_THREADS: usize = 256;
    /// Upper bound for cache entries and pending tasks
    pub const MAX_CAPACITY: usize = 1 << 20;

    /// Validate a cache TTL
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTtl` if the TTL exceeds one day.
    pub fn validate_ttl(ttl: Duration, name: &str) -> ConfigResult<()> {
        if ttl > Self::MAX_CACHE_TTL {
            return Err(ConfigurationError::InvalidTtl(format!(
                "{name} cannot exceed 24 hours"
            )));
        }
        Ok(())
    }

    /// Validate a capacity that may not be zero
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidCapacity` if `size` is zero or
    /// exceeds [`MAX_CAPACITY`](Self::MAX_CAPACITY).
    pub fn validate_capacity(size: usize, name: &str) -> ConfigResult<()> {
        if size == 0 {
            return Err(ConfigurationError::InvalidCapacity(format!(
                "{name} cannot be zero"
            )));
        }
        Self::validate_capacity_limit(size, name)
    }

    /// Validate a capacity where zero is meaningful
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidCapacity` if `size` exceeds
    /// [`MAX_CAPACITY`](Self::MAX_CAPACITY).
    pub fn validate_capacity_limit(size: usize, name: &str) -> ConfigResult<()> {
        if size > Self::MAX_CAPACITY {
            return Err(ConfigurationError::InvalidCapacity(format!(
                "{name} cannot exceed {}",
                Self::MAX_CAPACITY
            )));
        }
        Ok(())
    }

    /// Validate numeric range
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` if the value is outside
    /// `[min, max]`.
    pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> ConfigResult<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(ConfigurationError::InvalidParameter(format!(
                "{name} must be between {min} and {max}, got {value}"
            )));
        }
        Ok(())
    }
}
