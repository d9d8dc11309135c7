//! Verifier configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::validation::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
use crate::cache::DEFAULT_CAPACITY;
use crate::scheduler::DEFAULT_CACHE_TTL;
use crate::verify::DenylistConfig;

/// Settings for one verifier instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Maximum cached verifications, zero disables the cache
    pub cache_capacity: usize,
    /// How long a finished verification is reused
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
    /// Dedicated verification threads when no runtime pool is supplied
    pub worker_threads: usize,
    /// Tasks that may wait for a worker before dispatch is refused
    pub queue_capacity: usize,
    /// Trust the operating system's root store in addition to the bundled roots
    pub use_system_roots: bool,
    pub denylist: DenylistConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
            worker_threads: default_worker_threads(),
            queue_capacity: 1024,
            use_system_roots: true,
            denylist: DenylistConfig::default(),
        }
    }
}

impl VerifierConfig {
    /// Small cache, short reuse window and a single worker
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            cache_capacity: 64,
            cache_ttl: Duration::from_secs(5 * 60),
            worker_threads: 1,
            queue_capacity: 128,
            ..Self::default()
        }
    }

    /// Every call runs a fresh verification
    #[must_use]
    pub fn no_cache() -> Self {
        Self {
            cache_capacity: 0,
            cache_ttl: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Parse` for malformed JSON and any
    /// validation error of the parsed values.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::Parse` if serialization fails.
    pub fn to_json_string(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }
}

impl Validator for VerifierConfig {
    fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_capacity_limit(self.cache_capacity, "cache_capacity")?;
        ConfigValidator::validate_ttl(self.cache_ttl, "cache_ttl")?;
        ConfigValidator::validate_range(
            self.worker_threads,
            1,
            ConfigValidator::MAX_WORKER_THREADS,
            "worker_threads",
        )?;
        ConfigValidator::validate_capacity(self.queue_capacity, "queue_capacity")?;

        if self.cache_capacity > 0 && self.cache_ttl.is_zero() {
            return Err(ConfigurationError::Conflict(
                "cache_ttl is zero while cache_capacity is non-zero".to_string(),
            ));
        }
        for key in &self.denylist.name_constrained_keys {
            if key.permitted_domains.is_empty() {
                return Err(ConfigurationError::InvalidParameter(format!(
                    "name constrained key {} has no permitted domains",
                    key.spki_hash
                )));
            }
        }
        Ok(())
    }
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
        .min(16)
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
