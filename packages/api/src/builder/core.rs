//! `CertVerifierBuilder` and the errors `build` can report

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use certverify_core::cache::TrustStoreEpoch;
use certverify_core::cert::Certificate;
use certverify_core::config::{ConfigurationError, Validator, VerifierConfig};
use certverify_core::error::PlatformError;
use certverify_core::platform::{PlatformVerifier, WebPkiVerifier};
use certverify_core::pool::{ThreadPool, TokioBlockingPool, WorkerPool};
use certverify_core::telemetry::VerifyMetrics;
use certverify_core::trust_anchor::TrustAnchorSource;
use certverify_core::verify::{Denylist, DenylistConfig, PolicyEngine};
use certverify_core::MultiThreadedCertVerifier;
use tokio::runtime::Handle;

/// Why a verifier could not be built
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("failed to start worker threads: {0}")]
    Workers(#[from] std::io::Error),
}

/// Where trust comes from when no platform verifier is supplied
#[derive(Debug, Clone)]
enum Roots {
    Public,
    Only(Vec<Certificate>),
}

/// Builder for [`MultiThreadedCertVerifier`].
///
/// Unset parts fall back to a rustls verifier over the bundled roots (plus
/// the system store per configuration) and a dedicated thread pool.
pub struct CertVerifierBuilder {
    config: VerifierConfig,
    roots: Roots,
    platform: Option<Arc<dyn PlatformVerifier>>,
    pool: Option<Arc<dyn WorkerPool>>,
    metrics: Option<Arc<VerifyMetrics>>,
    trust_anchor_source: Option<Box<dyn TrustAnchorSource>>,
    trust_store_epoch: Option<TrustStoreEpoch>,
    debug_enabled: bool,
}

impl fmt::Debug for CertVerifierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertVerifierBuilder")
            .field("config", &self.config)
            .field("roots", &self.roots)
            .field("custom_platform", &self.platform.is_some())
            .field("custom_pool", &self.pool.is_some())
            .field("debug_enabled", &self.debug_enabled)
            .finish_non_exhaustive()
    }
}

impl Default for CertVerifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CertVerifierBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(VerifierConfig::default())
    }

    /// Start from an existing configuration, e.g. one read with
    /// [`VerifierConfig::from_json_str`]
    #[must_use]
    pub fn with_config(config: VerifierConfig) -> Self {
        Self {
            config,
            roots: Roots::Public,
            platform: None,
            pool: None,
            metrics: None,
            trust_anchor_source: None,
            trust_store_epoch: None,
            debug_enabled: false,
        }
    }

    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Run every call as a fresh verification
    #[must_use]
    pub fn no_cache(mut self) -> Self {
        self.config.cache_capacity = 0;
        self.config.cache_ttl = Duration::ZERO;
        self
    }

    #[must_use]
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = threads;
        self
    }

    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn system_roots(mut self, enabled: bool) -> Self {
        self.config.use_system_roots = enabled;
        self
    }

    /// Trust exactly `roots` as known roots, ignoring bundled and system stores
    #[must_use]
    pub fn known_roots(mut self, roots: Vec<Certificate>) -> Self {
        self.roots = Roots::Only(roots);
        self
    }

    #[must_use]
    pub fn denylist(mut self, denylist: DenylistConfig) -> Self {
        self.config.denylist = denylist;
        self
    }

    /// Use a custom chain builder instead of the rustls one
    #[must_use]
    pub fn platform(mut self, platform: Arc<dyn PlatformVerifier>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use a custom worker pool instead of dedicated threads
    #[must_use]
    pub fn pool(mut self, pool: Arc<dyn WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Run verifications on the blocking pool of a tokio runtime
    #[must_use]
    pub fn tokio_runtime(self, handle: Handle) -> Self {
        self.pool(Arc::new(TokioBlockingPool::new(handle)))
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<VerifyMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn trust_anchors(mut self, source: impl TrustAnchorSource + 'static) -> Self {
        self.trust_anchor_source = Some(Box::new(source));
        self
    }

    /// Share a trust-store generation counter with other verifiers
    #[must_use]
    pub fn trust_store_epoch(mut self, epoch: TrustStoreEpoch) -> Self {
        self.trust_store_epoch = Some(epoch);
        self
    }

    /// Log the resolved configuration when building
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug_enabled = true;
        self
    }

    /// # Errors
    ///
    /// Returns `BuildError::Config` for an invalid configuration,
    /// `BuildError::Platform` if the trust store cannot be loaded and
    /// `BuildError::Workers` if worker threads cannot be spawned.
    pub fn build(self) -> Result<MultiThreadedCertVerifier, BuildError> {
        self.config.validate()?;

        if self.debug_enabled {
            tracing::debug!(
                target: "certverify::builder",
                config = ?self.config,
                custom_platform = self.platform.is_some(),
                custom_pool = self.pool.is_some(),
                "Building certificate verifier"
            );
        }

        let platform: Arc<dyn PlatformVerifier> = match (self.platform, self.roots) {
            (Some(platform), _) => platform,
            (None, Roots::Only(roots)) => Arc::new(WebPkiVerifier::with_known_roots(roots)?),
            (None, Roots::Public) => Arc::new(WebPkiVerifier::new(self.config.use_system_roots)?),
        };

        let mut engine = PolicyEngine::new(platform)
            .with_denylist(Denylist::with_config(self.config.denylist.clone()));
        if let Some(metrics) = self.metrics {
            engine = engine.with_metrics(metrics);
        }

        let pool: Arc<dyn WorkerPool> = match self.pool {
            Some(pool) => pool,
            None => Arc::new(ThreadPool::new(
                self.config.worker_threads,
                self.config.queue_capacity,
            )?),
        };

        let mut verifier = MultiThreadedCertVerifier::new(engine, pool)
            .with_cache_capacity(self.config.cache_capacity)
            .with_cache_ttl(self.config.cache_ttl);
        if let Some(epoch) = self.trust_store_epoch {
            verifier = verifier.with_trust_store_epoch(epoch);
        }
        if let Some(source) = self.trust_anchor_source {
            verifier.set_trust_anchor_source(source);
        }
        Ok(verifier)
    }
}
