//! # certverify
//!
//! Certificate verification for TLS clients: platform chain building with
//! policy overlays, a result cache and coalescing of identical requests.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use certverify::{Certificate, CertVerifier, VerifyRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut verifier = CertVerifier::builder()
//!     .cache_ttl(Duration::from_secs(600))
//!     .worker_threads(2)
//!     .build()?;
//!
//! let chain = Certificate::from_pem_chain(&std::fs::read_to_string("chain.pem")?)?;
//! let start = verifier.verify(VerifyRequest::new(chain, "example.com"), |outcome| {
//!     println!("{:?}", outcome.status);
//! });
//! if let Some(handle) = start.handle() {
//!     if verifier.wait_for_completion(Duration::from_secs(10)) == 0 {
//!         verifier.cancel_request(handle);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;

pub use builder::{BuildError, CertVerifierBuilder};

pub use certverify_core::cert::{Certificate, CertificateChain, HashValue};
pub use certverify_core::config::{ConfigurationError, VerifierConfig};
pub use certverify_core::crl_set::{CrlSet, CrlSetResult};
pub use certverify_core::error::{CertError, VerifyStatus};
pub use certverify_core::scheduler::{
    MultiThreadedCertVerifier, RequestHandle, VerifyRequest, VerifyStart,
};
pub use certverify_core::telemetry::{VerifierStatsSnapshot, VerifyMetrics};
pub use certverify_core::trust_anchor::{StaticTrustAnchors, TrustAnchorSource};
pub use certverify_core::verify::{CertStatus, DenylistConfig, VerifyFlags, VerifyOutcome, VerifyResult};

/// Entry point for building verifiers
pub struct CertVerifier;

impl CertVerifier {
    /// Start a builder with the default configuration
    #[must_use]
    pub fn builder() -> CertVerifierBuilder {
        CertVerifierBuilder::new()
    }

    /// Start a builder from `config`
    #[must_use]
    pub fn from_config(config: VerifierConfig) -> CertVerifierBuilder {
        CertVerifierBuilder::with_config(config)
    }

    /// Verifier over the bundled and system roots with default settings
    ///
    /// # Errors
    ///
    /// See [`CertVerifierBuilder::build`].
    pub fn with_defaults() -> Result<MultiThreadedCertVerifier, BuildError> {
        CertVerifierBuilder::new().build()
    }
}

/// Shorthand for [`CertVerifier::builder`]
#[must_use]
pub fn builder() -> CertVerifierBuilder {
    CertVerifier::builder()
}
