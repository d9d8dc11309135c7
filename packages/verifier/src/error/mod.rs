pub mod classification;
pub mod types;

pub use types::{CertError, CertificateParseError, VerifyStatus};
pub use crate::config::ConfigurationError;

/// Platform verifier construction failures
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("trust store construction failed: {0}")]
    TrustStore(String),
    #[error("verifier construction failed: {0}")]
    Builder(String),
}
