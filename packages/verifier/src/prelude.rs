//! Types most callers need, for glob import

pub use crate::cert::{Certificate, CertificateChain, HashValue};
pub use crate::config::{Validator, VerifierConfig};
pub use crate::crl_set::CrlSet;
pub use crate::error::{CertError, VerifyStatus};
pub use crate::platform::{PlatformVerifier, WebPkiVerifier};
pub use crate::pool::{ThreadPool, TokioBlockingPool, WorkerPool};
pub use crate::scheduler::{MultiThreadedCertVerifier, RequestHandle, VerifyRequest, VerifyStart};
pub use crate::telemetry::VerifierStatsSnapshot;
pub use crate::trust_anchor::{StaticTrustAnchors, TrustAnchorSource};
pub use crate::verify::{CertStatus, PolicyEngine, VerifyFlags, VerifyOutcome, VerifyResult};
