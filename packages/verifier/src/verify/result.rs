//! Output of one verification attempt

use super::status::CertStatus;
use crate::cert::{CertificateChain, HashValue};
use crate::error::VerifyStatus;

/// Everything a verification attempt learned about a chain.
///
/// Built fresh for every call, filled by the platform verifier and then
/// amended by the policy overlays. Ownership passes to the caller once the
/// call returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyResult {
    pub cert_status: CertStatus,
    /// Validated chain, leaf first; the input chain until the platform replaces it
    pub verified_cert: Option<CertificateChain>,
    /// SHA-1 and SHA-256 SPKI digests of every certificate in `verified_cert`, leaf to root
    pub public_key_hashes: Vec<HashValue>,
    pub is_issued_by_known_root: bool,
    pub is_issued_by_additional_trust_anchor: bool,
    pub has_md2: bool,
    pub has_md4: bool,
    pub has_md5: bool,
    pub has_sha1: bool,
    pub has_sha1_leaf: bool,
    pub common_name_fallback_used: bool,
}

/// Error code plus the detailed result, as delivered to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub status: VerifyStatus,
    pub result: VerifyResult,
}

impl VerifyOutcome {
    #[must_use]
    pub fn new(status: VerifyStatus, result: VerifyResult) -> Self {
        Self { status, result }
    }

    /// Outcome carrying only an error code, used for calls rejected before verification
    #[must_use]
    pub fn rejected(error: crate::error::CertError) -> Self {
        Self::new(Err(error), VerifyResult::default())
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}
