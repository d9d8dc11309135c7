//! Platform chain-building seam
//!
//! The policy engine never builds chains itself. It hands the caller's
//! certificates to a [`PlatformVerifier`], which constructs and validates a
//! path to a trusted root and fills in the base [`VerifyResult`]. Exactly one
//! implementation is selected when the verifier is constructed.

pub mod webpki;

use crate::cert::{Certificate, CertificateChain};
use crate::crl_set::CrlSet;
use crate::error::VerifyStatus;
use crate::verify::{VerifyFlags, VerifyResult};

pub use webpki::WebPkiVerifier;

/// Parameters of one platform verification call
#[derive(Debug, Clone, Copy)]
pub struct PlatformRequest<'a> {
    pub chain: &'a CertificateChain,
    pub hostname: &'a str,
    /// Caller flags after implied bits were added
    pub flags: VerifyFlags,
    pub crl_set: Option<&'a CrlSet>,
    pub additional_trust_anchors: &'a [Certificate],
}

/// Builds and validates a chain to a trusted root.
///
/// Implementations must be callable from any thread. On return `result`
/// holds the verified chain (leaf first, root last when known), its public
/// key hashes, the root classification, the weak digest flags and the base
/// status bits; the returned status is the error derived from those bits.
pub trait PlatformVerifier: Send + Sync {
    fn verify(&self, request: &PlatformRequest<'_>, result: &mut VerifyResult) -> VerifyStatus;
}
