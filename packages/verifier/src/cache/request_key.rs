//! Identity of a verification request

use crate::cert::{Certificate, CertificateChain, Fingerprint};
use crate::verify::VerifyFlags;

/// Everything that can change a verification answer.
///
/// Two requests with equal keys produce the same result until the cache
/// window closes, so they are coalesced. Ordering is lexicographic over the
/// fields in declaration order: flags, hostname, then the fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestKey {
    flags: VerifyFlags,
    hostname: String,
    leaf: Fingerprint,
    /// Digest over the supplied intermediates, in the order supplied
    intermediates: Fingerprint,
    anchors: Vec<Fingerprint>,
}

impl RequestKey {
    #[must_use]
    pub fn new(
        chain: &CertificateChain,
        hostname: &str,
        flags: VerifyFlags,
        anchors: &[Certificate],
    ) -> Self {
        Self {
            flags,
            hostname: hostname.to_owned(),
            leaf: chain.leaf().fingerprint(),
            intermediates: chain.intermediates_fingerprint(),
            anchors: anchors.iter().map(Certificate::fingerprint).collect(),
        }
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[must_use]
    pub fn flags(&self) -> VerifyFlags {
        self.flags
    }
}
