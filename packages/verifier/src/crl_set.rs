//! Pushed revocation data
//!
//! A `CrlSet` is an immutable snapshot of blocked keys and revoked serials,
//! distributed out of band and consulted during verification. Parsing the
//! distribution format is left to the caller; sets are assembled with
//! [`CrlSet::builder`].

use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

use crate::cert::{CertificateChain, normalize_serial};

/// Outcome of a CRLSet lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrlSetResult {
    /// The set covers the issuer and the certificate is not revoked
    Good,
    Revoked,
    /// The set has no data for this issuer, or has expired
    Unknown,
}

/// Snapshot of pushed revocation data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrlSet {
    sequence: u32,
    not_after: Option<SystemTime>,
    /// SHA-256 of SubjectPublicKeyInfos blocked outright
    blocked_spkis: BTreeSet<[u8; 32]>,
    /// Issuer SPKI SHA-256 to the serials it revoked
    revoked_serials: BTreeMap<[u8; 32], BTreeSet<Vec<u8>>>,
}

impl CrlSet {
    #[must_use]
    pub fn builder() -> CrlSetBuilder {
        CrlSetBuilder::default()
    }

    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    #[must_use]
    pub fn not_after(&self) -> Option<SystemTime> {
        self.not_after
    }

    /// True once `now` has reached the set's expiry
    #[must_use]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.not_after.is_some_and(|not_after| now >= not_after)
    }

    /// Revoked if the key is blocked outright, otherwise Good
    #[must_use]
    pub fn check_spki(&self, spki_sha256: &[u8; 32]) -> CrlSetResult {
        if self.blocked_spkis.contains(spki_sha256) {
            CrlSetResult::Revoked
        } else {
            CrlSetResult::Good
        }
    }

    /// Look up `serial` among the serials revoked by the issuer key
    #[must_use]
    pub fn check_serial(&self, serial: &[u8], issuer_spki_sha256: &[u8; 32]) -> CrlSetResult {
        match self.revoked_serials.get(issuer_spki_sha256) {
            None => CrlSetResult::Unknown,
            Some(serials) if serials.contains(normalize_serial(serial)) => CrlSetResult::Revoked,
            Some(_) => CrlSetResult::Good,
        }
    }

    /// Check an ordered chain, leaf first. Any revoked key or serial makes the
    /// chain Revoked; Good requires the leaf's issuer to be covered.
    #[must_use]
    pub fn check_chain(&self, chain: &CertificateChain, now: SystemTime) -> CrlSetResult {
        let certs: Vec<_> = chain.iter().collect();

        for cert in &certs {
            if self.check_spki(&cert.spki_sha256()) == CrlSetResult::Revoked {
                return CrlSetResult::Revoked;
            }
        }

        let mut leaf_result = CrlSetResult::Unknown;
        for (index, pair) in certs.windows(2).enumerate() {
            let (subject, issuer) = (pair[0], pair[1]);
            let result = self.check_serial(&subject.info().serial, &issuer.spki_sha256());
            if result == CrlSetResult::Revoked {
                return CrlSetResult::Revoked;
            }
            if index == 0 {
                leaf_result = result;
            }
        }

        if self.is_expired(now) {
            return CrlSetResult::Unknown;
        }
        leaf_result
    }
}

/// Incremental construction of a [`CrlSet`]
#[derive(Debug, Default)]
pub struct CrlSetBuilder {
    set: CrlSet,
}

impl CrlSetBuilder {
    #[must_use]
    pub fn sequence(mut self, sequence: u32) -> Self {
        self.set.sequence = sequence;
        self
    }

    #[must_use]
    pub fn not_after(mut self, not_after: SystemTime) -> Self {
        self.set.not_after = Some(not_after);
        self
    }

    #[must_use]
    pub fn block_spki(mut self, spki_sha256: [u8; 32]) -> Self {
        self.set.blocked_spkis.insert(spki_sha256);
        self
    }

    /// Record that the issuer key is covered, with no revoked serials yet
    #[must_use]
    pub fn cover_issuer(mut self, issuer_spki_sha256: [u8; 32]) -> Self {
        self.set.revoked_serials.entry(issuer_spki_sha256).or_default();
        self
    }

    #[must_use]
    pub fn revoke_serial(mut self, issuer_spki_sha256: [u8; 32], serial: &[u8]) -> Self {
        self.set
            .revoked_serials
            .entry(issuer_spki_sha256)
            .or_default()
            .insert(normalize_serial(serial).to_vec());
        self
    }

    #[must_use]
    pub fn build(self) -> CrlSet {
        self.set
    }
}
