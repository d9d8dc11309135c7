//! Certificate and public key digests

use std::fmt;

use ring::digest::{SHA1_FOR_LEGACY_USE_ONLY, SHA256, digest};
use serde::{Deserialize, Serialize};

/// SHA-256 digest of a certificate's DER encoding
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Fingerprint of arbitrary DER content
    #[must_use]
    pub fn of(der: &[u8]) -> Self {
        Self(sha256(der))
    }

    /// Fingerprint of an ordered sequence of certificates
    #[must_use]
    pub fn of_sequence<'a>(parts: impl IntoIterator<Item = &'a Fingerprint>) -> Self {
        let mut ctx = ring::digest::Context::new(&SHA256);
        for part in parts {
            ctx.update(&part.0);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(ctx.finish().as_ref());
        Self(out)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(self.0))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A digest of a SubjectPublicKeyInfo, tagged with its algorithm
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HashValue {
    Sha1([u8; 20]),
    Sha256([u8; 32]),
}

impl HashValue {
    /// Both digests of an SPKI, SHA-1 first
    #[must_use]
    pub fn spki_pair(spki_der: &[u8]) -> [HashValue; 2] {
        [
            HashValue::Sha1(sha1(spki_der)),
            HashValue::Sha256(sha256(spki_der)),
        ]
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HashValue::Sha1(bytes) => bytes,
            HashValue::Sha256(bytes) => bytes,
        }
    }

    /// Parses `sha1/<hex>` or `sha256/<hex>`
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (algorithm, encoded) = text.split_once('/')?;
        let bytes = hex::decode(encoded).ok()?;
        match algorithm {
            "sha1" => bytes.try_into().ok().map(HashValue::Sha1),
            "sha256" => bytes.try_into().ok().map(HashValue::Sha256),
            _ => None,
        }
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashValue::Sha1(bytes) => write!(f, "sha1/{}", hex::encode(bytes)),
            HashValue::Sha256(bytes) => write!(f, "sha256/{}", hex::encode(bytes)),
        }
    }
}

pub(crate) fn sha1(data: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(digest(&SHA1_FOR_LEGACY_USE_ONLY, data).as_ref());
    out
}

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}
