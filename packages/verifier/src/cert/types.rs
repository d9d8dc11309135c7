//! Certificate handles and their decoded fields

use std::net::IpAddr;
use std::sync::Arc;
use std::time::SystemTime;

use super::hash::{Fingerprint, HashValue};

/// Public key algorithm family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyType {
    Rsa,
    Dsa,
    Ec,
    Dh,
    Ed25519,
    Ed448,
    Unknown,
}

impl KeyType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::Rsa => "RSA",
            KeyType::Dsa => "DSA",
            KeyType::Ec => "ECDSA",
            KeyType::Dh => "DH",
            KeyType::Ed25519 => "Ed25519",
            KeyType::Ed448 => "Ed448",
            KeyType::Unknown => "unknown",
        }
    }
}

/// Digest algorithm used in a certificate's signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureDigest {
    Md2,
    Md4,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Other,
}

/// Decoded SubjectPublicKeyInfo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyInfo {
    pub key_type: KeyType,
    /// Key size in bits, zero when it cannot be determined
    pub size_bits: u32,
    /// Full DER encoding of the SubjectPublicKeyInfo
    pub spki_der: Vec<u8>,
}

/// Fields of an X.509 certificate the verifier consults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Serial number, big-endian two's complement as encoded
    pub serial: Vec<u8>,
    /// DER of the subject Name
    pub subject_der: Vec<u8>,
    /// DER of the issuer Name
    pub issuer_der: Vec<u8>,
    pub subject_common_name: Option<String>,
    pub issuer_common_name: Option<String>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub not_before: SystemTime,
    pub not_after: SystemTime,
    pub public_key: PublicKeyInfo,
    pub signature_digest: SignatureDigest,
    pub is_ca: bool,
}

impl CertificateInfo {
    /// True when subject and issuer names are identical
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject_der == self.issuer_der
    }

    /// Serial number without the sign-padding zero bytes DER adds to positive values
    #[must_use]
    pub fn normalized_serial(&self) -> &[u8] {
        normalize_serial(&self.serial)
    }

    /// True when `other` could have issued this certificate by name
    #[must_use]
    pub fn is_issued_by(&self, other: &CertificateInfo) -> bool {
        self.issuer_der == other.subject_der
    }
}

pub(crate) fn normalize_serial(serial: &[u8]) -> &[u8] {
    let mut serial = serial;
    while serial.len() > 1 && serial[0] == 0 {
        serial = &serial[1..];
    }
    serial
}

struct Inner {
    der: Vec<u8>,
    fingerprint: Fingerprint,
    info: CertificateInfo,
}

/// Immutable, cheaply clonable certificate handle
#[derive(Clone)]
pub struct Certificate {
    inner: Arc<Inner>,
}

impl Certificate {
    /// Wrap a certificate whose fields were already decoded, e.g. by an OS
    /// verification API. The fingerprint is always computed from `der`.
    #[must_use]
    pub fn from_parts(der: Vec<u8>, info: CertificateInfo) -> Self {
        let fingerprint = Fingerprint::of(&der);
        Self {
            inner: Arc::new(Inner { der, fingerprint, info }),
        }
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.inner.der
    }

    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.inner.fingerprint
    }

    #[must_use]
    pub fn info(&self) -> &CertificateInfo {
        &self.inner.info
    }

    /// SHA-1 and SHA-256 digests of the SubjectPublicKeyInfo
    #[must_use]
    pub fn spki_hashes(&self) -> [HashValue; 2] {
        HashValue::spki_pair(&self.inner.info.public_key.spki_der)
    }

    /// SHA-256 digest of the SubjectPublicKeyInfo
    #[must_use]
    pub fn spki_sha256(&self) -> [u8; 32] {
        super::hash::sha256(&self.inner.info.public_key.spki_der)
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.inner.fingerprint == other.inner.fingerprint
    }
}

impl Eq for Certificate {}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("fingerprint", &self.inner.fingerprint)
            .field("subject_cn", &self.inner.info.subject_common_name)
            .field("issuer_cn", &self.inner.info.issuer_common_name)
            .finish_non_exhaustive()
    }
}

/// A leaf certificate plus the intermediates that accompany it.
///
/// As an input the intermediates are an unordered bag supplied by the peer.
/// As a verification output they are ordered leaf-to-root and may end with
/// the trust anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    leaf: Certificate,
    intermediates: Vec<Certificate>,
}

impl CertificateChain {
    #[must_use]
    pub fn new(leaf: Certificate, intermediates: Vec<Certificate>) -> Self {
        Self { leaf, intermediates }
    }

    #[must_use]
    pub fn single(leaf: Certificate) -> Self {
        Self::new(leaf, Vec::new())
    }

    #[must_use]
    pub fn leaf(&self) -> &Certificate {
        &self.leaf
    }

    #[must_use]
    pub fn intermediates(&self) -> &[Certificate] {
        &self.intermediates
    }

    /// Leaf first, then intermediates in order
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        std::iter::once(&self.leaf).chain(self.intermediates.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.intermediates.len()
    }

    /// A chain always holds a leaf
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Fingerprint over the supplied intermediates in their given order
    #[must_use]
    pub fn intermediates_fingerprint(&self) -> Fingerprint {
        let fingerprints: Vec<Fingerprint> =
            self.intermediates.iter().map(Certificate::fingerprint).collect();
        Fingerprint::of_sequence(fingerprints.iter())
    }
}
