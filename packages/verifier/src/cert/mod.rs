//! Certificate model
//!
//! Certificates are immutable, reference-counted values. The verifier never
//! mutates them; it only reads the decoded fields and digests.

mod asn1;
pub mod hash;
pub mod parser;
pub mod types;

pub use hash::{Fingerprint, HashValue};
pub use parser::{parse_certificate_info, parse_public_key_info};
pub use types::{
    Certificate, CertificateChain, CertificateInfo, KeyType, PublicKeyInfo, SignatureDigest,
};

pub(crate) use asn1::{sequence_contents, wrap_sequence};
pub(crate) use types::normalize_serial;

/// Decoded fields of a leaf for `dns_names`, for unit tests that do not
/// need real DER
#[cfg(test)]
pub(crate) fn sample_info(dns_names: &[&str]) -> CertificateInfo {
    use std::time::{Duration, UNIX_EPOCH};

    CertificateInfo {
        serial: vec![0x01],
        subject_der: dns_names.concat().into_bytes(),
        issuer_der: b"issuer".to_vec(),
        subject_common_name: dns_names.first().map(|name| (*name).to_owned()),
        issuer_common_name: Some("Test CA".to_owned()),
        dns_names: dns_names.iter().map(|name| (*name).to_owned()).collect(),
        ip_addresses: Vec::new(),
        not_before: UNIX_EPOCH,
        not_after: UNIX_EPOCH + Duration::from_secs(86_400),
        public_key: PublicKeyInfo {
            key_type: KeyType::Ec,
            size_bits: 256,
            spki_der: dns_names.concat().into_bytes(),
        },
        signature_digest: SignatureDigest::Sha256,
        is_ca: false,
    }
}
