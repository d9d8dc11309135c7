//! X.509 decoding into [`CertificateInfo`]

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use x509_parser::extensions::GeneralName;
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::public_key::PublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

use super::asn1::dsa_prime_bits;
use super::types::{
    Certificate, CertificateChain, CertificateInfo, KeyType, PublicKeyInfo, SignatureDigest,
};
use crate::error::CertificateParseError;

impl Certificate {
    /// Decode a DER certificate
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateParseError> {
        let info = parse_certificate_info(der)?;
        Ok(Self::from_parts(der.to_vec(), info))
    }

    /// Decode every certificate of a PEM bundle, in order
    pub fn from_pem_bundle(pem: &str) -> Result<Vec<Self>, CertificateParseError> {
        let mut reader = pem.as_bytes();
        let mut certs = Vec::new();
        for item in rustls_pemfile::certs(&mut reader) {
            let der = item.map_err(|e| CertificateParseError::Pem(e.to_string()))?;
            certs.push(Self::from_der(der.as_ref())?);
        }
        if certs.is_empty() {
            return Err(CertificateParseError::Empty);
        }
        Ok(certs)
    }

    /// Decode a PEM bundle whose first certificate is the leaf
    pub fn from_pem_chain(pem: &str) -> Result<CertificateChain, CertificateParseError> {
        let mut certs = Self::from_pem_bundle(pem)?.into_iter();
        let leaf = certs.next().ok_or(CertificateParseError::Empty)?;
        Ok(CertificateChain::new(leaf, certs.collect()))
    }
}

/// Decode the fields the verifier consults from a DER certificate
pub fn parse_certificate_info(der: &[u8]) -> Result<CertificateInfo, CertificateParseError> {
    let (rest, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| CertificateParseError::Der(e.to_string()))?;
    if !rest.is_empty() {
        return Err(CertificateParseError::TrailingData(rest.len()));
    }

    let (dns_names, ip_addresses) = subject_alt_names(&cert);

    Ok(CertificateInfo {
        serial: cert.raw_serial().to_vec(),
        subject_der: cert.subject().as_raw().to_vec(),
        issuer_der: cert.issuer().as_raw().to_vec(),
        subject_common_name: first_common_name(cert.subject()),
        issuer_common_name: first_common_name(cert.issuer()),
        dns_names,
        ip_addresses,
        not_before: system_time(cert.validity().not_before.timestamp()),
        not_after: system_time(cert.validity().not_after.timestamp()),
        public_key: public_key_info(cert.public_key()),
        signature_digest: signature_digest(&cert.signature_algorithm.algorithm.to_id_string()),
        is_ca: cert.is_ca(),
    })
}

fn first_common_name(name: &x509_parser::x509::X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn subject_alt_names(cert: &X509Certificate<'_>) -> (Vec<String>, Vec<IpAddr>) {
    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();

    let san = match cert.subject_alternative_name() {
        Ok(Some(san)) => san,
        Ok(None) => return (dns_names, ip_addresses),
        Err(e) => {
            tracing::warn!(
                target: "certverify::cert",
                error = %e,
                "Malformed subjectAltName extension, ignoring"
            );
            return (dns_names, ip_addresses);
        }
    };

    for name in &san.value.general_names {
        match name {
            GeneralName::DNSName(dns) => dns_names.push((*dns).to_string()),
            GeneralName::IPAddress(bytes) => match bytes.len() {
                4 => {
                    let mut octets = [0u8; 4];
                    octets.copy_from_slice(bytes);
                    ip_addresses.push(IpAddr::V4(Ipv4Addr::from(octets)));
                }
                16 => {
                    let mut octets = [0u8; 16];
                    octets.copy_from_slice(bytes);
                    ip_addresses.push(IpAddr::V6(Ipv6Addr::from(octets)));
                }
                other => {
                    tracing::warn!(
                        target: "certverify::cert",
                        length = other,
                        "Ignoring iPAddress SAN with unexpected length"
                    );
                }
            },
            _ => {}
        }
    }

    (dns_names, ip_addresses)
}

/// Decode a DER SubjectPublicKeyInfo into the key type and size the
/// weak-key policy consults
pub fn parse_public_key_info(spki_der: &[u8]) -> Result<PublicKeyInfo, CertificateParseError> {
    let (rest, spki) = SubjectPublicKeyInfo::from_der(spki_der)
        .map_err(|e| CertificateParseError::Der(e.to_string()))?;
    if !rest.is_empty() {
        return Err(CertificateParseError::TrailingData(rest.len()));
    }
    Ok(public_key_info(&spki))
}

fn public_key_info(spki: &SubjectPublicKeyInfo<'_>) -> PublicKeyInfo {
    let oid = spki.algorithm.algorithm.to_id_string();

    let (key_type, size_bits) = match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => (KeyType::Rsa, to_u32(rsa.key_size())),
        Ok(PublicKey::EC(point)) => (KeyType::Ec, to_u32(point.key_size())),
        Ok(PublicKey::DSA(_)) => (KeyType::Dsa, dsa_prime_bits(spki.raw).unwrap_or(0)),
        _ => match oid.as_str() {
            "1.3.101.112" => (KeyType::Ed25519, 256),
            "1.3.101.113" => (KeyType::Ed448, 456),
            "1.2.840.10040.4.1" => (KeyType::Dsa, dsa_prime_bits(spki.raw).unwrap_or(0)),
            "1.2.840.10046.2.1" | "1.2.840.113549.1.3.1" => (KeyType::Dh, 0),
            _ => (KeyType::Unknown, 0),
        },
    };

    PublicKeyInfo {
        key_type,
        size_bits,
        spki_der: spki.raw.to_vec(),
    }
}

/// Map a signature algorithm OID onto the digest it uses
#[must_use]
pub fn signature_digest(oid: &str) -> SignatureDigest {
    match oid {
        "1.2.840.113549.1.1.2" => SignatureDigest::Md2,
        "1.2.840.113549.1.1.3" => SignatureDigest::Md4,
        "1.2.840.113549.1.1.4" => SignatureDigest::Md5,
        "1.2.840.113549.1.1.5" | "1.3.14.3.2.29" | "1.2.840.10045.4.1" | "1.2.840.10040.4.3" => {
            SignatureDigest::Sha1
        }
        "1.2.840.113549.1.1.11" | "1.2.840.10045.4.3.2" | "2.16.840.1.101.3.4.3.2" => {
            SignatureDigest::Sha256
        }
        "1.2.840.113549.1.1.12" | "1.2.840.10045.4.3.3" => SignatureDigest::Sha384,
        "1.2.840.113549.1.1.13" | "1.2.840.10045.4.3.4" => SignatureDigest::Sha512,
        _ => SignatureDigest::Other,
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn system_time(unix_seconds: i64) -> SystemTime {
    let magnitude = Duration::from_secs(unix_seconds.unsigned_abs());
    if unix_seconds >= 0 {
        UNIX_EPOCH + magnitude
    } else {
        UNIX_EPOCH - magnitude
    }
}
