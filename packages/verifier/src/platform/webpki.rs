//! Default platform verifier built on rustls' webpki path validation
//!
//! Trust is tried in tiers: the public roots shipped with `webpki-roots`
//! ("known" roots), then the operating system store, then the anchors supplied
//! with the request. A tier is only abandoned when path building fails for
//! lack of an issuer; any other failure is final.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::SystemTime;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::ServerCertVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, RootCertStore};

use super::{PlatformRequest, PlatformVerifier};
use crate::cert::{
    Certificate, CertificateChain, CertificateInfo, HashValue, SignatureDigest, sequence_contents,
    wrap_sequence,
};
use crate::crl_set::CrlSetResult;
use crate::error::{CertError, PlatformError, VerifyStatus};
use crate::verify::hostname::match_leaf;
use crate::verify::{CertStatus, VerifyFlags, VerifyResult};

/// Where a successful path terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TierKind {
    Known,
    Local,
    Additional,
}

/// A trust anchor as far as chain completion needs it
#[derive(Debug, Clone)]
enum Anchor {
    /// Only the name and key are available
    Bare {
        subject_contents: Vec<u8>,
        spki_der: Vec<u8>,
    },
    Full(Certificate),
}

impl Anchor {
    fn subject_contents(&self) -> Option<&[u8]> {
        match self {
            Anchor::Bare { subject_contents, .. } => Some(subject_contents),
            Anchor::Full(cert) => sequence_contents(&cert.info().subject_der),
        }
    }
}

struct TrustTier {
    kind: TierKind,
    verifier: Arc<WebPkiServerVerifier>,
    anchors: Vec<Anchor>,
}

impl std::fmt::Debug for TrustTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustTier")
            .field("kind", &self.kind)
            .field("anchors", &self.anchors.len())
            .finish_non_exhaustive()
    }
}

/// Outcome of path validation against one tier
enum PathOutcome {
    Trusted,
    /// Path is valid but the hostname is not among the leaf's SANs
    NameMismatch,
    UnknownIssuer,
    Failed(CertError),
}

/// rustls-backed [`PlatformVerifier`]
#[derive(Debug)]
pub struct WebPkiVerifier {
    provider: Arc<CryptoProvider>,
    known: TrustTier,
    local: Option<TrustTier>,
}

impl WebPkiVerifier {
    /// Verifier trusting the bundled public roots, plus the operating system
    /// store when `use_system_roots` is set
    pub fn new(use_system_roots: bool) -> Result<Self, PlatformError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let mut known_store = RootCertStore::empty();
        known_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let anchors = webpki_roots::TLS_SERVER_ROOTS
            .iter()
            .filter_map(|anchor| {
                Some(Anchor::Bare {
                    subject_contents: anchor.subject.as_ref().to_vec(),
                    spki_der: wrap_sequence(anchor.subject_public_key_info.as_ref())?,
                })
            })
            .collect();
        let known = TrustTier {
            kind: TierKind::Known,
            verifier: build_verifier(known_store, &provider)?,
            anchors,
        };

        let local = if use_system_roots {
            let certs = load_system_roots();
            tier_from_certificates(TierKind::Local, certs, &provider)?
        } else {
            None
        };

        tracing::debug!(
            target: "certverify::platform",
            known_roots = known.anchors.len(),
            local_roots = local.as_ref().map_or(0, |tier| tier.anchors.len()),
            "Constructed webpki verifier"
        );

        Ok(Self {
            provider,
            known,
            local,
        })
    }

    /// Verifier whose "known" roots are exactly `roots`, with no system store.
    /// Used for private PKIs and for exercising known-root policies.
    pub fn with_known_roots(roots: Vec<Certificate>) -> Result<Self, PlatformError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let known = tier_from_certificates(TierKind::Known, roots, &provider)?
            .ok_or_else(|| PlatformError::TrustStore("no usable known roots".to_string()))?;
        Ok(Self {
            provider,
            known,
            local: None,
        })
    }

    fn validate(&self, tier: &TrustTier, request: &PlatformRequest<'_>) -> PathOutcome {
        let leaf = request.chain.leaf();
        let end_entity = CertificateDer::from(leaf.der());
        let intermediates: Vec<CertificateDer<'_>> = request
            .chain
            .intermediates()
            .iter()
            .map(|cert| CertificateDer::from(cert.der()))
            .collect();
        let server_name = server_name_for(request.hostname, leaf.info());

        match tier.verifier.verify_server_cert(
            &end_entity,
            &intermediates,
            &server_name,
            &[],
            UnixTime::now(),
        ) {
            Ok(_) => PathOutcome::Trusted,
            Err(rustls::Error::InvalidCertificate(error)) => classify(error, leaf.info()),
            Err(error) => {
                tracing::warn!(
                    target: "certverify::platform",
                    error = %error,
                    "Path validation failed outside certificate checks"
                );
                PathOutcome::Failed(CertError::Invalid)
            }
        }
    }
}

impl PlatformVerifier for WebPkiVerifier {
    fn verify(&self, request: &PlatformRequest<'_>, result: &mut VerifyResult) -> VerifyStatus {
        let additional = if request.additional_trust_anchors.is_empty() {
            None
        } else {
            match tier_from_certificates(
                TierKind::Additional,
                request.additional_trust_anchors.to_vec(),
                &self.provider,
            ) {
                Ok(tier) => tier,
                Err(error) => {
                    tracing::warn!(
                        target: "certverify::platform",
                        error = %error,
                        "Ignoring unusable additional trust anchors"
                    );
                    None
                }
            }
        };

        let tiers = std::iter::once(&self.known)
            .chain(self.local.as_ref())
            .chain(additional.as_ref());

        let mut status = CertStatus::empty();
        let mut trusted_tier = None;
        for tier in tiers {
            match self.validate(tier, request) {
                PathOutcome::Trusted | PathOutcome::NameMismatch => {
                    trusted_tier = Some(tier);
                    break;
                }
                PathOutcome::UnknownIssuer => continue,
                PathOutcome::Failed(error) => {
                    if let Some(bit) = error.status_bit() {
                        status |= bit;
                    }
                    break;
                }
            }
        }

        if trusted_tier.is_none() && status.is_empty() {
            status |= CertStatus::AUTHORITY_INVALID;
        }

        let anchor = trusted_tier.and_then(|tier| find_anchor(tier, request.chain));
        let verified = order_chain(request.chain, anchor);
        result.public_key_hashes = public_key_hashes(&verified, anchor);
        record_digests(&verified, result);

        if let Some(tier) = trusted_tier {
            result.is_issued_by_known_root = tier.kind == TierKind::Known;
            result.is_issued_by_additional_trust_anchor = tier.kind == TierKind::Additional;

            // rustls never consults the common name, so its name verdict is advisory
            let names = match_leaf(request.chain.leaf().info(), request.hostname);
            result.common_name_fallback_used = names.common_name_fallback_used;
            if !names.matched {
                status |= CertStatus::COMMON_NAME_INVALID;
            }
        }

        if let Some(crl_set) = request.crl_set {
            let blocked_anchor = result.public_key_hashes.iter().any(|hash| match hash {
                HashValue::Sha256(digest) => crl_set.check_spki(digest) == CrlSetResult::Revoked,
                HashValue::Sha1(_) => false,
            });
            if blocked_anchor
                || crl_set.check_chain(&verified, SystemTime::now()) == CrlSetResult::Revoked
            {
                status |= CertStatus::REVOKED;
            }
        }

        if request.flags.contains(VerifyFlags::REV_CHECKING_ENABLED) {
            status |= CertStatus::REV_CHECKING_ENABLED;
        }

        result.verified_cert = Some(verified);
        result.cert_status |= status;

        match result.cert_status.to_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn build_verifier(
    store: RootCertStore,
    provider: &Arc<CryptoProvider>,
) -> Result<Arc<WebPkiServerVerifier>, PlatformError> {
    WebPkiServerVerifier::builder_with_provider(Arc::new(store), Arc::clone(provider))
        .build()
        .map_err(|e| PlatformError::Builder(e.to_string()))
}

fn tier_from_certificates(
    kind: TierKind,
    certs: Vec<Certificate>,
    provider: &Arc<CryptoProvider>,
) -> Result<Option<TrustTier>, PlatformError> {
    let mut store = RootCertStore::empty();
    let mut anchors = Vec::with_capacity(certs.len());
    for cert in certs {
        match store.add(CertificateDer::from(cert.der().to_vec())) {
            Ok(()) => anchors.push(Anchor::Full(cert)),
            Err(error) => tracing::warn!(
                target: "certverify::platform",
                error = %error,
                fingerprint = %cert.fingerprint(),
                "Skipping unusable trust anchor"
            ),
        }
    }
    if store.is_empty() {
        return Ok(None);
    }
    Ok(Some(TrustTier {
        kind,
        verifier: build_verifier(store, provider)?,
        anchors,
    }))
}

fn load_system_roots() -> Vec<Certificate> {
    let loaded = rustls_native_certs::load_native_certs();
    for error in &loaded.errors {
        tracing::warn!(target: "certverify::platform", error = %error, "System root load error");
    }
    loaded
        .certs
        .iter()
        .filter_map(|der| match Certificate::from_der(der.as_ref()) {
            Ok(cert) => Some(cert),
            Err(error) => {
                tracing::debug!(
                    target: "certverify::platform",
                    error = %error,
                    "Skipping undecodable system root"
                );
                None
            }
        })
        .collect()
}

/// Name handed to rustls. Hostnames rustls cannot represent are replaced by a
/// name from the leaf so path validation still runs; the hostname itself is
/// matched separately.
fn server_name_for(hostname: &str, leaf: &CertificateInfo) -> ServerName<'static> {
    let host = hostname.trim_start_matches('[').trim_end_matches(']');
    if let Ok(name) = ServerName::try_from(host.to_owned()) {
        return name;
    }
    leaf.dns_names
        .iter()
        .find_map(|name| ServerName::try_from(name.trim_start_matches("*.").to_owned()).ok())
        .or_else(|| leaf.ip_addresses.first().map(|ip| ServerName::from(*ip)))
        .unwrap_or_else(|| ServerName::from(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
}

fn classify(error: CertificateError, leaf: &CertificateInfo) -> PathOutcome {
    match error {
        CertificateError::UnknownIssuer => PathOutcome::UnknownIssuer,
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. } => {
            PathOutcome::NameMismatch
        }
        CertificateError::Expired
        | CertificateError::ExpiredContext { .. }
        | CertificateError::NotValidYet
        | CertificateError::NotValidYetContext { .. } => {
            PathOutcome::Failed(CertError::DateInvalid)
        }
        CertificateError::Revoked => PathOutcome::Failed(CertError::Revoked),
        CertificateError::BadSignature
        | CertificateError::BadEncoding
        | CertificateError::UnhandledCriticalExtension
        | CertificateError::InvalidPurpose => PathOutcome::Failed(CertError::Invalid),
        other => {
            let now = SystemTime::now();
            if now < leaf.not_before || now >= leaf.not_after {
                PathOutcome::Failed(CertError::DateInvalid)
            } else {
                tracing::debug!(
                    target: "certverify::platform",
                    error = ?other,
                    "Unmapped certificate error"
                );
                PathOutcome::Failed(CertError::Invalid)
            }
        }
    }
}

/// The anchor that issued the last certificate of the ordered chain
fn find_anchor<'a>(tier: &'a TrustTier, chain: &CertificateChain) -> Option<&'a Anchor> {
    let ordered = order_chain(chain, None);
    let last = ordered.iter().last()?.info();
    if last.is_self_issued() {
        return None;
    }
    let issuer = sequence_contents(&last.issuer_der)?;
    tier.anchors
        .iter()
        .find(|anchor| anchor.subject_contents() == Some(issuer))
}

/// Leaf first, each following certificate the issuer of the previous one.
/// Unrelated intermediates are dropped; a fully known anchor is appended.
fn order_chain(chain: &CertificateChain, anchor: Option<&Anchor>) -> CertificateChain {
    let mut pool: Vec<&Certificate> = chain.intermediates().iter().collect();
    let mut ordered = Vec::new();
    let mut current = chain.leaf();

    while !current.info().is_self_issued() {
        let Some(position) = pool
            .iter()
            .position(|candidate| current.info().is_issued_by(candidate.info()))
        else {
            break;
        };
        let next = pool.swap_remove(position);
        ordered.push(next.clone());
        current = next;
    }

    if let Some(Anchor::Full(root)) = anchor {
        if !current.info().is_self_issued() && root != current {
            ordered.push(root.clone());
        }
    }

    CertificateChain::new(chain.leaf().clone(), ordered)
}

fn public_key_hashes(verified: &CertificateChain, anchor: Option<&Anchor>) -> Vec<HashValue> {
    let mut hashes: Vec<HashValue> = verified.iter().flat_map(Certificate::spki_hashes).collect();
    if let Some(Anchor::Bare { spki_der, .. }) = anchor {
        hashes.extend(HashValue::spki_pair(spki_der));
    }
    hashes
}

/// Weak digest flags over every certificate except a self-signed root,
/// whose own signature is never relied upon
fn record_digests(verified: &CertificateChain, result: &mut VerifyResult) {
    let count = verified.len();
    for (index, cert) in verified.iter().enumerate() {
        let info = cert.info();
        if index > 0 && index == count - 1 && info.is_self_issued() {
            break;
        }
        match info.signature_digest {
            SignatureDigest::Md2 => result.has_md2 = true,
            SignatureDigest::Md4 => result.has_md4 = true,
            SignatureDigest::Md5 => result.has_md5 = true,
            SignatureDigest::Sha1 => {
                result.has_sha1 = true;
                if index == 0 {
                    result.has_sha1_leaf = true;
                }
            }
            _ => {}
        }
    }
}
