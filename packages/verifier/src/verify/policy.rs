//! Policy overlays applied on top of platform chain validation

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::denylist::Denylist;
use super::flags::VerifyFlags;
use super::hostname::is_hostname_non_unique;
use super::key_strength::examine_chain;
use super::result::{VerifyOutcome, VerifyResult};
use super::status::CertStatus;
use super::validity::{has_too_long_validity, is_late_sha1_issuance};
use crate::cert::{Certificate, CertificateChain};
use crate::crl_set::CrlSet;
use crate::error::{CertError, VerifyStatus};
use crate::platform::{PlatformRequest, PlatformVerifier};
use crate::telemetry::{PolicyEvent, VerifyMetrics};

/// Runs the platform verifier and layers denylists, key and digest strength
/// rules and issuance policy on its answer.
///
/// Stateless apart from telemetry; a single engine is shared by every worker.
#[derive(Clone)]
pub struct PolicyEngine {
    platform: Arc<dyn PlatformVerifier>,
    denylist: Arc<Denylist>,
    metrics: Arc<VerifyMetrics>,
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("denylist", &self.denylist)
            .finish_non_exhaustive()
    }
}

impl PolicyEngine {
    #[must_use]
    pub fn new(platform: Arc<dyn PlatformVerifier>) -> Self {
        Self {
            platform,
            denylist: Arc::new(Denylist::builtin()),
            metrics: Arc::new(VerifyMetrics::new()),
        }
    }

    #[must_use]
    pub fn with_denylist(mut self, denylist: Denylist) -> Self {
        self.denylist = Arc::new(denylist);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<VerifyMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<VerifyMetrics> {
        &self.metrics
    }

    /// Verify `chain` for `hostname`. Never panics; every problem is encoded
    /// in the returned status and the result's status bits.
    #[must_use]
    pub fn verify(
        &self,
        chain: &CertificateChain,
        hostname: &str,
        flags: VerifyFlags,
        crl_set: Option<&CrlSet>,
        additional_trust_anchors: &[Certificate],
    ) -> VerifyOutcome {
        self.metrics.record_verification();

        let mut result = VerifyResult::default();
        result.verified_cert = Some(chain.clone());

        if self.denylist.is_blacklisted(chain.leaf()) {
            tracing::info!(
                target: "certverify::policy",
                leaf = %chain.leaf().fingerprint(),
                hostname = %hostname,
                "Leaf certificate is denylisted"
            );
            self.metrics.record(PolicyEvent::Denylisted);
            result.cert_status |= CertStatus::REVOKED;
            return VerifyOutcome::new(Err(CertError::Revoked), result);
        }

        let request = PlatformRequest {
            chain,
            hostname,
            flags: flags.effective(),
            crl_set,
            additional_trust_anchors,
        };
        let platform_status =
            catch_unwind(AssertUnwindSafe(|| self.platform.verify(&request, &mut result)));
        let mut status = match platform_status {
            Ok(status) => status,
            Err(_) => {
                tracing::error!(
                    target: "certverify::policy",
                    hostname = %hostname,
                    "Platform verifier panicked"
                );
                self.metrics.record(PolicyEvent::PlatformPanic);
                result.cert_status |= CertStatus::INVALID;
                return VerifyOutcome::new(Err(CertError::Invalid), result);
            }
        };

        let verified = result.verified_cert.clone().unwrap_or_else(|| chain.clone());

        if self.denylist.is_public_key_blacklisted(&result.public_key_hashes) {
            tracing::info!(
                target: "certverify::policy",
                hostname = %hostname,
                "Chain contains a revoked public key"
            );
            self.metrics.record(PolicyEvent::RevokedKey);
            result.cert_status |= CertStatus::REVOKED;
            status = status_from_bits(result.cert_status);
        }

        if self
            .denylist
            .has_name_constraints_violation(&result.public_key_hashes, verified.leaf().info())
        {
            self.metrics.record(PolicyEvent::NameConstraintViolation);
            result.cert_status |= CertStatus::NAME_CONSTRAINT_VIOLATION;
            status = recompute(status, result.cert_status);
        }

        let known_root = result.is_issued_by_known_root;
        let weak_key = examine_chain(&verified, |sample| {
            if known_root {
                self.metrics.record_key_size(sample);
            }
        });
        if weak_key {
            self.metrics.record(PolicyEvent::WeakKey);
            result.cert_status |= CertStatus::WEAK_KEY;
            status = recompute(status, result.cert_status);
        }

        self.record_digest_events(&result);
        if result.has_md2 || result.has_md4 {
            result.cert_status |= CertStatus::INVALID;
            status = Err(CertError::Invalid);
        } else if result.has_md5 {
            result.cert_status |= CertStatus::WEAK_SIGNATURE_ALGORITHM;
            status = recompute(status, result.cert_status);
        }

        if result.has_sha1 {
            result.cert_status |= CertStatus::SHA1_SIGNATURE_PRESENT;
            if known_root && result.has_sha1_leaf && is_late_sha1_issuance(verified.leaf().info())
            {
                result.cert_status |= CertStatus::WEAK_SIGNATURE_ALGORITHM;
                status = recompute(status, result.cert_status);
            }
        }

        if known_root && has_too_long_validity(verified.leaf().info()) {
            self.metrics.record(PolicyEvent::ValidityTooLong);
            result.cert_status |= CertStatus::VALIDITY_TOO_LONG;
            status = recompute(status, result.cert_status);
        }

        if known_root && is_hostname_non_unique(hostname) {
            self.metrics.record(PolicyEvent::NonUniqueName);
            result.cert_status |= CertStatus::NON_UNIQUE_NAME;
        }

        if result.common_name_fallback_used {
            self.metrics.record(PolicyEvent::CommonNameFallback);
        }

        tracing::debug!(
            target: "certverify::policy",
            hostname = %hostname,
            status = %result.cert_status,
            known_root,
            ok = status.is_ok(),
            "Verification finished"
        );

        VerifyOutcome::new(status, result)
    }

    fn record_digest_events(&self, result: &VerifyResult) {
        let observed = [
            (result.has_md2, PolicyEvent::Md2Present),
            (result.has_md4, PolicyEvent::Md4Present),
            (result.has_md5, PolicyEvent::Md5Present),
            (result.has_sha1, PolicyEvent::Sha1Present),
        ];
        for (present, event) in observed {
            if present {
                self.metrics.record(event);
            }
        }
    }
}

/// Error derived from the status bits alone
fn status_from_bits(bits: CertStatus) -> VerifyStatus {
    match bits.to_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Re-derive the error after a policy bit was added. Non-certificate errors
/// are left alone and a more severe existing error is never downgraded.
pub(crate) fn recompute(current: VerifyStatus, bits: CertStatus) -> VerifyStatus {
    match current {
        Err(error) if !error.is_certificate_error() => current,
        Err(existing) => match bits.to_error() {
            Some(derived) if derived.severity() > existing.severity() => Err(derived),
            _ => Err(existing),
        },
        Ok(()) => status_from_bits(bits),
    }
}
