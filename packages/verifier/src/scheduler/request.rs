//! Caller-facing request values and handles

use std::sync::Arc;

use crate::cert::{Certificate, CertificateChain};
use crate::crl_set::CrlSet;
use crate::verify::{VerifyFlags, VerifyOutcome};

/// Parameters of one `verify` call
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub chain: CertificateChain,
    pub hostname: String,
    pub flags: VerifyFlags,
    pub crl_set: Option<Arc<CrlSet>>,
    /// Anchors trusted for this call only, after any configured source's anchors
    pub additional_trust_anchors: Vec<Certificate>,
}

impl VerifyRequest {
    #[must_use]
    pub fn new(chain: CertificateChain, hostname: impl Into<String>) -> Self {
        Self {
            chain,
            hostname: hostname.into(),
            flags: VerifyFlags::empty(),
            crl_set: None,
            additional_trust_anchors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: VerifyFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_crl_set(mut self, crl_set: Arc<CrlSet>) -> Self {
        self.crl_set = Some(crl_set);
        self
    }

    #[must_use]
    pub fn with_additional_trust_anchors(mut self, anchors: Vec<Certificate>) -> Self {
        self.additional_trust_anchors = anchors;
        self
    }
}

/// Identifies one pending call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

/// Handle to a pending call, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHandle {
    id: RequestId,
}

impl RequestHandle {
    pub(crate) fn new(id: RequestId) -> Self {
        Self { id }
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }
}

/// How a `verify` call started
#[derive(Debug)]
pub enum VerifyStart {
    /// Answered synchronously: from the cache, or rejected before dispatch.
    /// The callback is never invoked.
    Completed(VerifyOutcome),
    /// Queued; the callback fires once unless the request is canceled
    Pending(RequestHandle),
}

impl VerifyStart {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, VerifyStart::Pending(_))
    }

    /// The synchronous outcome, if any
    #[must_use]
    pub fn completed(self) -> Option<VerifyOutcome> {
        match self {
            VerifyStart::Completed(outcome) => Some(outcome),
            VerifyStart::Pending(_) => None,
        }
    }

    #[must_use]
    pub fn handle(&self) -> Option<RequestHandle> {
        match self {
            VerifyStart::Completed(_) => None,
            VerifyStart::Pending(handle) => Some(*handle),
        }
    }
}
