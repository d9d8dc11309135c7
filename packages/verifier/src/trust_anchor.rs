//! Additional trust anchors supplied by the embedding application

use crate::cert::Certificate;

/// Supplies extra roots, such as enterprise-pinned CAs, that are trusted in
/// addition to the platform store.
///
/// Queried once per `verify` call on the owning context, never from a worker.
/// The returned list participates in the request key, so changing it makes
/// earlier cache entries unreachable.
pub trait TrustAnchorSource {
    fn additional_trust_anchors(&self) -> Vec<Certificate>;
}

impl<T: TrustAnchorSource + ?Sized> TrustAnchorSource for Box<T> {
    fn additional_trust_anchors(&self) -> Vec<Certificate> {
        (**self).additional_trust_anchors()
    }
}

/// A fixed anchor list
#[derive(Debug, Clone, Default)]
pub struct StaticTrustAnchors {
    anchors: Vec<Certificate>,
}

impl StaticTrustAnchors {
    #[must_use]
    pub fn new(anchors: Vec<Certificate>) -> Self {
        Self { anchors }
    }

    pub fn push(&mut self, anchor: Certificate) {
        self.anchors.push(anchor);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl TrustAnchorSource for StaticTrustAnchors {
    fn additional_trust_anchors(&self) -> Vec<Certificate> {
        self.anchors.clone()
    }
}
