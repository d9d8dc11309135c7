//! Trust-store change notification

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generation counter bumped whenever trusted roots change.
///
/// Clones share the counter. Any thread may call
/// [`notify_changed`](Self::notify_changed); the scheduler compares the
/// generation on each call and drops its cache when it moved.
#[derive(Debug, Clone, Default)]
pub struct TrustStoreEpoch {
    generation: Arc<AtomicU64>,
}

impl TrustStoreEpoch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the trust store changed
    pub fn notify_changed(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            target: "certverify::cache",
            generation,
            "Trust store changed"
        );
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
