//! Cached verification outcome with its validity window

use std::time::SystemTime;

use crate::verify::VerifyOutcome;

/// A finished verification plus the wall-clock window it may be served in
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub outcome: VerifyOutcome,
    /// Start of the window, inclusive
    pub verification_time: SystemTime,
    /// End of the window, exclusive
    pub expiration_time: SystemTime,
    hits: u64,
    last_used: u64,
}

impl CachedEntry {
    #[must_use]
    pub fn new(
        outcome: VerifyOutcome,
        verification_time: SystemTime,
        expiration_time: SystemTime,
    ) -> Self {
        Self {
            outcome,
            verification_time,
            expiration_time,
            hits: 0,
            last_used: 0,
        }
    }

    /// True if `now` lies in `[verification_time, expiration_time)`. A clock
    /// moved backwards before the verification or forwards past the expiry
    /// both invalidate the entry.
    #[must_use]
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        now >= self.verification_time && now < self.expiration_time
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub(super) fn touch(&mut self, tick: u64) {
        self.hits += 1;
        self.last_used = tick;
    }

    pub(super) fn set_last_used(&mut self, tick: u64) {
        self.last_used = tick;
    }

    pub(super) fn last_used(&self) -> u64 {
        self.last_used
    }
}
