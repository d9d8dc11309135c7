//! Scheduler statistics with cache-padded atomic counters

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Monotonic counters kept by the scheduler.
///
/// Counters only grow for the lifetime of a verifier. Each one sits on its own
/// cache line so workers and the owner never contend on the same line.
#[derive(Debug, Default)]
pub struct VerifierStats {
    /// Calls accepted by `verify` with a non-empty hostname
    pub requests: CachePadded<AtomicU64>,
    /// Calls answered from the request cache
    pub cache_hits: CachePadded<AtomicU64>,
    /// Calls attached to an already running job
    pub inflight_joins: CachePadded<AtomicU64>,
}

/// Point-in-time copy of the scheduler counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifierStatsSnapshot {
    pub requests: u64,
    pub cache_hits: u64,
    pub inflight_joins: u64,
    /// Entries currently held by the request cache
    pub cache_size: usize,
}

impl VerifierStats {
    #[inline]
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_inflight_join(&self) {
        self.inflight_joins.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters with relaxed ordering
    #[inline]
    pub fn snapshot(&self, cache_size: usize) -> VerifierStatsSnapshot {
        VerifierStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            inflight_joins: self.inflight_joins.load(Ordering::Relaxed),
            cache_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let stats = VerifierStats::default();
        stats.record_request();
        stats.record_request();
        stats.record_cache_hit();
        stats.record_inflight_join();
        assert_eq!(
            stats.snapshot(4),
            VerifierStatsSnapshot {
                requests: 2,
                cache_hits: 1,
                inflight_joins: 1,
                cache_size: 4,
            }
        );
    }
}
