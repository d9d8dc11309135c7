//! Policy outcome counters and the public key size histogram

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;
use dashmap::DashMap;

use crate::cert::KeyType;
use crate::verify::key_strength::{KeyPosition, KeySample};

/// Policy decisions worth counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyEvent {
    Denylisted,
    RevokedKey,
    NameConstraintViolation,
    WeakKey,
    Md2Present,
    Md4Present,
    Md5Present,
    Sha1Present,
    CommonNameFallback,
    ValidityTooLong,
    NonUniqueName,
    PlatformPanic,
}

/// Histogram bucket: key position, algorithm, baseline applicability and size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeySizeBucket {
    pub position: KeyPosition,
    pub key_type: KeyType,
    pub baseline_applies: bool,
    pub size_bits: u32,
}

/// Shared sink for policy telemetry, written from worker threads
#[derive(Debug, Default)]
pub struct VerifyMetrics {
    verifications: CachePadded<AtomicU64>,
    denylisted: CachePadded<AtomicU64>,
    revoked_keys: CachePadded<AtomicU64>,
    name_constraint_violations: CachePadded<AtomicU64>,
    weak_keys: CachePadded<AtomicU64>,
    md2: CachePadded<AtomicU64>,
    md4: CachePadded<AtomicU64>,
    md5: CachePadded<AtomicU64>,
    sha1: CachePadded<AtomicU64>,
    common_name_fallbacks: CachePadded<AtomicU64>,
    validity_too_long: CachePadded<AtomicU64>,
    non_unique_names: CachePadded<AtomicU64>,
    platform_panics: CachePadded<AtomicU64>,
    key_sizes: DashMap<KeySizeBucket, u64>,
}

impl VerifyMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_verification(&self) {
        self.verifications.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record(&self, event: PolicyEvent) {
        self.counter(event).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_key_size(&self, sample: KeySample) {
        let bucket = KeySizeBucket {
            position: sample.position,
            key_type: sample.key_type,
            baseline_applies: sample.baseline_applies,
            size_bits: sample.size_bits,
        };
        *self.key_sizes.entry(bucket).or_insert(0) += 1;
    }

    #[must_use]
    pub fn verifications(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn count(&self, event: PolicyEvent) -> u64 {
        self.counter(event).load(Ordering::Relaxed)
    }

    /// Copy of the key size histogram, ordered by bucket
    #[must_use]
    pub fn key_size_histogram(&self) -> BTreeMap<KeySizeBucket, u64> {
        self.key_sizes
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    fn counter(&self, event: PolicyEvent) -> &AtomicU64 {
        match event {
            PolicyEvent::Denylisted => &self.denylisted,
            PolicyEvent::RevokedKey => &self.revoked_keys,
            PolicyEvent::NameConstraintViolation => &self.name_constraint_violations,
            PolicyEvent::WeakKey => &self.weak_keys,
            PolicyEvent::Md2Present => &self.md2,
            PolicyEvent::Md4Present => &self.md4,
            PolicyEvent::Md5Present => &self.md5,
            PolicyEvent::Sha1Present => &self.sha1,
            PolicyEvent::CommonNameFallback => &self.common_name_fallbacks,
            PolicyEvent::ValidityTooLong => &self.validity_too_long,
            PolicyEvent::NonUniqueName => &self.non_unique_names,
            PolicyEvent::PlatformPanic => &self.platform_panics,
        }
    }
}
