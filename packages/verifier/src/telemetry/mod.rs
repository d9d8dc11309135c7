//! Counters and histograms exposed for observability

pub mod metrics;
pub mod stats;

pub use metrics::{KeySizeBucket, PolicyEvent, VerifyMetrics};
pub use stats::{VerifierStats, VerifierStatsSnapshot};
