//! Verification result cache
//!
//! Finished verifications are kept for a fixed wall-clock window and served
//! to later identical requests. The cache is owned by the scheduler and must
//! be cleared whenever the trust store changes.

pub mod cache_entry;
pub mod clock;
pub mod epoch;
pub mod request_cache;
pub mod request_key;

pub use cache_entry::CachedEntry;
pub use clock::{CacheClock, SystemClock};
pub use epoch::TrustStoreEpoch;
pub use request_cache::{DEFAULT_CAPACITY, RequestCache};
pub use request_key::RequestKey;
