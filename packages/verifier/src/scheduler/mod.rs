//! Job scheduling: cache lookup, in-flight coalescing and completion fan-out

pub mod core;
pub(crate) mod job;
pub mod request;

pub use self::core::{DEFAULT_CACHE_TTL, MultiThreadedCertVerifier};
pub use request::{RequestHandle, RequestId, VerifyRequest, VerifyStart};
