//! # certverify core
//!
//! Certificate chain verification with policy overlays, a result cache and a
//! scheduler that runs at most one verification per distinct request.
//!
//! ## Features
//!
//! - **Policy engine** layering denylists, weak key and digest rules and
//!   issuance policy over a platform chain builder
//! - **rustls / webpki** platform verifier with bundled and system roots
//! - **Request coalescing**: concurrent identical requests share one job
//! - **Result cache** with a wall-clock reuse window and LRU eviction
//! - **Worker pools** on dedicated threads or a tokio runtime
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use certverify_core::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = Arc::new(WebPkiVerifier::new(true)?);
//! let pool = Arc::new(ThreadPool::new(4, 256)?);
//! let mut verifier = MultiThreadedCertVerifier::new(PolicyEngine::new(platform), pool);
//!
//! let chain = Certificate::from_pem_chain(&std::fs::read_to_string("chain.pem")?)?;
//! let start = verifier.verify(VerifyRequest::new(chain, "example.com"), |outcome| {
//!     println!("verified: {:?} {}", outcome.status, outcome.result.cert_status);
//! });
//! if let Some(handle) = start.handle() {
//!     // Every pending request must be answered or canceled before the verifier drops
//!     if verifier.wait_for_completion(Duration::from_secs(10)) == 0 {
//!         verifier.cancel_request(handle);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod cache;
pub mod cert;
pub mod config;
pub mod crl_set;
pub mod error;
pub mod platform;
pub mod pool;
pub mod prelude;
pub mod scheduler;
pub mod telemetry;
pub mod trust_anchor;
pub mod verify;

pub use cert::{Certificate, CertificateChain, HashValue};
pub use config::VerifierConfig;
pub use crl_set::{CrlSet, CrlSetResult};
pub use error::{CertError, VerifyStatus};
pub use scheduler::{MultiThreadedCertVerifier, RequestHandle, VerifyRequest, VerifyStart};
pub use verify::{CertStatus, PolicyEngine, VerifyFlags, VerifyOutcome, VerifyResult};
