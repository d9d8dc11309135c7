//! Fluent construction of a verifier

pub mod core;

pub use core::{BuildError, CertVerifierBuilder};
