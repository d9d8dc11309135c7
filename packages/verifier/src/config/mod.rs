//! Verifier configuration and its validation

pub mod types;
pub mod validation;

pub use types::VerifierConfig;
pub use validation::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
