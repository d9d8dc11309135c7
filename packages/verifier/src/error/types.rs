//! Verification error codes
//!
//! `CertError` is the error half of every verification outcome. The success
//! half is `Ok(())`; advisory conditions never become errors and are only
//! visible through [`crate::verify::CertStatus`].

/// Result of a single verification attempt.
pub type VerifyStatus = std::result::Result<(), CertError>;

/// Verification error codes, one per failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum CertError {
    /// Structural defect or a broken digest algorithm (MD2/MD4) in the chain
    #[error("certificate is invalid")]
    Invalid,
    /// Certificate or one of its issuers has been revoked
    #[error("certificate has been revoked")]
    Revoked,
    /// Chain could not be built to a trusted root
    #[error("certificate is not issued by a trusted authority")]
    AuthorityInvalid,
    /// Chain contains a key whose use is restricted to other domains
    #[error("certificate violates name constraints of its issuer")]
    NameConstraintViolation,
    /// Chain contains a key that is too small
    #[error("certificate contains a weak key")]
    WeakKey,
    /// Chain is signed with a weak digest algorithm
    #[error("certificate is signed with a weak signature algorithm")]
    WeakSignatureAlgorithm,
    /// Leaf validity period exceeds what its issuance date allows
    #[error("certificate validity period is too long")]
    ValidityTooLong,
    /// Hostname does not match the certificate
    #[error("certificate is not valid for the requested hostname")]
    CommonNameInvalid,
    /// Certificate is expired or not yet valid
    #[error("certificate date is invalid")]
    DateInvalid,
    /// Malformed call, e.g. an empty hostname
    #[error("invalid argument")]
    InvalidArgument,
    /// Worker pool refused the verification task
    #[error("verification resources exhausted")]
    ResourceExhausted,
}

/// Certificate parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateParseError {
    #[error("DER decoding failed: {0}")]
    Der(String),
    #[error("PEM decoding failed: {0}")]
    Pem(String),
    #[error("no certificates found in input")]
    Empty,
    #[error("certificate has trailing data ({0} bytes)")]
    TrailingData(usize),
}
