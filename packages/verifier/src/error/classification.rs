use super::types::CertError;

impl CertError {
    /// Severity ranking used when several failures are present.
    ///
    /// `Invalid > Revoked > AuthorityInvalid > NameConstraintViolation > WeakKey
    /// > WeakSignatureAlgorithm > ValidityTooLong > CommonNameInvalid > DateInvalid`.
    /// Non-certificate errors rank above all certificate errors so that they
    /// are never replaced by a policy finding.
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            CertError::InvalidArgument | CertError::ResourceExhausted => 100,
            CertError::Invalid => 90,
            CertError::Revoked => 80,
            CertError::AuthorityInvalid => 70,
            CertError::NameConstraintViolation => 60,
            CertError::WeakKey => 50,
            CertError::WeakSignatureAlgorithm => 40,
            CertError::ValidityTooLong => 30,
            CertError::CommonNameInvalid => 20,
            CertError::DateInvalid => 10,
        }
    }

    /// Returns true if the error describes a problem with the certificate itself
    /// rather than with the call or the verifier's resources.
    #[must_use]
    pub fn is_certificate_error(self) -> bool {
        !matches!(self, CertError::InvalidArgument | CertError::ResourceExhausted)
    }

    /// Returns true if the error was produced by a revocation source.
    #[must_use]
    pub fn is_revocation(self) -> bool {
        matches!(self, CertError::Revoked)
    }

    /// Returns true if the chain itself could not be trusted, as opposed to a
    /// policy overlay rejecting an otherwise trusted chain.
    #[must_use]
    pub fn is_trust_failure(self) -> bool {
        matches!(
            self,
            CertError::Invalid | CertError::AuthorityInvalid | CertError::DateInvalid
        )
    }
}
