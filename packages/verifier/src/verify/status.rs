//! Certificate status bits

use crate::error::CertError;

bitflags::bitflags! {
    /// Conditions detected while verifying a chain.
    ///
    /// A bit is set if and only if its condition was observed during the call
    /// that produced it. Informational bits never change the returned error.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CertStatus: u32 {
        const COMMON_NAME_INVALID       = 1 << 0;
        const DATE_INVALID              = 1 << 1;
        const AUTHORITY_INVALID         = 1 << 2;
        const REVOKED                   = 1 << 6;
        const INVALID                   = 1 << 7;
        const WEAK_SIGNATURE_ALGORITHM  = 1 << 8;
        const NON_UNIQUE_NAME           = 1 << 10;
        const WEAK_KEY                  = 1 << 11;
        const NAME_CONSTRAINT_VIOLATION = 1 << 14;
        const VALIDITY_TOO_LONG         = 1 << 15;

        const IS_EV                     = 1 << 16;
        const REV_CHECKING_ENABLED      = 1 << 17;
        const SHA1_SIGNATURE_PRESENT    = 1 << 19;
    }
}

impl CertStatus {
    /// Every bit that denotes an error
    pub const ALL_ERRORS: CertStatus = CertStatus::COMMON_NAME_INVALID
        .union(CertStatus::DATE_INVALID)
        .union(CertStatus::AUTHORITY_INVALID)
        .union(CertStatus::REVOKED)
        .union(CertStatus::INVALID)
        .union(CertStatus::WEAK_SIGNATURE_ALGORITHM)
        .union(CertStatus::WEAK_KEY)
        .union(CertStatus::NAME_CONSTRAINT_VIOLATION)
        .union(CertStatus::VALIDITY_TOO_LONG);

    /// Returns true if any error bit is set
    #[must_use]
    pub fn is_error(self) -> bool {
        self.intersects(Self::ALL_ERRORS)
    }

    /// Map the most severe error bit to its error code, `None` if no error bit is set
    #[must_use]
    pub fn to_error(self) -> Option<CertError> {
        const ORDER: [(CertStatus, CertError); 9] = [
            (CertStatus::INVALID, CertError::Invalid),
            (CertStatus::REVOKED, CertError::Revoked),
            (CertStatus::AUTHORITY_INVALID, CertError::AuthorityInvalid),
            (CertStatus::NAME_CONSTRAINT_VIOLATION, CertError::NameConstraintViolation),
            (CertStatus::WEAK_KEY, CertError::WeakKey),
            (CertStatus::WEAK_SIGNATURE_ALGORITHM, CertError::WeakSignatureAlgorithm),
            (CertStatus::VALIDITY_TOO_LONG, CertError::ValidityTooLong),
            (CertStatus::COMMON_NAME_INVALID, CertError::CommonNameInvalid),
            (CertStatus::DATE_INVALID, CertError::DateInvalid),
        ];
        ORDER
            .iter()
            .find(|(bit, _)| self.contains(*bit))
            .map(|(_, error)| *error)
    }
}

impl CertError {
    /// The status bit that records this error, if it is a certificate error
    #[must_use]
    pub fn status_bit(self) -> Option<CertStatus> {
        match self {
            CertError::Invalid => Some(CertStatus::INVALID),
            CertError::Revoked => Some(CertStatus::REVOKED),
            CertError::AuthorityInvalid => Some(CertStatus::AUTHORITY_INVALID),
            CertError::NameConstraintViolation => Some(CertStatus::NAME_CONSTRAINT_VIOLATION),
            CertError::WeakKey => Some(CertStatus::WEAK_KEY),
            CertError::WeakSignatureAlgorithm => Some(CertStatus::WEAK_SIGNATURE_ALGORITHM),
            CertError::ValidityTooLong => Some(CertStatus::VALIDITY_TOO_LONG),
            CertError::CommonNameInvalid => Some(CertStatus::COMMON_NAME_INVALID),
            CertError::DateInvalid => Some(CertStatus::DATE_INVALID),
            CertError::InvalidArgument | CertError::ResourceExhausted => None,
        }
    }
}

impl std::fmt::Display for CertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_severe_bit_wins() {
        let status = CertStatus::WEAK_KEY | CertStatus::REVOKED | CertStatus::DATE_INVALID;
        assert_eq!(status.to_error(), Some(CertError::Revoked));
        let status = CertStatus::WEAK_SIGNATURE_ALGORITHM | CertStatus::INVALID;
        assert_eq!(status.to_error(), Some(CertError::Invalid));
    }

    #[test]
    fn informational_bits_map_to_no_error() {
        let status = CertStatus::NON_UNIQUE_NAME | CertStatus::IS_EV | CertStatus::SHA1_SIGNATURE_PRESENT;
        assert!(!status.is_error());
        assert_eq!(status.to_error(), None);
    }

    #[test]
    fn error_bits_round_trip_through_codes() {
        for bit in CertStatus::ALL_ERRORS.iter() {
            let error = bit.to_error().unwrap();
            assert_eq!(error.status_bit(), Some(bit));
        }
    }
}
