bitflags::bitflags! {
    /// Caller-selected verification behaviour
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct VerifyFlags: u32 {
        /// Attempt online revocation checking
        const REV_CHECKING_ENABLED = 1 << 0;
        /// Attempt Extended Validation checks
        const EV_CERT = 1 << 1;
        /// Allow the platform verifier to fetch missing intermediates
        const CERT_IO_ENABLED = 1 << 2;
        /// Revocation checking restricted to EV-class certificates
        const REV_CHECKING_ENABLED_EV_ONLY = 1 << 3;
    }
}

impl VerifyFlags {
    /// Flags as handed to the platform verifier. EV checks imply EV-only
    /// revocation checking unless full revocation checking is already on.
    #[must_use]
    pub fn effective(self) -> Self {
        if self.contains(Self::EV_CERT) && !self.contains(Self::REV_CHECKING_ENABLED) {
            self | Self::REV_CHECKING_ENABLED_EV_ONLY
        } else {
            self
        }
    }
}
