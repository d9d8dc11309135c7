//! Compiled-in denylists plus deployment-supplied extensions
//!
//! The built-in tables are immutable process-wide data. Lookups are linear
//! scans; the tables are small.

use std::time::{Duration, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::cert::{Certificate, CertificateInfo, HashValue};

/// Serial numbers denied under one issuer
struct BlockedSerials {
    /// Issuer common name the serials were issued under, `None` for any issuer
    issuer_common_name: Option<&'static str>,
    serials: &'static [[u8; 16]],
}

const BLOCKED_SERIALS: &[BlockedSerials] = &[
    BlockedSerials {
        issuer_common_name: None,
        // Not a real certificate. For testing only.
        serials: &[[
            0x07, 0x7a, 0x59, 0xbc, 0xd5, 0x34, 0x59, 0x60, 0x1c, 0xa6, 0x90, 0x72, 0x67, 0xa6,
            0xdd, 0x1c,
        ]],
    },
    BlockedSerials {
        // Fraudulently issued in March 2011, all expiring 2014-03-14
        issuer_common_name: Some("UTN-USERFirst-Hardware"),
        serials: &[
            // mail.google.com
            [
                0x04, 0x7e, 0xcb, 0xe9, 0xfc, 0xa5, 0x5f, 0x7b, 0xd0, 0x9e, 0xae, 0x36, 0xe1, 0x0c,
                0xae, 0x1e,
            ],
            // global trustee
            [
                0xd8, 0xf3, 0x5f, 0x4e, 0xb7, 0x87, 0x2b, 0x2d, 0xab, 0x06, 0x92, 0xe3, 0x15, 0x38,
                0x2f, 0xb0,
            ],
            // login.live.com
            [
                0xb0, 0xb7, 0x13, 0x3e, 0xd0, 0x96, 0xf9, 0xb5, 0x6f, 0xae, 0x91, 0xc8, 0x74, 0xbd,
                0x3a, 0xc0,
            ],
            // addons.mozilla.org
            [
                0x92, 0x39, 0xd5, 0x34, 0x8f, 0x40, 0xd1, 0x69, 0x5a, 0x74, 0x54, 0x70, 0xe1, 0xf2,
                0x3f, 0x43,
            ],
            // login.skype.com
            [
                0xe9, 0x02, 0x8b, 0x95, 0x78, 0xe4, 0x15, 0xdc, 0x1a, 0x71, 0x0a, 0x2b, 0x88, 0x15,
                0x44, 0x47,
            ],
            // login.yahoo.com
            [
                0xd7, 0x55, 0x8f, 0xda, 0xf5, 0xf1, 0x10, 0x5b, 0xb2, 0x13, 0x28, 0x2b, 0x70, 0x77,
                0x29, 0xa3,
            ],
            // www.google.com
            [
                0xf5, 0xc8, 0x6a, 0xf3, 0x61, 0x62, 0xf1, 0x3a, 0x64, 0xf5, 0x4f, 0x6d, 0xc9, 0x58,
                0x7c, 0x06,
            ],
            // login.yahoo.com
            [
                0x39, 0x2a, 0x43, 0x4f, 0x0e, 0x07, 0xdf, 0x1f, 0x8a, 0xa3, 0x05, 0xde, 0x34, 0xe0,
                0xc2, 0x29,
            ],
            // login.yahoo.com
            [
                0x3e, 0x75, 0xce, 0xd4, 0x6b, 0x69, 0x30, 0x21, 0x21, 0x88, 0x30, 0xae, 0x86, 0xa8,
                0x2a, 0x71,
            ],
        ],
    },
];

/// Certificates for names under `common_name_suffix` issued before the cutoff
/// are all considered revoked
struct IssuanceCutoff {
    common_name_suffix: &'static str,
    issued_before_unix: u64,
}

const ISSUANCE_CUTOFFS: &[IssuanceCutoff] = &[IssuanceCutoff {
    // Mass revocation after private key exposure, 2014-04-02T00:00:00Z
    common_name_suffix: ".cloudflare.com",
    issued_before_unix: 1_396_396_800,
}];

/// SHA-1 digests of SubjectPublicKeyInfos of compromised CA keys
const REVOKED_SPKI_SHA1: &[[u8; 20]] = &[
    // CN=DigiNotar Root CA
    [
        0x41, 0x0f, 0x36, 0x36, 0x32, 0x58, 0xf3, 0x0b, 0x34, 0x7d, 0x12, 0xce, 0x48, 0x63, 0xe4,
        0x33, 0x43, 0x78, 0x06, 0xa8,
    ],
];

/// A CA key the public hierarchy only trusts for the listed domains
struct ConstrainedKey {
    spki_sha256: [u8; 32],
    permitted_domains: &'static [&'static str],
}

const NAME_CONSTRAINED_KEYS: &[ConstrainedKey] = &[ConstrainedKey {
    // C=FR, ST=France, L=Paris, O=PM/SGDN, OU=DCSSI, CN=IGC/A
    spki_sha256: [
        0x86, 0xc1, 0x3a, 0x34, 0x08, 0xdd, 0x1a, 0xa7, 0x7e, 0xe8, 0xb6, 0x94, 0x7c, 0x03, 0x95,
        0x87, 0x72, 0xf5, 0x31, 0x24, 0x8c, 0x16, 0x27, 0xbe, 0xfb, 0x2c, 0x4f, 0x4b, 0x04, 0xd0,
        0x44, 0x96,
    ],
    permitted_domains: &[
        "fr", "gp", "gf", "mq", "re", "yt", "pm", "bl", "mf", "wf", "pf", "nc", "tf",
    ],
}];

/// A CA key that may only issue for names under the listed domains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameConstrainedKey {
    pub spki_hash: HashValue,
    pub permitted_domains: Vec<String>,
}

/// Deployment-supplied additions to the built-in tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenylistConfig {
    #[serde(default)]
    pub revoked_spkis: Vec<HashValue>,
    #[serde(default)]
    pub name_constrained_keys: Vec<NameConstrainedKey>,
}

/// Immutable denylist consulted by the policy engine
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    extra: DenylistConfig,
}

impl Denylist {
    /// Built-in tables only
    #[must_use]
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Built-in tables extended with `extra`
    #[must_use]
    pub fn with_config(extra: DenylistConfig) -> Self {
        Self { extra }
    }

    /// True if the leaf is denied by serial number or by the issuance cutoff rule
    #[must_use]
    pub fn is_blacklisted(&self, cert: &Certificate) -> bool {
        let info = cert.info();
        is_blocked_serial(info) || is_before_issuance_cutoff(info)
    }

    /// True if any of the chain's key hashes belongs to a compromised key
    #[must_use]
    pub fn is_public_key_blacklisted(&self, hashes: &[HashValue]) -> bool {
        hashes.iter().any(|hash| match hash {
            HashValue::Sha1(digest) => {
                REVOKED_SPKI_SHA1.contains(digest) || self.extra.revoked_spkis.contains(hash)
            }
            HashValue::Sha256(_) => self.extra.revoked_spkis.contains(hash),
        })
    }

    /// True if a name-constrained key in the chain issued for a name outside its domains
    #[must_use]
    pub fn has_name_constraints_violation(
        &self,
        hashes: &[HashValue],
        leaf: &CertificateInfo,
    ) -> bool {
        let builtin = NAME_CONSTRAINED_KEYS
            .iter()
            .filter(|key| hashes.contains(&HashValue::Sha256(key.spki_sha256)))
            .any(|key| super::name_constraints::violates(leaf, key.permitted_domains));
        builtin
            || self
                .extra
                .name_constrained_keys
                .iter()
                .filter(|key| hashes.contains(&key.spki_hash))
                .any(|key| super::name_constraints::violates(leaf, &key.permitted_domains))
    }
}

fn is_blocked_serial(info: &CertificateInfo) -> bool {
    let serial = info.normalized_serial();
    if serial.len() != 16 {
        return false;
    }
    BLOCKED_SERIALS.iter().any(|entry| {
        let issuer_matches = match entry.issuer_common_name {
            None => true,
            Some(expected) => info.issuer_common_name.as_deref() == Some(expected),
        };
        issuer_matches && entry.serials.iter().any(|blocked| blocked.as_slice() == serial)
    })
}

fn is_before_issuance_cutoff(info: &CertificateInfo) -> bool {
    let Some(common_name) = info.subject_common_name.as_deref() else {
        return false;
    };
    let common_name = common_name.to_ascii_lowercase();
    ISSUANCE_CUTOFFS.iter().any(|rule| {
        let cutoff = UNIX_EPOCH + Duration::from_secs(rule.issued_before_unix);
        common_name.len() > rule.common_name_suffix.len()
            && common_name.ends_with(rule.common_name_suffix)
            && info.not_before < cutoff
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::sample_info;

    #[test]
    fn builtin_revoked_key_is_recognised() {
        let denylist = Denylist::builtin();
        assert!(denylist.is_public_key_blacklisted(&[HashValue::Sha1(REVOKED_SPKI_SHA1[0])]));
        assert!(!denylist.is_public_key_blacklisted(&[HashValue::Sha1([0u8; 20])]));
    }

    #[test]
    fn builtin_constrained_key_limits_issuance() {
        let denylist = Denylist::builtin();
        let hashes = [
            HashValue::Sha1([3u8; 20]),
            HashValue::Sha256(NAME_CONSTRAINED_KEYS[0].spki_sha256),
        ];

        let outside = sample_info(&["www.example.com"]);
        assert!(denylist.has_name_constraints_violation(&hashes, &outside));

        let inside = sample_info(&["impots.gouv.fr", "www.service-public.nc"]);
        assert!(!denylist.has_name_constraints_violation(&hashes, &inside));

        let unrelated = [HashValue::Sha256([9u8; 32])];
        assert!(!denylist.has_name_constraints_violation(&unrelated, &outside));
    }

    #[test]
    fn configured_constrained_key_limits_issuance() {
        let hash = HashValue::Sha256([5u8; 32]);
        let denylist = Denylist::with_config(DenylistConfig {
            name_constrained_keys: vec![NameConstrainedKey {
                spki_hash: hash,
                permitted_domains: vec!["example.org".to_owned()],
            }],
            ..DenylistConfig::default()
        });
        assert!(denylist.has_name_constraints_violation(&[hash], &sample_info(&["a.example.com"])));
        assert!(!denylist.has_name_constraints_violation(&[hash], &sample_info(&["a.example.org"])));
    }

    #[test]
    fn configured_revoked_key_is_recognised() {
        let hash = HashValue::Sha256([7u8; 32]);
        let denylist = Denylist::with_config(DenylistConfig {
            revoked_spkis: vec![hash],
            ..DenylistConfig::default()
        });
        assert!(denylist.is_public_key_blacklisted(&[hash]));
    }
}
