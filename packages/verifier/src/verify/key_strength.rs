//! Public key size checks across a verified chain

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cert::{CertificateChain, KeyType};

/// Minimum acceptable size for RSA and DSA keys
pub const MIN_RSA_DSA_BITS: u32 = 1024;

/// CA/Browser Forum Baseline Requirements effective date, 2012-07-01
const BASELINE_EFFECTIVE_UNIX: u64 = 1_341_100_800;
/// Baseline key-size requirements effective date, 2014-01-01
const BASELINE_KEYSIZE_EFFECTIVE_UNIX: u64 = 1_388_534_400;

/// Where in the chain a key sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPosition {
    EndEntity,
    Intermediate,
    Root,
}

impl KeyPosition {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KeyPosition::EndEntity => "EE",
            KeyPosition::Intermediate => "Intermediate",
            KeyPosition::Root => "Root",
        }
    }
}

/// One observed key size, as fed to the key-size histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySample {
    pub position: KeyPosition,
    pub key_type: KeyType,
    pub size_bits: u32,
    /// Leaf was issued under the baseline key-size rules
    pub baseline_applies: bool,
}

/// RSA and DSA keys under 1024 bits are weak. Other key types are
/// never classified weak by size.
#[must_use]
pub fn is_weak_key(key_type: KeyType, size_bits: u32) -> bool {
    match key_type {
        KeyType::Rsa | KeyType::Dsa => size_bits < MIN_RSA_DSA_BITS,
        _ => false,
    }
}

/// Examine every key in `chain`, handing a sample for each to `record`.
/// Returns true if any key is weak.
pub fn examine_chain(chain: &CertificateChain, mut record: impl FnMut(KeySample)) -> bool {
    let leaf = chain.leaf().info();
    let baseline_applies = leaf.not_before >= at(BASELINE_EFFECTIVE_UNIX)
        && leaf.not_after >= at(BASELINE_KEYSIZE_EFFECTIVE_UNIX);
    let last = chain.len() - 1;

    let mut weak = false;
    for (index, cert) in chain.iter().enumerate() {
        let position = match index {
            0 => KeyPosition::EndEntity,
            i if i == last => KeyPosition::Root,
            _ => KeyPosition::Intermediate,
        };
        let key = &cert.info().public_key;
        record(KeySample {
            position,
            key_type: key.key_type,
            size_bits: key.size_bits,
            baseline_applies,
        });
        weak |= is_weak_key(key.key_type, key.size_bits);
    }
    weak
}

fn at(unix: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(unix)
}
