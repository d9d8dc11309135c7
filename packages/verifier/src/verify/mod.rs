//! Chain verification: status model, policy overlays and the engine that
//! applies them

pub mod denylist;
pub mod flags;
pub mod hostname;
pub mod key_strength;
pub(crate) mod name_constraints;
pub mod policy;
pub mod result;
pub mod status;
pub mod validity;

pub use denylist::{Denylist, DenylistConfig, NameConstrainedKey};
pub use flags::VerifyFlags;
pub use key_strength::{KeyPosition, KeySample, is_weak_key};
pub use policy::PolicyEngine;
pub use result::{VerifyOutcome, VerifyResult};
pub use status::CertStatus;
