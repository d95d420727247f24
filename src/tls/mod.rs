//! Certificate pinning and scoped trust verification.

pub mod pinning;
pub mod trust;

pub use pinning::{spki_hash, Pin, PinSet, SpkiHash};
pub use trust::TrustStore;
