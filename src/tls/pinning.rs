//! Certificate pinning for MITM prevention.
//!
//! Validates server certificates against expected SPKI (Subject Public Key
//! Info) SHA-256 hashes. Pins use the HPKP/OkHttp string convention,
//! `sha256/<base64-digest>`, so existing pin strings interoperate bit-exact.
//!
//! Pinning is additive to trust-store verification: a host with no pin
//! bindings passes this layer, while a host with bindings must present at
//! least one matching key anywhere in its chain.

use crate::error::PinError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use boring::hash::{hash, MessageDigest};
use boring::x509::X509Ref;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// SHA-256 hash of a certificate's SPKI (Subject Public Key Info).
pub type SpkiHash = [u8; 32];

const PIN_PREFIX: &str = "sha256/";

/// Compute the SPKI hash of a certificate.
///
/// SHA-256 over the DER-encoded SubjectPublicKeyInfo, the same value OkHttp's
/// `CertificatePinner.pin()` and HPKP headers encode.
pub fn spki_hash(cert: &X509Ref) -> Result<SpkiHash, PinError> {
    let pubkey = cert.public_key().map_err(|_| PinError::CryptoProvider)?;
    let spki_der = pubkey
        .public_key_to_der()
        .map_err(|_| PinError::CryptoProvider)?;

    let digest = hash(MessageDigest::sha256(), &spki_der).map_err(|_| PinError::CryptoProvider)?;

    let mut result = [0u8; 32];
    result.copy_from_slice(&digest);
    Ok(result)
}

/// A single pin: the SPKI SHA-256 digest of one certificate's public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pin(SpkiHash);

impl Pin {
    /// Pin a certificate's public key.
    pub fn from_certificate(cert: &X509Ref) -> Result<Self, PinError> {
        spki_hash(cert).map(Pin)
    }

    /// Build a pin from a raw digest.
    pub fn from_digest(digest: SpkiHash) -> Self {
        Pin(digest)
    }

    /// Parse the base64 digest portion of a pin (no `sha256/` prefix).
    pub fn from_base64(b64: &str) -> Result<Self, PinError> {
        let decoded = BASE64.decode(b64).map_err(|_| PinError::InvalidPin)?;
        if decoded.len() != 32 {
            return Err(PinError::InvalidPin);
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&decoded);
        Ok(Pin(digest))
    }

    /// The raw digest.
    pub fn digest(&self) -> &SpkiHash {
        &self.0
    }

    /// Whether a presented SPKI hash matches this pin.
    pub fn matches(&self, hash: &SpkiHash) -> bool {
        &self.0 == hash
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PIN_PREFIX, BASE64.encode(self.0))
    }
}

impl FromStr for Pin {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b64 = s.strip_prefix(PIN_PREFIX).ok_or(PinError::InvalidPin)?;
        Pin::from_base64(b64)
    }
}

/// Pin bindings for a configuration: hostname → allowed public keys.
///
/// Built once per configuration and read-only afterwards. Host comparison is
/// case-insensitive; matching is any-pin-matches per host.
#[derive(Debug, Clone, Default)]
pub struct PinSet {
    pins: HashMap<String, Vec<Pin>>,
}

impl PinSet {
    /// Create an empty pin set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a pin to a host. Multiple pins per host accumulate.
    pub fn add(&mut self, host: &str, pin: Pin) {
        self.pins
            .entry(host.to_ascii_lowercase())
            .or_default()
            .push(pin);
    }

    /// Pins bound to a host, empty if none.
    pub fn pins_for(&self, host: &str) -> &[Pin] {
        self.pins
            .get(&host.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check a presented chain's SPKI hashes against the pins for `host`.
    ///
    /// Hosts without bindings pass; hosts with bindings require at least one
    /// hash anywhere in the chain to match one pin.
    pub fn check(&self, host: &str, chain_hashes: &[SpkiHash]) -> Result<(), PinError> {
        let pins = self.pins_for(host);
        if pins.is_empty() {
            return Ok(());
        }
        for hash in chain_hashes {
            if pins.iter().any(|p| p.matches(hash)) {
                return Ok(());
            }
        }
        Err(PinError::PinnedKeyNotInCertChain)
    }

    /// Number of hosts with bindings.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Whether any bindings exist.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
