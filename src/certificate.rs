//! Certificate resolution.
//!
//! Turns raw resources (DER bytes, PEM text, files, readers) into concrete
//! [`X509`] values. Decoding is delegated entirely to BoringSSL; this module
//! only decides which decoder to call and how failures map onto [`PinError`].

use crate::error::PinError;
use boring::x509::X509;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A certificate input queued on the builder, resolved at `build()` time.
#[derive(Clone)]
pub enum CertificateSource {
    /// An already-decoded certificate supplied by the caller.
    Loaded(X509),
    /// A single DER-encoded certificate.
    Der(Vec<u8>),
    /// A single PEM-encoded certificate.
    Pem(Vec<u8>),
    /// A PEM bundle holding one or more certificates.
    PemBundle(Vec<u8>),
    /// A file path; contents are sniffed for PEM vs DER.
    File(PathBuf),
}

impl CertificateSource {
    /// Resolve this source into concrete certificates.
    pub fn resolve(&self) -> Result<Vec<X509>, PinError> {
        match self {
            CertificateSource::Loaded(cert) => Ok(vec![cert.clone()]),
            CertificateSource::Der(der) => from_der(der).map(|c| vec![c]),
            CertificateSource::Pem(pem) => from_pem(pem).map(|c| vec![c]),
            CertificateSource::PemBundle(pem) => from_pem_bundle(pem),
            CertificateSource::File(path) => from_file(path),
        }
    }
}

/// Decode a single DER-encoded certificate.
pub fn from_der(der: &[u8]) -> Result<X509, PinError> {
    X509::from_der(der).map_err(|e| {
        debug!(error = %e, "DER certificate decode failed");
        PinError::CertDecode
    })
}

/// Decode a single PEM-encoded certificate.
pub fn from_pem(pem: &[u8]) -> Result<X509, PinError> {
    X509::from_pem(pem).map_err(|e| {
        debug!(error = %e, "PEM certificate decode failed");
        PinError::CertDecode
    })
}

/// Decode every certificate in a PEM bundle.
///
/// A bundle that parses but contains no certificate is a decode failure:
/// callers must never end up trusting an empty set by accident.
pub fn from_pem_bundle(pem: &[u8]) -> Result<Vec<X509>, PinError> {
    let certs = X509::stack_from_pem(pem).map_err(|e| {
        debug!(error = %e, "PEM bundle decode failed");
        PinError::CertDecode
    })?;
    if certs.is_empty() {
        debug!("PEM bundle contained no certificates");
        return Err(PinError::CertDecode);
    }
    Ok(certs)
}

/// Decode certificates from raw bytes, sniffing PEM vs DER.
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<X509>, PinError> {
    if bytes.trim_ascii_start().starts_with(b"-----BEGIN") {
        from_pem_bundle(bytes)
    } else {
        from_der(bytes).map(|c| vec![c])
    }
}

/// Read a certificate resource from an arbitrary byte stream.
pub fn from_reader<R: Read>(mut reader: R) -> Result<Vec<X509>, PinError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        debug!(error = %e, "certificate resource read failed");
        PinError::ResourceLoad
    })?;
    from_bytes(&bytes)
}

/// Read a certificate resource from a file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<X509>, PinError> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| {
        debug!(path = %path.as_ref().display(), error = %e, "certificate file read failed");
        PinError::ResourceLoad
    })?;
    from_bytes(&bytes)
}
