use thiserror::Error;

/// Errors produced while building or using a pinned client configuration.
///
/// Construction-phase variants (`ResourceLoad`, `CertDecode`, `NoCertificate`,
/// `CryptoProvider`) come out of [`build`](crate::client::PinnedClientBuilder::build);
/// the remaining variants are verification and connection outcomes.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum PinError {
    // Construction errors
    #[error("Certificate resource could not be read")]
    ResourceLoad,
    #[error("Bytes do not decode as an X.509 certificate")]
    CertDecode,
    #[error("No certificate resolved; refusing to build a permissive configuration")]
    NoCertificate,
    #[error("Trust store or SSL context construction failed")]
    CryptoProvider,
    #[error("Pin string is malformed")]
    InvalidPin,

    // Verification errors
    #[error("Certificate chain is not trusted by the pinned trust store")]
    UntrustedCertificate,
    #[error("SSL pinned key not in cert chain")]
    PinnedKeyNotInCertChain,

    // Connection errors
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("SSL protocol error")]
    SslProtocolError,
}
