//! Pinned client configuration with builder pattern.
//!
//! The output of this module is a [`ClientConfig`]: an HTTP client
//! configuration whose TLS layer trusts exactly the certificates the caller
//! supplied and, when an endpoint host is given, additionally enforces an
//! SPKI pin of each certificate for that host.
//!
//! # Example
//!
//! ```rust,ignore
//! use sslpin::PinnedClientBuilder;
//!
//! let config = PinnedClientBuilder::new()
//!     .certificate_file("certs/api.pem")
//!     .endpoint("api.example.com")
//!     .build()?;
//!
//! let tls = config.connect("api.example.com", 443).await?;
//! ```

use crate::certificate::CertificateSource;
use crate::error::PinError;
use crate::tls::pinning::{spki_hash, Pin, PinSet, SpkiHash};
use crate::tls::trust::TrustStore;
use boring::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};
use boring::x509::{X509Ref, X509};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_boring::SslStream;
use tracing::{debug, warn};

/// Connect and read timeout applied to every built configuration.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for a [`ClientConfig`].
///
/// Certificate sources queue up unresolved; decoding and trust-store
/// construction happen in [`build`](Self::build), so every failure surfaces
/// through the one `Result` there.
#[derive(Default)]
pub struct PinnedClientBuilder {
    sources: Vec<CertificateSource>,
    endpoint: Option<String>,
}

impl PinnedClientBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an already-decoded certificate.
    pub fn certificate(mut self, cert: X509) -> Self {
        self.sources.push(CertificateSource::Loaded(cert));
        self
    }

    /// Add a DER-encoded certificate.
    pub fn certificate_der(mut self, der: impl Into<Vec<u8>>) -> Self {
        self.sources.push(CertificateSource::Der(der.into()));
        self
    }

    /// Add a PEM-encoded certificate.
    pub fn certificate_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.sources.push(CertificateSource::Pem(pem.into()));
        self
    }

    /// Add every certificate from a PEM bundle.
    pub fn pem_bundle(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.sources.push(CertificateSource::PemBundle(pem.into()));
        self
    }

    /// Add certificates from a file (PEM or DER, sniffed).
    pub fn certificate_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(CertificateSource::File(path.into()));
        self
    }

    /// Host the pins bind to. Without an endpoint no pins are produced and
    /// only trust-store verification applies.
    pub fn endpoint(mut self, host: impl Into<String>) -> Self {
        self.endpoint = Some(host.into());
        self
    }

    /// Resolve sources, build the scoped trust store and socket factory, and
    /// bind one pin per certificate to the endpoint if one was set.
    pub fn build(self) -> Result<ClientConfig, PinError> {
        let mut certs = Vec::new();
        for source in &self.sources {
            certs.extend(source.resolve()?);
        }

        let trust = TrustStore::from_certificates(certs)?;
        let connector = build_connector(&trust)?;

        let mut pins = PinSet::new();
        if let Some(host) = &self.endpoint {
            for cert in trust.certificates() {
                pins.add(host, Pin::from_certificate(cert)?);
            }
        }

        Ok(ClientConfig {
            connector,
            trust,
            pins,
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
        })
    }
}

/// Derive the secure-socket factory: a TLS 1.2+ connector verifying peers
/// against the scoped trust store, with no client-side key material.
fn build_connector(trust: &TrustStore) -> Result<SslConnector, PinError> {
    let mut builder =
        SslConnector::builder(SslMethod::tls()).map_err(|_| PinError::CryptoProvider)?;
    builder
        .set_min_proto_version(Some(SslVersion::TLS1_2))
        .map_err(|_| PinError::CryptoProvider)?;
    builder.set_cert_store(trust.to_store()?);
    builder.set_verify(SslVerifyMode::PEER);
    Ok(builder.build())
}

/// A ready-to-use pinned client configuration.
///
/// Carries the socket factory, the scoped trust store, the pin bindings, and
/// fixed 30s connect/read timeouts. Each `build` produces an independent
/// configuration; nothing is shared between them.
pub struct ClientConfig {
    connector: SslConnector,
    trust: TrustStore,
    pins: PinSet,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl ClientConfig {
    /// The pin bindings (empty when no endpoint was given).
    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    /// The configured connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// The configured read timeout, for the embedding client to apply to
    /// its request I/O.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// The TLS socket factory, for callers wiring their own transport.
    pub fn connector(&self) -> &SslConnector {
        &self.connector
    }

    /// Trust-Manager decision: is this peer certificate acceptable?
    pub fn verify_peer(&self, cert: &X509Ref) -> Result<(), PinError> {
        self.trust.verify_peer(cert)
    }

    /// Pin decision: does this certificate's public key match a pin bound to
    /// `host`? Hosts without bindings pass, the pin layer is additive.
    pub fn check_pin(&self, host: &str, cert: &X509Ref) -> Result<(), PinError> {
        let hash = spki_hash(cert)?;
        self.pins.check(host, &[hash])
    }

    /// Finalize the configuration into a live pinned TLS stream.
    ///
    /// TCP connect runs under the connect timeout, the handshake verifies the
    /// peer against the scoped trust store, and the presented chain is then
    /// checked against the pins for `host`. A pin miss drops the connection.
    pub async fn connect(&self, host: &str, port: u16) -> Result<SslStream<TcpStream>, PinError> {
        let tcp = tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| PinError::ConnectionTimedOut)?
            .map_err(|e| {
                debug!(host, port, error = %e, "TCP connect failed");
                PinError::ConnectionFailed
            })?;

        let config = self
            .connector
            .configure()
            .map_err(|_| PinError::CryptoProvider)?;

        let stream = tokio_boring::connect(config, host, tcp).await.map_err(|e| {
            debug!(host, error = ?e, "TLS handshake failed");
            PinError::SslProtocolError
        })?;

        self.pins.check(host, &peer_chain_hashes(&stream)?)?;

        Ok(stream)
    }
}

/// SPKI hashes of every certificate the peer presented.
fn peer_chain_hashes(stream: &SslStream<TcpStream>) -> Result<Vec<SpkiHash>, PinError> {
    let ssl = stream.ssl();
    let mut hashes = Vec::new();

    if let Some(chain) = ssl.peer_cert_chain() {
        for cert in chain {
            hashes.push(spki_hash(cert)?);
        }
    }
    if hashes.is_empty() {
        let leaf = ssl.peer_certificate().ok_or(PinError::SslProtocolError)?;
        hashes.push(spki_hash(&leaf)?);
    }

    Ok(hashes)
}

/// Convenience front preserving the collapsed-error contract: any failure is
/// logged and surfaced as `None`, never an error the caller must destructure.
pub struct SslPinner;

impl SslPinner {
    /// Build a pinned configuration from a certificate, or `None` on any
    /// failure.
    pub fn pinned_client(certificate: X509, endpoint: &str) -> Option<ClientConfig> {
        Self::collapse(
            PinnedClientBuilder::new()
                .certificate(certificate)
                .endpoint(endpoint)
                .build(),
        )
    }

    /// Build a pinned configuration from a certificate resource on disk, or
    /// `None` on any failure (unreadable file, undecodable bytes, ...).
    pub fn pinned_client_from_file(
        path: impl Into<PathBuf>,
        endpoint: &str,
    ) -> Option<ClientConfig> {
        Self::collapse(
            PinnedClientBuilder::new()
                .certificate_file(path)
                .endpoint(endpoint)
                .build(),
        )
    }

    fn collapse(result: Result<ClientConfig, PinError>) -> Option<ClientConfig> {
        match result {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(error = %e, "pinned client construction failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self_signed, self_signed_for_localhost};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use boring::hash::{hash, MessageDigest};
    use boring::pkey::PKey;
    use boring::ssl::{SslAcceptor, SslMethod};
    use tokio::net::TcpListener;

    fn pinned(cert: &X509, endpoint: &str) -> ClientConfig {
        PinnedClientBuilder::new()
            .certificate(cert.clone())
            .endpoint(endpoint)
            .build()
            .unwrap()
    }

    fn expected_pin_string(cert: &X509) -> String {
        let spki = cert.public_key().unwrap().public_key_to_der().unwrap();
        let digest = hash(MessageDigest::sha256(), &spki).unwrap();
        format!("sha256/{}", BASE64.encode(&digest[..]))
    }

    #[test]
    fn test_trusts_exactly_the_supplied_certificate() {
        let (_key, cert) = self_signed("api.example.com");
        let (_key2, other) = self_signed("evil.example.com");
        let config = pinned(&cert, "api.example.com");

        assert!(config.verify_peer(&cert).is_ok());
        assert!(matches!(
            config.verify_peer(&other),
            Err(PinError::UntrustedCertificate)
        ));
    }

    #[test]
    fn test_one_pin_binding_with_expected_digest() {
        let (_key, cert) = self_signed("api.example.com");
        let config = pinned(&cert, "api.example.com");

        let pins = config.pins().pins_for("api.example.com");
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].to_string(), expected_pin_string(&cert));
    }

    #[test]
    fn test_no_endpoint_means_no_pins() {
        let (_key, cert) = self_signed("api.example.com");
        let config = PinnedClientBuilder::new()
            .certificate(cert.clone())
            .build()
            .unwrap();

        assert!(config.pins().is_empty());
        assert!(config.verify_peer(&cert).is_ok());
        // Pin layer passes everywhere when unbound; trust still decides.
        assert!(config.check_pin("api.example.com", &cert).is_ok());
    }

    #[test]
    fn test_no_certificate_fails_build() {
        assert!(matches!(
            PinnedClientBuilder::new().endpoint("api.example.com").build(),
            Err(PinError::NoCertificate)
        ));
    }

    #[test]
    fn test_undecodable_certificate_fails_build() {
        assert!(matches!(
            PinnedClientBuilder::new()
                .certificate_der(b"garbage".to_vec())
                .endpoint("api.example.com")
                .build(),
            Err(PinError::CertDecode)
        ));
    }

    #[test]
    fn test_multiple_certificates_multiple_pins() {
        let (_k1, c1) = self_signed("one.example.com");
        let (_k2, c2) = self_signed("two.example.com");
        let config = PinnedClientBuilder::new()
            .certificate(c1.clone())
            .certificate(c2.clone())
            .endpoint("api.example.com")
            .build()
            .unwrap();

        assert!(config.verify_peer(&c1).is_ok());
        assert!(config.verify_peer(&c2).is_ok());
        assert_eq!(config.pins().pins_for("api.example.com").len(), 2);
        assert!(config.check_pin("api.example.com", &c1).is_ok());
        assert!(config.check_pin("api.example.com", &c2).is_ok());
    }

    #[test]
    fn test_pin_rejects_foreign_key_for_bound_host() {
        let (_key, cert) = self_signed("api.example.com");
        let (_key2, other) = self_signed("other.example.com");
        let config = pinned(&cert, "api.example.com");

        assert!(matches!(
            config.check_pin("api.example.com", &other),
            Err(PinError::PinnedKeyNotInCertChain)
        ));
        // Unbound host passes regardless of key.
        assert!(config.check_pin("elsewhere.example.com", &other).is_ok());
    }

    #[test]
    fn test_build_is_idempotent() {
        let (_key, cert) = self_signed("api.example.com");
        let a = pinned(&cert, "api.example.com");
        let b = pinned(&cert, "api.example.com");

        assert_eq!(
            a.pins().pins_for("api.example.com"),
            b.pins().pins_for("api.example.com")
        );
        assert!(a.verify_peer(&cert).is_ok());
        assert!(b.verify_peer(&cert).is_ok());
    }

    #[test]
    fn test_timeouts_are_thirty_seconds() {
        let (_key, cert) = self_signed("api.example.com");
        let config = pinned(&cert, "api.example.com");
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.read_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_ssl_pinner_collapses_failures_to_none() {
        assert!(SslPinner::pinned_client_from_file(
            "/nonexistent/cert.pem",
            "api.example.com"
        )
        .is_none());
    }

    #[test]
    fn test_ssl_pinner_success() {
        let (_key, cert) = self_signed("api.example.com");
        let config = SslPinner::pinned_client(cert, "api.example.com").unwrap();
        assert_eq!(config.pins().pins_for("api.example.com").len(), 1);
    }

    async fn spawn_tls_server(cert: X509, key: PKey<boring::pkey::Private>) -> std::net::SocketAddr {
        let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
        acceptor.set_private_key(&key).unwrap();
        acceptor.set_certificate(&cert).unwrap();
        let acceptor = acceptor.build();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                let _ = tokio_boring::accept(&acceptor, stream).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_connect_accepts_pinned_server() {
        let (key, cert) = self_signed_for_localhost();
        let addr = spawn_tls_server(cert.clone(), key).await;

        let config = pinned(&cert, "127.0.0.1");
        let stream = config.connect("127.0.0.1", addr.port()).await.unwrap();
        assert!(stream.ssl().peer_certificate().is_some());
    }

    #[tokio::test]
    async fn test_connect_rejects_untrusted_server() {
        let (server_key, server_cert) = self_signed_for_localhost();
        let addr = spawn_tls_server(server_cert, server_key).await;

        // Client trusts a different certificate entirely.
        let (_key, trusted) = self_signed("api.example.com");
        let config = pinned(&trusted, "127.0.0.1");
        assert!(matches!(
            config.connect("127.0.0.1", addr.port()).await,
            Err(PinError::SslProtocolError)
        ));
    }
}
