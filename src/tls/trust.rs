//! Trust scoped to an explicit certificate set.
//!
//! A [`TrustStore`] is built fresh for every client configuration from
//! exactly the certificates the caller supplied; the system trust anchors
//! never participate. Verification answers the Trust-Manager question: is a
//! presented certificate chain acceptable for this configuration?

use crate::error::PinError;
use boring::stack::Stack;
use boring::x509::store::{X509Store, X509StoreBuilder};
use boring::x509::{X509Ref, X509StoreContext, X509};
use tracing::debug;

/// An in-memory trust store holding exactly the supplied certificates.
pub struct TrustStore {
    certs: Vec<X509>,
    store: X509Store,
}

impl TrustStore {
    /// Build a trust store from a non-empty certificate list.
    ///
    /// An empty list is refused outright: a configuration trusting nothing
    /// would reject every handshake while looking well-formed, so the
    /// misconfiguration surfaces here instead.
    pub fn from_certificates(certs: Vec<X509>) -> Result<Self, PinError> {
        if certs.is_empty() {
            return Err(PinError::NoCertificate);
        }
        let store = build_store(&certs)?;
        Ok(Self { certs, store })
    }

    /// The certificates this store trusts.
    pub fn certificates(&self) -> &[X509] {
        &self.certs
    }

    /// Verify a presented certificate against this store.
    ///
    /// Chain building and path validation are BoringSSL's; this store is the
    /// only source of trust anchors, so any chain not terminating in one of
    /// the supplied certificates fails.
    pub fn verify_peer(&self, cert: &X509Ref) -> Result<(), PinError> {
        let chain = Stack::new().map_err(|_| PinError::CryptoProvider)?;
        let mut ctx = X509StoreContext::new().map_err(|_| PinError::CryptoProvider)?;

        let verdict = ctx
            .init(&self.store, cert, &chain, |c| {
                let ok = c.verify_cert()?;
                Ok((ok, c.verify_result()))
            })
            .map_err(|_| PinError::CryptoProvider)?;

        match verdict {
            (true, _) => Ok(()),
            (false, reason) => {
                debug!(reason = ?reason, "peer certificate rejected by pinned trust store");
                Err(PinError::UntrustedCertificate)
            }
        }
    }

    /// Build a fresh `X509Store` over the same certificates.
    ///
    /// `SslContextBuilder::set_cert_store` takes the store by value, so the
    /// connector gets its own copy while this one stays usable for
    /// out-of-band verification.
    pub(crate) fn to_store(&self) -> Result<X509Store, PinError> {
        build_store(&self.certs)
    }
}

fn build_store(certs: &[X509]) -> Result<X509Store, PinError> {
    let mut builder = X509StoreBuilder::new().map_err(|_| PinError::CryptoProvider)?;
    for cert in certs {
        builder
            .add_cert(cert.clone())
            .map_err(|_| PinError::CryptoProvider)?;
    }
    Ok(builder.build())
}
