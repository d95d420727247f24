//! # sslpin
//!
//! TLS certificate pinning for HTTP clients.
//!
//! `sslpin` builds client configurations that trust exactly the certificates
//! you supply and additionally enforce an SPKI (Subject Public Key Info)
//! SHA-256 pin of each certificate for one endpoint host. The system trust
//! anchors never participate: a handshake succeeds only if the peer chains to
//! a supplied certificate, and for a pinned host only if a pinned public key
//! appears in the presented chain.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sslpin::PinnedClientBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sslpin::PinError> {
//!     let config = PinnedClientBuilder::new()
//!         .certificate_file("certs/api.pem")
//!         .endpoint("api.example.com")
//!         .build()?;
//!
//!     let tls = config.connect("api.example.com", 443).await?;
//!     // hand `tls` to your HTTP layer
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`certificate`] - certificate resolution from DER/PEM bytes and files
//! - [`client`] - the pinned-client builder and resulting configuration
//! - [`error`] - the crate-wide error type
//! - [`tls`] - pin computation, pin sets, and scoped trust verification
//!
//! ## Security
//!
//! - Pins use the `sha256/<base64>` convention and interoperate bit-exact
//!   with OkHttp/HPKP pin strings
//! - Fail-closed: a configuration that resolves no certificate is refused
//!   at build time rather than silently trusting nothing (or everything)
//! - Each build yields an independent configuration; no state is shared
//!   across invocations

pub mod certificate;
pub mod client;
pub mod error;
pub mod tls;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{ClientConfig, PinnedClientBuilder, SslPinner};
pub use error::PinError;
pub use tls::pinning::{spki_hash, Pin, PinSet, SpkiHash};
