//! stepin: certificate hierarchy and issuance engine
//!
//! This library issues X.509 certificates arranged in a trust hierarchy of
//! root CAs, intermediate CAs and leaf certificates. It enables users to:
//!
//! - Create root CAs, intermediate CAs, leaf and self-signed certificates
//! - Choose EC (P-256), OKP (Ed25519) or RSA keys per certificate
//! - Protect private keys with a passphrase (Argon2id + AES-256-GCM)
//! - Keep records in memory or in a JSON file, optionally sealed at rest
//! - Download certificates, end-entity keys and chain bundles
//!
//! # Architecture
//!
//! A request passes the hierarchy validator, which checks profile, parent
//! and passphrase rules without writing anything. The issuer then generates
//! the key, signs the certificate (self or parent), encrypts the new key if
//! requested, renders an inspection summary and persists the record through
//! a [`storage::CertificateStore`].
//!
//! # Example
//!
//! ```rust
//! use stepin::cert::issuer::CertificateIssuer;
//! use stepin::cert::request::IssueRequest;
//! use stepin::storage::MemoryStore;
//!
//! fn example() -> stepin::Result<()> {
//!     let issuer = CertificateIssuer::new(MemoryStore::new());
//!
//!     let root = issuer.issue(
//!         &IssueRequest::new("root-ca", "Example Root", 10, "EC").with_pass("root-secret"),
//!     )?;
//!     let intermediate = issuer.issue(
//!         &IssueRequest::new("intermediate-ca", "Example Issuing CA", 5, "EC")
//!             .with_parent(root.id, Some("root-secret")),
//!     )?;
//!     let leaf = issuer.issue(
//!         &IssueRequest::new("leaf", "api.example.com", 1, "OKP").with_parent(intermediate.id, None),
//!     )?;
//!     println!("{}", leaf.inspection);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod cert;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

// Re-export commonly used types
pub use error::{Result, StepinError};
