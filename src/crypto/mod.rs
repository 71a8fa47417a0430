//! Cryptographic operations module.
//!
//! This module provides the key material behind issuance:
//!
//! - Key pair generation for EC (P-256), OKP (Ed25519) and RSA keys
//! - Passphrase encryption of private keys using Argon2id and AES-256-GCM
//!
//! # Example
//!
//! ```rust
//! use stepin::cert::profile::KeyType;
//! use stepin::crypto::encryption::{decrypt_key_pem, encrypt_key_pem};
//! use stepin::crypto::keys::generate_key_pair;
//!
//! # fn example() -> stepin::Result<()> {
//! let key = generate_key_pair(KeyType::Okp)?;
//!
//! let encrypted = encrypt_key_pem(&key.pem, "secure-password")?;
//! let decrypted = decrypt_key_pem(&encrypted, "secure-password")?;
//! assert_eq!(*key.pem, *decrypted);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod encryption;
pub mod keys;
pub mod password;
