//! Error types for stepin.
//!
//! The first block of variants is the issuance taxonomy: validation failures
//! are detected before any key material is generated and are always fixable
//! by resubmitting corrected input. `SigningFailed` and `PersistenceFailed`
//! abort the current request without leaving a partial record behind.

use thiserror::Error;

/// The main error type for stepin operations.
#[derive(Error, Debug)]
pub enum StepinError {
    /// The requested profile is not one of the recognized values
    #[error("Invalid certificate profile: {0}")]
    InvalidProfile(String),

    /// A leaf or intermediate CA was requested without a parent CA
    #[error("Parent CA is required for {0} certificates")]
    MissingParent(String),

    /// A root CA or self-signed certificate was requested with a parent CA
    #[error("Parent CA is not allowed for {0} certificates")]
    UnexpectedParent(String),

    /// The referenced parent cannot sign certificates
    #[error("Invalid parent CA: {0}")]
    InvalidParent(String),

    /// The parent CA key is encrypted and the supplied password is missing or wrong
    #[error("Failed to decrypt parent CA private key")]
    ParentDecryptionFailed,

    /// Validity span outside of the allowed range
    #[error("Invalid validity span: {0} years (expected 1 to 20)")]
    InvalidValiditySpan(i64),

    /// The requested key type is not one of the recognized values
    #[error("Invalid key type: {0}")]
    InvalidKeyType(String),

    /// The subject name is empty
    #[error("Subject name is required")]
    InvalidName,

    /// Building or signing the certificate failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The record store could not persist a certificate
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// A recovery export cannot be merged into the store
    #[error("Invalid recovery import: {0}")]
    InvalidImport(String),

    /// The requested material is never handed out
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown download type
    #[error("Invalid download type: {0}")]
    InvalidDownloadType(String),

    /// Cryptographic operation failed
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Key derivation failed
    #[error("Key derivation error: {0}")]
    KeyDerivationError(String),

    /// Encryption or decryption failed
    #[error("Encryption/decryption error: {0}")]
    EncryptionError(String),

    /// Invalid password
    #[error("Invalid password")]
    InvalidPasswordError,

    /// PEM encoding/decoding error
    #[error("PEM error: {0}")]
    PemError(String),

    /// Certificate parsing error
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Storage I/O error
    #[error("Storage I/O error: {0}")]
    StorageError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StepinError {
    /// Whether the error belongs to the validation category.
    ///
    /// Validation errors are raised before any cryptographic work starts.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StepinError::InvalidProfile(_)
                | StepinError::MissingParent(_)
                | StepinError::UnexpectedParent(_)
                | StepinError::InvalidParent(_)
                | StepinError::ParentDecryptionFailed
                | StepinError::InvalidValiditySpan(_)
                | StepinError::InvalidKeyType(_)
                | StepinError::InvalidName
        )
    }
}

/// A specialized Result type for stepin operations.
pub type Result<T> = std::result::Result<T, StepinError>;
