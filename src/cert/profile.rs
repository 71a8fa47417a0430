//! Certificate profiles and key types.
//!
//! Both are closed sets. Requests carry them as raw strings; parsing happens in
//! the hierarchy validator so unknown values map to their own error variants.

use crate::error::{Result, StepinError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The structural role of a certificate in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "root-ca")]
    RootCa,
    #[serde(rename = "intermediate-ca")]
    IntermediateCa,
    #[serde(rename = "leaf")]
    Leaf,
    #[serde(rename = "self-signed")]
    SelfSigned,
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::RootCa,
        Profile::IntermediateCa,
        Profile::Leaf,
        Profile::SelfSigned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::RootCa => "root-ca",
            Profile::IntermediateCa => "intermediate-ca",
            Profile::Leaf => "leaf",
            Profile::SelfSigned => "self-signed",
        }
    }

    /// Whether certificates of this profile may sign other certificates.
    pub fn is_ca(&self) -> bool {
        match self {
            Profile::RootCa | Profile::IntermediateCa => true,
            Profile::Leaf | Profile::SelfSigned => false,
        }
    }

    /// Whether this profile must be signed by a parent CA.
    pub fn requires_parent(&self) -> bool {
        match self {
            Profile::IntermediateCa | Profile::Leaf => true,
            Profile::RootCa | Profile::SelfSigned => false,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = StepinError;

    fn from_str(s: &str) -> Result<Self> {
        Profile::ALL
            .into_iter()
            .find(|profile| profile.as_str() == s)
            .ok_or_else(|| StepinError::InvalidProfile(s.to_string()))
    }
}

/// Key family of a certificate's key pair.
///
/// Each type maps to exactly one algorithm:
/// - `EC`: ECDSA on P-256 with SHA-256
/// - `OKP`: Ed25519
/// - `RSA`: 2048-bit modulus, PKCS#1 v1.5 with SHA-256
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    #[serde(rename = "EC")]
    Ec,
    #[serde(rename = "OKP")]
    Okp,
    #[serde(rename = "RSA")]
    Rsa,
}

impl KeyType {
    pub const ALL: [KeyType; 3] = [KeyType::Ec, KeyType::Okp, KeyType::Rsa];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Ec => "EC",
            KeyType::Okp => "OKP",
            KeyType::Rsa => "RSA",
        }
    }

    /// The rcgen signature algorithm used by keys of this type.
    pub fn signature_algorithm(&self) -> &'static rcgen::SignatureAlgorithm {
        match self {
            KeyType::Ec => &rcgen::PKCS_ECDSA_P256_SHA256,
            KeyType::Okp => &rcgen::PKCS_ED25519,
            KeyType::Rsa => &rcgen::PKCS_RSA_SHA256,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = StepinError;

    fn from_str(s: &str) -> Result<Self> {
        KeyType::ALL
            .into_iter()
            .find(|key_type| key_type.as_str() == s)
            .ok_or_else(|| StepinError::InvalidKeyType(s.to_string()))
    }
}
