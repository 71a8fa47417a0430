//! Key pair generation and loading for every supported key type.

use crate::cert::profile::KeyType;
use crate::error::{Result, StepinError};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rcgen::KeyPair;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use zeroize::Zeroizing;

/// Modulus size of generated RSA keys.
pub const RSA_KEY_BITS: usize = 2048;

/// A freshly generated key pair together with its PKCS#8 PEM encoding.
pub struct GeneratedKey {
    pub key_pair: KeyPair,
    pub pem: Zeroizing<String>,
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKey")
            .field("algorithm", self.key_pair.algorithm())
            .finish_non_exhaustive()
    }
}

/// Generate a new key pair of the requested type.
///
/// # Example
///
/// ```
/// use stepin::cert::profile::KeyType;
/// use stepin::crypto::keys::generate_key_pair;
///
/// let key = generate_key_pair(KeyType::Ec).unwrap();
/// assert!(key.pem.contains("BEGIN PRIVATE KEY"));
/// ```
pub fn generate_key_pair(key_type: KeyType) -> Result<GeneratedKey> {
    let pem = match key_type {
        KeyType::Ec => {
            let key_pair = KeyPair::generate_for(key_type.signature_algorithm())
                .map_err(|e| StepinError::CryptoError(format!("EC key generation failed: {}", e)))?;
            return Ok(GeneratedKey {
                pem: Zeroizing::new(key_pair.serialize_pem()),
                key_pair,
            });
        }
        KeyType::Okp => {
            let signing_key = SigningKey::generate(&mut OsRng);
            ed25519_dalek::pkcs8::EncodePrivateKey::to_pkcs8_pem(
                &signing_key,
                LineEnding::LF,
            )
            .map_err(|e| StepinError::CryptoError(format!("Ed25519 key encoding failed: {}", e)))?
        }
        KeyType::Rsa => {
            let private_key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_BITS)
                .map_err(|e| StepinError::CryptoError(format!("RSA key generation failed: {}", e)))?;
            private_key
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| StepinError::CryptoError(format!("RSA key encoding failed: {}", e)))?
        }
    };

    let key_pair = load_key_pair(&pem, key_type)?;
    Ok(GeneratedKey { key_pair, pem })
}

/// Load a PKCS#8 PEM private key of a known type.
pub fn load_key_pair(pem: &str, key_type: KeyType) -> Result<KeyPair> {
    KeyPair::from_pem_and_sign_algo(pem, key_type.signature_algorithm()).map_err(|e| {
        StepinError::CryptoError(format!("Failed to load {} private key: {}", key_type, e))
    })
}
