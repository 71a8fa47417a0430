//! Passphrase-based key derivation using Argon2id.

use crate::error::{Result, StepinError};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

/// The length of the salt used for key derivation.
pub const SALT_LENGTH: usize = 32;

/// The length of the derived key.
pub const KEY_LENGTH: usize = 32;

/// Generate a random salt for key derivation.
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Derive an AES-256 key from a passphrase and salt.
///
/// The derived key is wiped when the returned buffer is dropped.
///
/// # Example
///
/// ```
/// use stepin::crypto::password::{derive_key, generate_salt, KEY_LENGTH};
///
/// let salt = generate_salt();
/// let key = derive_key("secure-passphrase", &salt).unwrap();
/// assert_eq!(key.len(), KEY_LENGTH);
/// ```
pub fn derive_key(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if salt.len() != SALT_LENGTH {
        return Err(StepinError::KeyDerivationError(format!(
            "Salt must be {} bytes, got {}",
            SALT_LENGTH,
            salt.len()
        )));
    }

    let params = Params::new(
        Params::DEFAULT_M_COST,
        Params::DEFAULT_T_COST,
        Params::DEFAULT_P_COST,
        Some(KEY_LENGTH),
    )
    .map_err(|e| StepinError::KeyDerivationError(format!("Invalid Argon2 params: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(password.as_bytes(), salt, output.as_mut())
        .map_err(|e| StepinError::KeyDerivationError(format!("Argon2 error: {}", e)))?;

    Ok(output)
}
