//! Password-based key derivation using PBKDF2-HMAC-SHA256

use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use super::{DerivedKey, Salt};
use crate::error::{CipherError, Result};

/// PBKDF2 iteration count used for every deployment
pub const PBKDF2_ITERATIONS: u32 = 480_000;

/// Derived key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Length of freshly generated salts
pub const SALT_LEN: usize = 32;

/// Shortest salt accepted from storage
pub const MIN_SALT_LEN: usize = 16;

/// Parameters for PBKDF2 key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// Iteration count (default: 480000)
    pub iterations: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> Salt {
    let mut bytes = vec![0u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    Salt::new(bytes)
}

/// Derive a 256-bit key from a password using PBKDF2-HMAC-SHA256
///
/// # Arguments
/// * `password` - The user's password, must not be empty
/// * `salt` - The deployment salt
/// * `params` - Optional key derivation parameters
pub fn derive_key(
    password: &str,
    salt: &Salt,
    params: Option<KeyDerivationParams>,
) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(CipherError::MissingInput("password".to_string()));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(CipherError::InvalidSalt(format!(
            "expected at least {} bytes, got {}",
            MIN_SALT_LEN,
            salt.len()
        )));
    }

    let params = params.unwrap_or_default();
    if params.iterations == 0 {
        return Err(CipherError::KeyDerivationError(
            "iteration count must be positive".to_string(),
        ));
    }

    // Derive straight into the key so no unzeroized copy is left behind
    let mut key = DerivedKey::zeroed();
    pbkdf2::pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        key.as_mut_bytes(),
    );

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Option<KeyDerivationParams> {
        Some(KeyDerivationParams { iterations: 1_000 })
    }

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();

        assert_eq!(salt1.len(), SALT_LEN);
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_default_params() {
        assert_eq!(KeyDerivationParams::default().iterations, 480_000);
    }

    #[test]
    fn test_known_vectors() {
        // PBKDF2-HMAC-SHA256("password", "salt"), 32-byte output. The salt is
        // shorter than MIN_SALT_LEN, so call the primitive directly.
        let mut out = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(b"password", b"salt", 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );

        pbkdf2::pbkdf2_hmac::<Sha256>(b"password", b"salt", 4096, &mut out);
        assert_eq!(
            hex::encode(out),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn test_derive_key_matches_primitive() {
        let salt = Salt::new(vec![9u8; 16]);
        let key = derive_key("hunter22", &salt, fast()).unwrap();

        let mut expected = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(b"hunter22", &[9u8; 16], 1_000, &mut expected);
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let salt = generate_salt();

        let key1 = derive_key("test-password-123", &salt, fast()).unwrap();
        let key2 = derive_key("test-password-123", &salt, fast()).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_passwords() {
        let salt = generate_salt();

        let key1 = derive_key("password1", &salt, fast()).unwrap();
        let key2 = derive_key("password2", &salt, fast()).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salts() {
        let key1 = derive_key("test-password", &generate_salt(), fast()).unwrap();
        let key2 = derive_key("test-password", &generate_salt(), fast()).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_empty_password_rejected() {
        let result = derive_key("", &generate_salt(), fast());
        assert!(matches!(result, Err(CipherError::MissingInput(_))));
    }

    #[test]
    fn test_short_salt_rejected() {
        let result = derive_key("pw", &Salt::new(vec![1u8; 8]), fast());
        assert!(matches!(result, Err(CipherError::InvalidSalt(_))));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let params = Some(KeyDerivationParams { iterations: 0 });
        let result = derive_key("pw", &generate_salt(), params);
        assert!(matches!(result, Err(CipherError::KeyDerivationError(_))));
    }
}
