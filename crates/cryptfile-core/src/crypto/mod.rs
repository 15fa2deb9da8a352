//! Cryptographic primitives for password-protected files
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation from passwords
//! - AES-256-GCM envelope encryption
//! - Zeroize-on-drop key material

mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{open, seal, ENVELOPE_VERSION, MIN_ENVELOPE_LEN, NONCE_LEN, TAG_LEN};
pub use key_derivation::{
    derive_key, generate_salt, KeyDerivationParams, KEY_LEN, MIN_SALT_LEN, PBKDF2_ITERATIONS,
    SALT_LEN,
};
pub use secure_memory::{DerivedKey, Salt};
