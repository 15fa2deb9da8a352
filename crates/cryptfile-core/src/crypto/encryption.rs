//! AES-256-GCM envelope encryption
//!
//! Envelope format: `{version}{nonce}{ciphertext}{auth_tag}`
//! - Version: 1 byte, currently `0x01`
//! - Nonce: 12 bytes (96 bits), fresh for every envelope
//! - Ciphertext: same length as the plaintext
//! - Auth tag: 16 bytes (128 bits)

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::DerivedKey;
use crate::error::{CipherError, Result};

/// Current envelope format version
pub const ENVELOPE_VERSION: u8 = 1;

/// GCM nonce length
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Smallest well-formed envelope (empty plaintext)
pub const MIN_ENVELOPE_LEN: usize = 1 + NONCE_LEN + TAG_LEN;

/// Seal plaintext into a self-describing envelope
pub fn seal(plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CipherError::EncryptionError(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext_with_tag = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CipherError::EncryptionError(e.to_string()))?;

    let mut envelope = Vec::with_capacity(1 + NONCE_LEN + ciphertext_with_tag.len());
    envelope.push(ENVELOPE_VERSION);
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext_with_tag);

    Ok(envelope)
}

/// Open an envelope produced by [`seal`]
///
/// Every failure, including a malformed header, is reported as
/// [`CipherError::Authentication`].
pub fn open(envelope: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    if envelope.len() < MIN_ENVELOPE_LEN || envelope[0] != ENVELOPE_VERSION {
        return Err(CipherError::Authentication);
    }

    let (nonce_bytes, ciphertext_with_tag) = envelope[1..].split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CipherError::Authentication)?;

    cipher
        .decrypt(nonce, ciphertext_with_tag)
        .map_err(|_| CipherError::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(byte: u8) -> DerivedKey {
        DerivedKey::new([byte; 32])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = test_key(42);
        let plaintext = b"Hello, World!";

        let envelope = seal(plaintext, &key).unwrap();
        let opened = open(&envelope, &key).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_envelope_layout() {
        let key = test_key(42);
        let plaintext = b"layout check";

        let envelope = seal(plaintext, &key).unwrap();

        assert_eq!(envelope[0], ENVELOPE_VERSION);
        assert_eq!(envelope.len(), MIN_ENVELOPE_LEN + plaintext.len());
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key(1);

        let envelope = seal(b"", &key).unwrap();
        assert_eq!(envelope.len(), MIN_ENVELOPE_LEN);
        assert!(open(&envelope, &key).unwrap().is_empty());
    }

    #[test]
    fn test_different_nonces_produce_different_envelopes() {
        let key = test_key(42);
        let plaintext = b"same plaintext";

        let envelope1 = seal(plaintext, &key).unwrap();
        let envelope2 = seal(plaintext, &key).unwrap();

        assert_ne!(envelope1[1..1 + NONCE_LEN], envelope2[1..1 + NONCE_LEN]);
        assert_ne!(envelope1, envelope2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let envelope = seal(b"secret data", &test_key(1)).unwrap();
        let result = open(&envelope, &test_key(2));

        assert!(matches!(result, Err(CipherError::Authentication)));
    }

    #[test]
    fn test_every_bit_flip_detected() {
        let key = test_key(5);
        let envelope = seal(b"tamper", &key).unwrap();

        for byte in 0..envelope.len() {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    matches!(open(&tampered, &key), Err(CipherError::Authentication)),
                    "flip at byte {} bit {} went undetected",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_truncated_envelope_fails() {
        let key = test_key(3);
        let envelope = seal(b"some bytes", &key).unwrap();

        assert!(matches!(open(&[], &key), Err(CipherError::Authentication)));
        assert!(matches!(
            open(&envelope[..MIN_ENVELOPE_LEN - 1], &key),
            Err(CipherError::Authentication)
        ));
        assert!(matches!(
            open(&envelope[..envelope.len() - 1], &key),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_unknown_version_fails() {
        let key = test_key(3);
        let mut envelope = seal(b"v", &key).unwrap();
        envelope[0] = 2;

        assert!(matches!(open(&envelope, &key), Err(CipherError::Authentication)));
    }
}
