//! Key material with automatic zeroization

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key derived from a password and the deployment salt - zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; 32],
}

impl DerivedKey {
    /// Create a new derived key from raw bytes
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// All-zero key, filled in place by the KDF
    pub(crate) fn zeroed() -> Self {
        Self { key: [0u8; 32] }
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; 32] {
        &mut self.key
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Deployment salt. Not secret, but kept out of logs all the same.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt {
    bytes: Vec<u8>,
}

impl Salt {
    /// Wrap raw salt bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Salt").field("len", &self.bytes.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_key_debug_redacted() {
        let key = DerivedKey::new([7u8; 32]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains('7'));
    }

    #[test]
    fn test_derived_key_zeroize() {
        let mut key = DerivedKey::zeroed();
        key.as_mut_bytes().fill(0xAA);
        assert_eq!(key.as_bytes(), &[0xAA; 32]);

        key.zeroize();
        assert_eq!(key.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_salt_debug_shows_length_only() {
        let salt = Salt::new(vec![0xAB; 32]);
        let debug = format!("{:?}", salt);
        assert_eq!(debug, "Salt { len: 32 }");
    }
}
