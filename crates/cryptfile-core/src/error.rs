//! Error types for cryptfile-core

use thiserror::Error;

/// Result type alias for cipher operations
pub type Result<T> = std::result::Result<T, CipherError>;

/// Cipher error types
#[derive(Error, Debug)]
pub enum CipherError {
    /// Tag verification failed. Wrong password, corrupted envelope and wrong
    /// salt are deliberately indistinguishable.
    #[error("Authentication failed - the file could not be decrypted")]
    Authentication,

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid action: {0} (expected \"encrypt\" or \"decrypt\")")]
    InvalidAction(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("Invalid salt: {0}")]
    InvalidSalt(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CipherError {
    /// Whether the error was caused by the caller rather than the deployment
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CipherError::Authentication
                | CipherError::MissingInput(_)
                | CipherError::InvalidAction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_message_is_generic() {
        let msg = CipherError::Authentication.to_string();
        assert!(!msg.to_lowercase().contains("password"));
        assert!(!msg.to_lowercase().contains("corrupt"));
    }

    #[test]
    fn test_client_errors() {
        assert!(CipherError::Authentication.is_client_error());
        assert!(CipherError::MissingInput("password".into()).is_client_error());
        assert!(!CipherError::StorageError("disk full".into()).is_client_error());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!CipherError::from(io).is_client_error());
    }
}
