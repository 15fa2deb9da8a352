//! # cryptfile-core
//!
//! Core functionality for cryptfile including:
//! - PBKDF2-HMAC-SHA256 key derivation from a password and a deployment salt
//! - AES-256-GCM envelope encryption of whole files
//! - Salt persistence with race-free create-if-absent semantics
//! - Operational settings (request and upload limits)

pub mod cipher;
pub mod crypto;
pub mod error;
pub mod settings;
pub mod storage;

pub use cipher::{CryptAction, PasswordFileCipher};
pub use crypto::{derive_key, generate_salt, open, seal, DerivedKey, KeyDerivationParams, Salt};
pub use error::{CipherError, Result};
pub use settings::{Limits, Settings, SettingsManager};
pub use storage::{default_data_dir, FileSaltStore, SaltStore};
