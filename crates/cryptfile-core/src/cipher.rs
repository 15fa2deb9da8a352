//! Password-based file encryption
//!
//! [`PasswordFileCipher`] turns a password into a key using the deployment
//! salt and seals or opens whole file payloads with it. The salt is read (or
//! created) once, on first use, and never changes afterwards.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{derive_key, generate_salt, open, seal, KeyDerivationParams, Salt};
use crate::error::{CipherError, Result};
use crate::storage::SaltStore;

/// Operation requested by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptAction {
    Encrypt,
    Decrypt,
}

impl CryptAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CryptAction::Encrypt => "encrypt",
            CryptAction::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for CryptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CryptAction {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("encrypt") {
            Ok(CryptAction::Encrypt)
        } else if s.eq_ignore_ascii_case("decrypt") {
            Ok(CryptAction::Decrypt)
        } else {
            Err(CipherError::InvalidAction(s.to_string()))
        }
    }
}

/// Derives keys from passwords and applies authenticated encryption to files
pub struct PasswordFileCipher {
    store: Arc<dyn SaltStore>,
    salt: OnceCell<Salt>,
    params: KeyDerivationParams,
}

impl PasswordFileCipher {
    /// Create a cipher backed by the given salt store
    pub fn new(store: Arc<dyn SaltStore>) -> Self {
        Self {
            store,
            salt: OnceCell::new(),
            params: KeyDerivationParams::default(),
        }
    }

    /// Override key derivation parameters (tests use a low iteration count)
    pub fn with_params(mut self, params: KeyDerivationParams) -> Self {
        self.params = params;
        self
    }

    /// Get the deployment salt, creating and persisting it on first use
    pub async fn salt(&self) -> Result<Salt> {
        self.salt
            .get_or_try_init(|| self.init_salt())
            .await
            .cloned()
    }

    async fn init_salt(&self) -> Result<Salt> {
        if let Some(salt) = self.store.load().await? {
            debug!("Using persisted salt from {}", self.store.backend_name());
            return Ok(salt);
        }

        info!("No salt found in {}, generating one", self.store.backend_name());
        self.store.create_if_absent(&generate_salt()).await
    }

    /// Encrypt a whole payload under `password`
    pub async fn encrypt(&self, payload: Vec<u8>, password: &str) -> Result<Vec<u8>> {
        debug!(bytes = payload.len(), "Encrypting payload");
        let password = self.checked_password(password)?;
        let salt = self.salt().await?;
        let params = self.params;

        tokio::task::spawn_blocking(move || {
            let key = derive_key(&password, &salt, Some(params))?;
            seal(&payload, &key)
        })
        .await
        .map_err(|e| CipherError::EncryptionError(format!("encryption task failed: {}", e)))?
    }

    /// Decrypt an envelope produced by [`PasswordFileCipher::encrypt`]
    ///
    /// Fails with [`CipherError::Authentication`] whenever the envelope does
    /// not verify under the key derived from `password`.
    pub async fn decrypt(&self, envelope: Vec<u8>, password: &str) -> Result<Vec<u8>> {
        debug!(bytes = envelope.len(), "Decrypting envelope");
        let password = self.checked_password(password)?;
        let salt = self.salt().await?;
        let params = self.params;

        tokio::task::spawn_blocking(move || {
            let key = derive_key(&password, &salt, Some(params))?;
            open(&envelope, &key)
        })
        .await
        .map_err(|e| CipherError::EncryptionError(format!("decryption task failed: {}", e)))?
    }

    /// Run the requested action
    pub async fn apply(
        &self,
        action: CryptAction,
        payload: Vec<u8>,
        password: &str,
    ) -> Result<Vec<u8>> {
        match action {
            CryptAction::Encrypt => self.encrypt(payload, password).await,
            CryptAction::Decrypt => self.decrypt(payload, password).await,
        }
    }

    fn checked_password(&self, password: &str) -> Result<Zeroizing<String>> {
        if password.is_empty() {
            return Err(CipherError::MissingInput("password".to_string()));
        }
        Ok(Zeroizing::new(password.to_string()))
    }
}
