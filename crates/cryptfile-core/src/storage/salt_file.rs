//! File-backed salt storage
//!
//! The salt lives in `salt.bin` inside the application's private data
//! directory. The file holds the raw salt bytes and nothing else.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{default_data_dir, SaltStore};
use crate::crypto::{Salt, MIN_SALT_LEN};
use crate::error::{CipherError, Result};

/// Name of the salt file inside the data directory
pub const SALT_FILE_NAME: &str = "salt.bin";

/// Salt stored as a single raw binary file
#[derive(Debug, Clone)]
pub struct FileSaltStore {
    storage_dir: PathBuf,
}

impl FileSaltStore {
    /// Create a salt store in the default data directory
    pub fn new() -> Result<Self> {
        Self::with_dir(default_data_dir()?)
    }

    /// Create with a custom storage directory
    pub fn with_dir(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        debug!("Salt storage initialized at: {:?}", storage_dir);
        Ok(Self { storage_dir })
    }

    /// Get the path to the salt file
    pub fn salt_file_path(&self) -> PathBuf {
        self.storage_dir.join(SALT_FILE_NAME)
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    async fn write_temp(&self, salt: &Salt) -> Result<TempFile> {
        let temp = TempFile {
            path: self
                .storage_dir
                .join(format!("{}.{}.tmp", SALT_FILE_NAME, Uuid::new_v4())),
        };

        let mut file = tokio::fs::File::create(&temp.path).await?;
        file.write_all(salt.as_bytes()).await?;
        file.sync_all().await?;

        Ok(temp)
    }
}

/// Temporary salt file, removed when dropped
struct TempFile {
    path: PathBuf,
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temporary salt file {:?}: {}", self.path, e),
        }
    }
}

#[async_trait]
impl SaltStore for FileSaltStore {
    async fn load(&self) -> Result<Option<Salt>> {
        let path = self.salt_file_path();

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // A short salt is never replaced: files encrypted under it would be lost
        if bytes.len() < MIN_SALT_LEN {
            return Err(CipherError::InvalidSalt(format!(
                "{:?} holds {} bytes, expected at least {}",
                path,
                bytes.len(),
                MIN_SALT_LEN
            )));
        }

        debug!("Loaded salt from {:?}", path);
        Ok(Some(Salt::new(bytes)))
    }

    async fn create_if_absent(&self, salt: &Salt) -> Result<Salt> {
        let path = self.salt_file_path();

        // Write the full salt to a private temp file, then publish it with a
        // hard link. Linking fails if the target exists, so readers never see a
        // partial salt and concurrent writers cannot overwrite each other.
        let temp = self.write_temp(salt).await?;
        let linked = tokio::fs::hard_link(&temp.path, &path).await;
        drop(temp);

        match linked {
            Ok(()) => {
                info!("Created new salt at {:?}", path);
                Ok(salt.clone())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Salt already present at {:?}, adopting it", path);
                self.load().await?.ok_or_else(|| {
                    CipherError::StorageError(format!("salt file {:?} disappeared", path))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "Salt File"
    }
}
