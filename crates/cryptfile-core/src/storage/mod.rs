//! Persistent storage for the deployment salt

mod salt_file;
mod traits;

use directories::ProjectDirs;
use std::path::PathBuf;

use crate::error::{CipherError, Result};

pub use salt_file::{FileSaltStore, SALT_FILE_NAME};
pub use traits::SaltStore;

/// Get the default private data directory
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "cryptfile", "cryptfile")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| CipherError::StorageError("Could not determine data directory".to_string()))
}
