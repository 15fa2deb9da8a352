//! Storage trait definitions

use crate::crypto::Salt;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for deployment salt backends
#[async_trait]
pub trait SaltStore: Send + Sync {
    /// Read the persisted salt, if any
    async fn load(&self) -> Result<Option<Salt>>;

    /// Persist `salt` unless a salt already exists.
    ///
    /// Returns the salt that is stored once the call completes, which is the
    /// existing one when another writer got there first.
    async fn create_if_absent(&self, salt: &Salt) -> Result<Salt>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
