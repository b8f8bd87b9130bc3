//! Player-scoped persistent storage
//!
//! The world runtime exposes a key/value store per player. Profiles are
//! written under [`crate::domain::profile::PROFILE_STORAGE_KEY`]. The
//! file-backed implementation lives in the `infra` crate.

use crate::domain::audio::PlayerId;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur while reading or writing player storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The player's storage context is not reachable
    #[error("Storage unavailable for player {0}")]
    Unavailable(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Keyed, player-scoped byte store
#[async_trait::async_trait]
pub trait PlayerStorage: Send + Sync {
    async fn get(&self, player: &PlayerId, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, player: &PlayerId, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Volatile storage kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<(PlayerId, String), Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous peek, mainly for tests and diagnostics
    pub fn snapshot(&self, player: &PlayerId, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .ok()
            .and_then(|entries| entries.get(&(player.clone(), key.to_string())).cloned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(PlayerId, String), Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Backend(format!("memory storage poisoned: {e}")))
    }
}

#[async_trait::async_trait]
impl PlayerStorage for MemoryStorage {
    async fn get(&self, player: &PlayerId, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(&(player.clone(), key.to_string())).cloned())
    }

    async fn set(&self, player: &PlayerId, key: &str, bytes: &[u8]) -> Result<()> {
        self.lock()?
            .insert((player.clone(), key.to_string()), bytes.to_vec());
        Ok(())
    }
}
