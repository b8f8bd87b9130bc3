//! File-backed player storage
//!
//! Each player gets a directory under the data root and each key a file
//! inside it: `<data_dir>/<player>/<key>.json`. Both names are escaped so
//! that distinct identifiers always map to distinct paths. Writes go to a
//! temporary file first and are renamed into place, so a crash mid-write
//! leaves the previous value intact.

use minstrel_core::domain::audio::PlayerId;
use minstrel_core::domain::storage::{PlayerStorage, Result, StorageError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument, warn};

pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file holding `key` for `player`
    pub fn entry_path(&self, player: &PlayerId, key: &str) -> PathBuf {
        self.data_dir
            .join(encode_name(player.as_str()))
            .join(format!("{}.json", encode_name(key)))
    }
}

/// Map an identifier onto a portable file name, injectively
///
/// `[A-Za-z0-9_-]` is kept; every other byte becomes `%XX`. The escape
/// character is itself escaped and `.` never survives, so no name resolves
/// to `.` or `..`. The empty identifier maps to a lone `%`, which no other
/// identifier can produce.
fn encode_name(name: &str) -> String {
    if name.is_empty() {
        return "%".to_string();
    }

    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(char::from(byte));
        } else {
            encoded.push('%');
            encoded.push_str(&hex::encode_upper([byte]));
        }
    }
    encoded
}

#[async_trait::async_trait]
impl PlayerStorage for FileStorage {
    #[instrument(skip(self))]
    async fn get(&self, player: &PlayerId, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(player, key);
        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), len = bytes.len(), "Player data read");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    #[instrument(skip(self, bytes))]
    async fn set(&self, player: &PlayerId, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(player, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).await?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove temporary file");
            }
            return Err(StorageError::Io(e));
        }

        debug!(path = %path.display(), len = bytes.len(), "Player data written");
        Ok(())
    }
}
