//! Player audio profiles and the persisted-profile initializer
//!
//! A profile is the set of audio preferences a player carries across
//! sessions. Persisted profiles are accepted only through [`initialize`],
//! which applies the schema version gate and clamps every field.

use crate::domain::audio::{AudioCategory, Volume};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Schema version written with every persisted profile
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Player-scoped storage key holding the serialized profile
pub const PROFILE_STORAGE_KEY: &str = "PlayerData:Audio";

/// A player's saved audio preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioProfile {
    #[serde(alias = "version")]
    pub schema_version: u32,
    pub music_volume: Volume,
    pub sfx_volume: Volume,
    pub ambient_volume: Volume,
    pub ui_volume: Volume,
    pub notification_volume: Volume,
    pub is_muted: bool,
}

impl AudioProfile {
    /// Profile every player starts from
    pub fn current_default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            music_volume: Volume::default(),
            sfx_volume: Volume::default(),
            ambient_volume: Volume::default(),
            ui_volume: Volume::default(),
            notification_volume: Volume::default(),
            is_muted: false,
        }
    }

    pub fn volume(&self, category: AudioCategory) -> Volume {
        match category {
            AudioCategory::Music => self.music_volume,
            AudioCategory::Sfx => self.sfx_volume,
            AudioCategory::Ambient => self.ambient_volume,
            AudioCategory::Ui => self.ui_volume,
            AudioCategory::Notification => self.notification_volume,
        }
    }

    pub fn set_volume(&mut self, category: AudioCategory, volume: Volume) {
        let slot = match category {
            AudioCategory::Music => &mut self.music_volume,
            AudioCategory::Sfx => &mut self.sfx_volume,
            AudioCategory::Ambient => &mut self.ambient_volume,
            AudioCategory::Ui => &mut self.ui_volume,
            AudioCategory::Notification => &mut self.notification_volume,
        };
        *slot = volume;
    }

    /// Builder-style volume override
    pub fn with_volume(mut self, category: AudioCategory, volume: i64) -> Self {
        self.set_volume(category, Volume::new(volume));
        self
    }

    /// Serialize for persistent storage
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Parse persisted bytes; volumes are clamped while parsing
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Missing fields of a stored profile fall back to these values. The
/// missing schema version is 0, so a profile without one is always stale.
impl Default for AudioProfile {
    fn default() -> Self {
        Self {
            schema_version: 0,
            ..Self::current_default()
        }
    }
}

/// Reconcile a persisted profile with the current schema
///
/// The result always carries [`CURRENT_SCHEMA_VERSION`]. Stored values are
/// copied forward only when the stored version is at least current;
/// otherwise the defaults stand. This never touches the store.
pub fn initialize(stored: Option<&AudioProfile>) -> AudioProfile {
    let mut profile = AudioProfile::current_default();

    match stored {
        Some(stored) if stored.schema_version >= CURRENT_SCHEMA_VERSION => {
            profile.music_volume = stored.music_volume;
            profile.sfx_volume = stored.sfx_volume;
            profile.ambient_volume = stored.ambient_volume;
            profile.ui_volume = stored.ui_volume;
            profile.notification_volume = stored.notification_volume;
            profile.is_muted = stored.is_muted;
        }
        Some(stored) => {
            debug!(
                stored_version = stored.schema_version,
                current_version = CURRENT_SCHEMA_VERSION,
                "Discarding stale audio profile"
            );
        }
        None => {}
    }

    profile
}

/// [`initialize`] from raw persisted bytes
///
/// Unparseable bytes are treated as absent.
pub fn initialize_from_bytes(bytes: Option<&[u8]>) -> AudioProfile {
    let stored = bytes.and_then(|bytes| match AudioProfile::from_bytes(bytes) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!(error = %e, "Persisted audio profile is unreadable, using defaults");
            None
        }
    });

    initialize(stored.as_ref())
}
