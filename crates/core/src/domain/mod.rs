//! Domain entities and business rules

pub mod audio;
pub mod config;
pub mod messages;
pub mod profile;
pub mod router;
pub mod settings_panel;
pub mod storage;
pub mod store;
pub mod sync;

// Re-export specific items to avoid ambiguous glob imports
pub use audio::{AudioCategory, AudioError, AudioHandle, AudioPlayback, PlayerId, SurfaceId, Volume};
pub use config::{ConfigError, ConfigManager, ManagerConfig, MinstrelConfig, StorageConfig};
pub use messages::{AudioEvent, ClientLink, ClientMessage, LinkError, PlayAudio, SaveProfile, SetProfile};
pub use profile::{AudioProfile, CURRENT_SCHEMA_VERSION, PROFILE_STORAGE_KEY};
pub use router::{PlayOutcome, PlaybackRouter};
pub use settings_panel::{PreviewRequest, SettingsPanel};
pub use storage::{MemoryStorage, PlayerStorage, StorageError};
pub use store::{PlaybackState, PlayerPhase, ProfileStore};
pub use sync::{JoinTicket, Synchronizer};
