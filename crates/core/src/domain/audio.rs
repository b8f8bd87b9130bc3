//! Audio identities, categories and playback primitives
//!
//! This module defines the platform-agnostic vocabulary of the subsystem:
//! who a player is, which audio entity a request targets, the five audio
//! categories and the clamped 0–100 volume scale. The playback primitives
//! themselves (volume/play/pause on an audio entity) are provided by the
//! world runtime; the `infra` crate ships an in-process implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by playback primitives
#[derive(Debug, Error)]
pub enum AudioError {
    /// The referenced audio entity does not exist or is not an audio gizmo
    #[error("Audio handle not found: {0}")]
    HandleNotFound(String),

    /// The runtime refused a volume/play/pause command
    #[error("Playback command rejected: {0}")]
    CommandRejected(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Identity of a connected player
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an audio entity in the world
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioHandle(String);

impl AudioHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a UI surface a player can focus
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audio role of a sound, each with an independent volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCategory {
    Music,
    #[serde(rename = "SFX")]
    Sfx,
    Ambient,
    #[serde(rename = "UI")]
    Ui,
    Notification,
}

impl AudioCategory {
    pub const ALL: [AudioCategory; 5] = [
        AudioCategory::Music,
        AudioCategory::Sfx,
        AudioCategory::Ambient,
        AudioCategory::Ui,
        AudioCategory::Notification,
    ];

    /// Categories whose handle is retained for pause/resume
    pub const CONTINUOUS: [AudioCategory; 2] = [AudioCategory::Music, AudioCategory::Ambient];

    /// Whether playback in this category can later be paused and resumed
    pub fn is_continuous(self) -> bool {
        matches!(self, AudioCategory::Music | AudioCategory::Ambient)
    }

    /// Display label used by the settings panel
    pub fn label(self) -> &'static str {
        match self {
            AudioCategory::Music => "Music",
            AudioCategory::Sfx => "SFX",
            AudioCategory::Ambient => "Ambient",
            AudioCategory::Ui => "UI",
            AudioCategory::Notification => "Notification",
        }
    }
}

impl fmt::Display for AudioCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Volume on the 0–100 preference scale
///
/// Every constructor clamps, so a `Volume` is always within range no matter
/// whether it came from a slider, a network message or persisted bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "u8")]
pub struct Volume(u8);

impl Volume {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;
    pub const DEFAULT: u8 = 50;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    /// Round and clamp a fractional value; NaN maps to silence
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.round().clamp(Self::MIN as f64, Self::MAX as f64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Linear gain factor handed to the playback primitive
    pub fn factor(&self) -> f32 {
        self.0 as f32 / Self::MAX as f32
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<f64> for Volume {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<Volume> for u8 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Playback primitives exposed by the world runtime for audio entities
///
/// Every command is scoped to a single player; implementations must never
/// broadcast to other players sharing the same entity.
pub trait AudioPlayback: Send + Sync {
    /// Set the linear volume (0.0–1.0) of an audio entity
    fn set_volume(&self, handle: &AudioHandle, volume: f32) -> Result<()>;

    /// Start or resume playback for one player
    fn play(&self, handle: &AudioHandle, player: &PlayerId) -> Result<()>;

    /// Pause playback for one player
    fn pause(&self, handle: &AudioHandle, player: &PlayerId) -> Result<()>;
}
