//! Message contract between the audio manager and its collaborators
//!
//! The same types are used whether a collaborator sits in the same process
//! or across the network. Inbound events are tagged by `type` so a script or
//! socket can carry them as JSON lines.

use crate::domain::audio::{AudioCategory, AudioHandle, PlayerId, SurfaceId};
use crate::domain::profile::AudioProfile;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Profile transfer, server→client on join and client→server on edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProfile {
    pub player: PlayerId,
    pub profile: AudioProfile,
}

/// Category-aware playback request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAudio {
    pub player: PlayerId,
    pub audio_handle_ref: AudioHandle,
    pub category: AudioCategory,
}

/// On-demand flush of a player's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveProfile {
    pub player: PlayerId,
}

/// Everything the audio manager reacts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AudioEvent {
    PlayerEnterWorld { player: PlayerId },
    PlayerExitWorld { player: PlayerId },
    PlayerFocusUi { player: PlayerId, target: SurfaceId },
    PlayerUnfocusUi { player: PlayerId, target: SurfaceId },
    SetProfile(SetProfile),
    PlayAudio(PlayAudio),
    SaveProfile(SaveProfile),
}

impl AudioEvent {
    /// Player the event is about
    pub fn player(&self) -> &PlayerId {
        match self {
            AudioEvent::PlayerEnterWorld { player }
            | AudioEvent::PlayerExitWorld { player }
            | AudioEvent::PlayerFocusUi { player, .. }
            | AudioEvent::PlayerUnfocusUi { player, .. } => player,
            AudioEvent::SetProfile(msg) => &msg.player,
            AudioEvent::PlayAudio(msg) => &msg.player,
            AudioEvent::SaveProfile(msg) => &msg.player,
        }
    }
}

/// Messages the audio manager pushes to a single player's client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    SetProfile(SetProfile),
}

/// Errors delivering a message to a client
#[derive(Debug, Error)]
pub enum LinkError {
    /// The player is no longer connected
    #[error("Recipient gone: {0}")]
    RecipientGone(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Delivery of client-bound messages to exactly one player
pub trait ClientLink: Send + Sync {
    fn send(&self, player: &PlayerId, message: ClientMessage) -> Result<(), LinkError>;
}
