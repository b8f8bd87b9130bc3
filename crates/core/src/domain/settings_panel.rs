//! Headless view model for the audio-settings panel
//!
//! The panel mirrors a pushed profile into slider values and labels, lets
//! the player edit them, and on unfocus produces the [`SetProfile`] message
//! that carries the edit back to the audio manager. It owns no
//! authoritative state: the audio manager's store stays the source of truth.

use crate::domain::audio::{AudioCategory, AudioHandle, PlayerId, Volume};
use crate::domain::messages::SetProfile;
use crate::domain::profile::AudioProfile;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Request to audition a slider's level on the preview sound
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    pub handle: AudioHandle,
    pub volume: f32,
}

#[derive(Debug, Clone)]
pub struct SettingsPanel {
    player: PlayerId,
    preview_sound: Option<AudioHandle>,
    sliders: HashMap<AudioCategory, Volume>,
    muted: bool,
    /// Last profile pushed by the audio manager or committed by the panel
    profile: Option<AudioProfile>,
}

impl SettingsPanel {
    pub fn new(player: PlayerId, preview_sound: Option<AudioHandle>) -> Self {
        let sliders = AudioCategory::ALL
            .iter()
            .map(|&category| (category, Volume::default()))
            .collect();

        Self {
            player,
            preview_sound,
            sliders,
            muted: false,
            profile: None,
        }
    }

    pub fn slider(&self, category: AudioCategory) -> Volume {
        self.sliders.get(&category).copied().unwrap_or_default()
    }

    /// Text shown next to a slider, e.g. `Music: 50%`
    pub fn label(&self, category: AudioCategory) -> String {
        format!("{}: {}%", category.label(), self.slider(category).value())
    }

    /// Caption of the mute toggle
    pub fn mute_label(&self) -> &'static str {
        if self.muted {
            "Unmute"
        } else {
            "Mute"
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Mirror a profile pushed by the audio manager
    pub fn apply(&mut self, profile: AudioProfile) {
        debug!(player = %self.player, "Settings panel received profile");
        self.muted = profile.is_muted;
        self.profile = Some(profile);
        self.restore_sliders();
    }

    /// Slider dragged to a raw value
    pub fn slider_moved(&mut self, category: AudioCategory, value: f64) {
        self.sliders.insert(category, Volume::from_f64(value));
    }

    /// Preview request for a slider that lost focus
    pub fn slider_lost_focus(&self, category: AudioCategory) -> Option<PreviewRequest> {
        let Some(handle) = &self.preview_sound else {
            warn!("Settings panel has no preview sound configured");
            return None;
        };

        Some(PreviewRequest {
            handle: handle.clone(),
            volume: self.slider(category).factor(),
        })
    }

    /// Reset every slider to its default level and unmute
    pub fn reset_to_defaults(&mut self) {
        self.set_all(Volume::default());
        self.muted = false;
    }

    /// Toggle mute; muting zeroes every slider, unmuting restores the
    /// levels of the last known profile
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if self.muted {
            self.set_all(Volume::new(0));
        } else {
            self.restore_sliders();
        }
        self.muted
    }

    /// Build the edit message sent when the panel loses focus
    ///
    /// Returns `None` until a profile has been pushed to the panel. Levels
    /// remembered for unmuting are kept unless the panel is unmuted.
    pub fn commit(&mut self) -> Option<SetProfile> {
        let mut profile = self.profile?;

        for category in AudioCategory::ALL {
            profile.set_volume(category, self.slider(category));
        }
        profile.is_muted = self.muted;

        if !self.muted {
            self.profile = Some(profile);
        } else if let Some(remembered) = self.profile.as_mut() {
            remembered.is_muted = true;
        }

        Some(SetProfile {
            player: self.player.clone(),
            profile,
        })
    }

    fn set_all(&mut self, volume: Volume) {
        for category in AudioCategory::ALL {
            self.sliders.insert(category, volume);
        }
    }

    fn restore_sliders(&mut self) {
        let Some(profile) = self.profile else {
            return;
        };
        for category in AudioCategory::ALL {
            let volume = if self.muted {
                Volume::new(0)
            } else {
                profile.volume(category)
            };
            self.sliders.insert(category, volume);
        }
    }
}
