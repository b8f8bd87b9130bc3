//! Category-aware playback routing
//!
//! Resolves a player's per-category volume, applies it to the requested
//! audio entity and plays it for that player only. Music and ambient
//! handles are remembered in the store so focus changes can pause and
//! resume them.

use crate::domain::audio::{AudioCategory, AudioHandle, AudioPlayback, PlayerId};
use crate::domain::store::{PlaybackState, ProfileStore};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Result of a play request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayOutcome {
    /// The handle was played at this linear volume
    Played { volume: f32 },
    /// The player has no profile yet (or any more)
    NotReady,
    /// The playback primitive refused the handle
    Skipped,
}

pub struct PlaybackRouter {
    playback: Arc<dyn AudioPlayback>,
}

impl PlaybackRouter {
    pub fn new(playback: Arc<dyn AudioPlayback>) -> Self {
        Self { playback }
    }

    /// Play `handle` for `player` at the volume of `category`
    pub fn play(
        &self,
        store: &mut ProfileStore,
        player: &PlayerId,
        handle: &AudioHandle,
        category: AudioCategory,
    ) -> PlayOutcome {
        let Some(profile) = store.get(player) else {
            debug!(player = %player, handle = %handle, "Play request before profile is ready");
            return PlayOutcome::NotReady;
        };

        let volume = profile.volume(category).factor();

        if let Err(e) = self.playback.set_volume(handle, volume) {
            warn!(player = %player, handle = %handle, error = %e, "Skipping play request");
            return PlayOutcome::Skipped;
        }

        if let Err(e) = self.playback.play(handle, player) {
            warn!(player = %player, handle = %handle, error = %e, "Playback failed");
            return PlayOutcome::Skipped;
        }

        if category.is_continuous() {
            store.bind_handle(player, category, handle.clone());
        }

        trace!(player = %player, handle = %handle, %category, volume, "Audio played");
        PlayOutcome::Played { volume }
    }

    /// Pause every bound continuous handle of a player
    ///
    /// Returns the number of handles paused.
    pub fn pause_continuous(&self, store: &mut ProfileStore, player: &PlayerId) -> usize {
        if !store.set_playback(player, PlaybackState::Paused) {
            return 0;
        }

        let mut paused = 0;
        for category in AudioCategory::CONTINUOUS {
            let Some(handle) = store.get_handle(player, category) else {
                continue;
            };
            match self.playback.pause(handle, player) {
                Ok(()) => paused += 1,
                Err(e) => warn!(player = %player, handle = %handle, error = %e, "Pause failed"),
            }
        }

        debug!(player = %player, paused, "Continuous audio paused");
        paused
    }

    /// Re-apply current volumes to bound continuous handles and resume them
    ///
    /// Returns the number of handles resumed.
    pub fn resume_continuous(&self, store: &mut ProfileStore, player: &PlayerId) -> usize {
        let Some(profile) = store.get(player).copied() else {
            return 0;
        };
        store.set_playback(player, PlaybackState::Playing);

        let mut resumed = 0;
        for category in AudioCategory::CONTINUOUS {
            let Some(handle) = store.get_handle(player, category) else {
                continue;
            };
            let volume = profile.volume(category).factor();
            let result = self
                .playback
                .set_volume(handle, volume)
                .and_then(|()| self.playback.play(handle, player));
            match result {
                Ok(()) => resumed += 1,
                Err(e) => warn!(player = %player, handle = %handle, error = %e, "Resume failed"),
            }
        }

        debug!(player = %player, resumed, "Continuous audio resumed");
        resumed
    }
}
