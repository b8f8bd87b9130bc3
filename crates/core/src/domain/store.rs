//! Per-player audio state store
//!
//! Holds each connected player's profile, the last continuous-category
//! handle played for them, and the player's lifecycle phase. Entries are
//! keyed by player so no two players' state can alias. The store is owned by
//! one authority (the synchronizer) and is not shared across tasks.

use crate::domain::audio::{AudioCategory, AudioHandle, PlayerId};
use crate::domain::profile::AudioProfile;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Whether a player's continuous audio is currently audible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// Lifecycle phase of a player
///
/// `Unjoined -> Initializing -> Active{Playing|Paused}`. Only `Active`
/// players have a profile; requests for any other phase are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    Unjoined,
    Initializing,
    Active(PlaybackState),
}

impl PlayerPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, PlayerPhase::Active(_))
    }
}

/// In-memory audio state for every connected player
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: HashMap<PlayerId, AudioProfile>,
    bindings: HashMap<(PlayerId, AudioCategory), AudioHandle>,
    phases: HashMap<PlayerId, PlayerPhase>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player: &PlayerId) -> Option<&AudioProfile> {
        self.profiles.get(player)
    }

    /// Replace the whole profile for a player and mark them active
    pub fn set(&mut self, player: &PlayerId, profile: AudioProfile) {
        self.profiles.insert(player.clone(), profile);

        let phase = self.phase(player);
        if !phase.is_active() {
            self.transition(player, PlayerPhase::Active(PlaybackState::Playing));
        }
        trace!(player = %player, "Profile stored");
    }

    /// Drop the player's profile, bindings and phase
    pub fn remove(&mut self, player: &PlayerId) -> Option<AudioProfile> {
        self.unbind_all(player);
        self.phases.remove(player);
        let removed = self.profiles.remove(player);
        debug!(player = %player, had_profile = removed.is_some(), "Player evicted from store");
        removed
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.profiles.contains_key(player)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Players that currently hold a profile
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.profiles.keys()
    }

    /// Record the handle last played for a player in a category
    ///
    /// Overwrites any earlier binding for the same category.
    pub fn bind_handle(&mut self, player: &PlayerId, category: AudioCategory, handle: AudioHandle) {
        trace!(player = %player, %category, handle = %handle, "Handle bound");
        self.bindings.insert((player.clone(), category), handle);
    }

    pub fn get_handle(&self, player: &PlayerId, category: AudioCategory) -> Option<&AudioHandle> {
        self.bindings.get(&(player.clone(), category))
    }

    pub fn unbind_all(&mut self, player: &PlayerId) {
        self.bindings.retain(|(owner, _), _| owner != player);
    }

    pub fn phase(&self, player: &PlayerId) -> PlayerPhase {
        self.phases
            .get(player)
            .copied()
            .unwrap_or(PlayerPhase::Unjoined)
    }

    /// Note that a join is pending for a player without a profile
    ///
    /// Active players keep their phase: a repeated join notification must
    /// not hide an existing profile.
    pub fn begin_join(&mut self, player: &PlayerId) {
        if self.phase(player) == PlayerPhase::Unjoined {
            self.transition(player, PlayerPhase::Initializing);
        }
    }

    /// Move an active player to `state`; returns false if not active
    pub fn set_playback(&mut self, player: &PlayerId, state: PlaybackState) -> bool {
        if !self.phase(player).is_active() {
            return false;
        }
        self.transition(player, PlayerPhase::Active(state));
        true
    }

    fn transition(&mut self, player: &PlayerId, next: PlayerPhase) {
        let previous = self.phase(player);
        if previous != next {
            debug!(player = %player, ?previous, ?next, "Player phase changed");
        }
        self.phases.insert(player.clone(), next);
    }
}
