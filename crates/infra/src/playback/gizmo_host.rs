//! In-process audio gizmo host
//!
//! Stands in for the world runtime's audio entities: handles must be
//! registered before use, each carries a volume, and playback state is
//! tracked per listening player so a command for one player never affects
//! another.

use minstrel_core::domain::audio::{AudioError, AudioHandle, AudioPlayback, PlayerId, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

/// Playback state of one gizmo for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoState {
    Playing,
    Paused,
}

#[derive(Debug, Default)]
struct Gizmo {
    volume: f32,
    listeners: HashMap<PlayerId, GizmoState>,
}

/// Registry of audio gizmos implementing the playback primitives
#[derive(Debug, Default)]
pub struct GizmoHost {
    gizmos: Mutex<HashMap<AudioHandle, Gizmo>>,
}

impl GizmoHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an audio entity at full volume
    pub fn register(&self, handle: AudioHandle) {
        if let Ok(mut gizmos) = self.gizmos.lock() {
            debug!(handle = %handle, "Gizmo registered");
            gizmos.entry(handle).or_insert_with(|| Gizmo {
                volume: 1.0,
                listeners: HashMap::new(),
            });
        }
    }

    pub fn volume(&self, handle: &AudioHandle) -> Option<f32> {
        self.lock().ok()?.get(handle).map(|g| g.volume)
    }

    pub fn state(&self, handle: &AudioHandle, player: &PlayerId) -> Option<GizmoState> {
        self.lock().ok()?.get(handle)?.listeners.get(player).copied()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<AudioHandle, Gizmo>>> {
        self.gizmos
            .lock()
            .map_err(|e| AudioError::CommandRejected(format!("gizmo host poisoned: {e}")))
    }

    fn with_gizmo<T>(&self, handle: &AudioHandle, f: impl FnOnce(&mut Gizmo) -> T) -> Result<T> {
        let mut gizmos = self.lock()?;
        let gizmo = gizmos
            .get_mut(handle)
            .ok_or_else(|| AudioError::HandleNotFound(handle.to_string()))?;
        Ok(f(gizmo))
    }
}

impl AudioPlayback for GizmoHost {
    fn set_volume(&self, handle: &AudioHandle, volume: f32) -> Result<()> {
        if !volume.is_finite() {
            return Err(AudioError::CommandRejected(format!(
                "volume {volume} for {handle} is not finite"
            )));
        }
        self.with_gizmo(handle, |g| g.volume = volume.clamp(0.0, 1.0))?;
        trace!(handle = %handle, volume, "Gizmo volume set");
        Ok(())
    }

    fn play(&self, handle: &AudioHandle, player: &PlayerId) -> Result<()> {
        self.with_gizmo(handle, |g| {
            g.listeners.insert(player.clone(), GizmoState::Playing);
        })?;
        trace!(handle = %handle, player = %player, "Gizmo playing");
        Ok(())
    }

    fn pause(&self, handle: &AudioHandle, player: &PlayerId) -> Result<()> {
        self.with_gizmo(handle, |g| {
            if let Some(state) = g.listeners.get_mut(player) {
                *state = GizmoState::Paused;
            }
        })?;
        trace!(handle = %handle, player = %player, "Gizmo paused");
        Ok(())
    }
}
