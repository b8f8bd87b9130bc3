//! Profile synchronization between client, store and persistent storage
//!
//! The synchronizer is the single authority over the [`ProfileStore`]. It
//! reacts to world and client events:
//!
//! - join: after a settling delay, load-or-create the profile, store it and
//!   push it to the joining player's client only
//! - client edit: replace the stored profile (optionally flushing at once)
//! - leave: flush the profile to storage before evicting the player
//! - focus on the audio-settings surface: pause/resume continuous audio
//!
//! Every failure is either a silent not-ready no-op or a logged skip;
//! nothing is surfaced to the event source.

use crate::domain::audio::{AudioCategory, AudioPlayback, PlayerId, SurfaceId};
use crate::domain::config::ManagerConfig;
use crate::domain::messages::{AudioEvent, ClientLink, ClientMessage, LinkError, PlayAudio, SetProfile};
use crate::domain::profile::{self, AudioProfile, CURRENT_SCHEMA_VERSION, PROFILE_STORAGE_KEY};
use crate::domain::router::{PlayOutcome, PlaybackRouter};
use crate::domain::storage::PlayerStorage;
use crate::domain::store::{PlayerPhase, ProfileStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Fired when a player's join settling delay elapses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTicket {
    pub player: PlayerId,
    pub generation: u64,
}

struct PendingJoin {
    generation: u64,
    task: JoinHandle<()>,
}

/// Per-player deferred join completion
///
/// Each scheduled join gets a fresh generation. Cancelling aborts the
/// timer; a ticket that was already queued is rejected by [`settle`]
/// because its generation no longer matches.
///
/// [`settle`]: JoinScheduler::settle
struct JoinScheduler {
    delay: Duration,
    settled_tx: mpsc::UnboundedSender<JoinTicket>,
    pending: HashMap<PlayerId, PendingJoin>,
    next_generation: u64,
}

impl JoinScheduler {
    fn schedule(&mut self, player: &PlayerId) -> u64 {
        self.cancel(player);
        self.next_generation += 1;
        let generation = self.next_generation;

        let ticket = JoinTicket {
            player: player.clone(),
            generation,
        };
        let tx = self.settled_tx.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver only goes away when the service stops
            let _ = tx.send(ticket);
        });

        self.pending
            .insert(player.clone(), PendingJoin { generation, task });
        generation
    }

    fn cancel(&mut self, player: &PlayerId) -> bool {
        match self.pending.remove(player) {
            Some(pending) => {
                pending.task.abort();
                true
            }
            None => false,
        }
    }

    fn settle(&mut self, ticket: &JoinTicket) -> bool {
        match self.pending.get(&ticket.player) {
            Some(pending) if pending.generation == ticket.generation => {
                self.pending.remove(&ticket.player);
                true
            }
            _ => false,
        }
    }

    fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.task.abort();
        }
    }

    fn is_pending(&self, player: &PlayerId) -> bool {
        self.pending.contains_key(player)
    }
}

pub struct Synchronizer {
    config: ManagerConfig,
    surface: Option<SurfaceId>,
    store: ProfileStore,
    router: PlaybackRouter,
    storage: Arc<dyn PlayerStorage>,
    client: Arc<dyn ClientLink>,
    joins: JoinScheduler,
}

impl Synchronizer {
    /// Create a synchronizer and the stream of settled join tickets
    ///
    /// Tickets must be fed back through [`Synchronizer::complete_join`];
    /// [`crate::service::AudioService`] does this automatically.
    pub fn new(
        config: ManagerConfig,
        storage: Arc<dyn PlayerStorage>,
        client: Arc<dyn ClientLink>,
        playback: Arc<dyn AudioPlayback>,
    ) -> (Self, mpsc::UnboundedReceiver<JoinTicket>) {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let joins = JoinScheduler {
            delay: config.settle_delay(),
            settled_tx,
            pending: HashMap::new(),
            next_generation: 0,
        };

        let sync = Self {
            surface: config.audio_settings_surface(),
            config,
            store: ProfileStore::new(),
            router: PlaybackRouter::new(playback),
            storage,
            client,
            joins,
        };
        (sync, settled_rx)
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn phase(&self, player: &PlayerId) -> PlayerPhase {
        self.store.phase(player)
    }

    pub fn is_join_pending(&self, player: &PlayerId) -> bool {
        self.joins.is_pending(player)
    }

    /// Dispatch one inbound event
    pub async fn handle(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::PlayerEnterWorld { player } => self.on_player_enter(&player),
            AudioEvent::PlayerExitWorld { player } => {
                self.on_player_exit(&player).await;
            }
            AudioEvent::PlayerFocusUi { player, target } => {
                self.on_focus_ui(&player, &target);
            }
            AudioEvent::PlayerUnfocusUi { player, target } => {
                self.on_unfocus_ui(&player, &target);
            }
            AudioEvent::SetProfile(msg) => {
                self.set_profile(msg).await;
            }
            AudioEvent::PlayAudio(msg) => {
                self.play_audio(&msg);
            }
            AudioEvent::SaveProfile(msg) => {
                self.save_profile(&msg.player).await;
            }
        }
    }

    /// Schedule the profile push for a joining player
    pub fn on_player_enter(&mut self, player: &PlayerId) {
        info!(player = %player, "Player entered world");
        self.store.begin_join(player);
        let generation = self.joins.schedule(player);
        debug!(
            player = %player,
            generation,
            delay_ms = self.config.settle_delay_ms,
            "Join push scheduled"
        );
    }

    /// Finish a join once its settling delay has elapsed
    ///
    /// Returns the profile pushed to the client, or `None` when the ticket
    /// is stale (the player left or re-joined meanwhile).
    #[instrument(skip(self), fields(player = %ticket.player))]
    pub async fn complete_join(&mut self, ticket: JoinTicket) -> Option<AudioProfile> {
        if !self.joins.settle(&ticket) {
            debug!(generation = ticket.generation, "Discarding stale join ticket");
            return None;
        }
        let player = ticket.player;

        let profile = match self.store.phase(&player) {
            // Repeated join notification; the live profile may hold unsaved edits
            PlayerPhase::Active(_) => match self.store.get(&player).copied() {
                Some(profile) => profile,
                None => self.load_into_store(&player).await,
            },
            PlayerPhase::Unjoined | PlayerPhase::Initializing => {
                self.load_into_store(&player).await
            }
        };

        let message = ClientMessage::SetProfile(SetProfile {
            player: player.clone(),
            profile,
        });
        match self.client.send(&player, message) {
            Ok(()) => info!("Profile pushed to client"),
            Err(LinkError::RecipientGone(_)) => debug!("Client gone before profile push"),
            Err(e) => warn!(error = %e, "Failed to push profile to client"),
        }

        if let Some(handle) = self.config.join_music() {
            self.router
                .play(&mut self.store, &player, &handle, AudioCategory::Music);
        }

        Some(profile)
    }

    /// Flush and evict a leaving player
    ///
    /// The storage write is awaited before returning so it completes in the
    /// same handling turn as the leave notification. Returns whether a
    /// profile was persisted.
    #[instrument(skip(self))]
    pub async fn on_player_exit(&mut self, player: &PlayerId) -> bool {
        info!("Player exited world");
        if self.joins.cancel(player) {
            debug!("Cancelled pending join push");
        }

        let flushed = self.flush(player).await;
        self.store.remove(player);
        flushed
    }

    /// Replace a player's profile with a client edit
    ///
    /// Last writer wins; no merge or version comparison against the stored
    /// value. Edits for players without a live profile (not joined, or still
    /// inside the join settling window) are dropped.
    #[instrument(skip(self, msg), fields(player = %msg.player))]
    pub async fn set_profile(&mut self, msg: SetProfile) -> bool {
        if !self.store.phase(&msg.player).is_active() {
            debug!(phase = ?self.store.phase(&msg.player), "Dropping profile edit, profile not ready");
            return false;
        }

        let profile = AudioProfile {
            schema_version: CURRENT_SCHEMA_VERSION,
            ..msg.profile
        };
        self.store.set(&msg.player, profile);
        debug!("Profile updated from client");

        if self.config.persist_every_change {
            self.flush(&msg.player).await;
        }
        true
    }

    /// Flush a player's profile without evicting them
    #[instrument(skip(self))]
    pub async fn save_profile(&mut self, player: &PlayerId) -> bool {
        self.flush(player).await
    }

    pub fn play_audio(&mut self, msg: &PlayAudio) -> PlayOutcome {
        self.router
            .play(&mut self.store, &msg.player, &msg.audio_handle_ref, msg.category)
    }

    /// Pause continuous audio when the audio-settings surface gains focus
    pub fn on_focus_ui(&mut self, player: &PlayerId, target: &SurfaceId) -> usize {
        if !self.is_audio_settings(target) {
            return 0;
        }
        self.router.pause_continuous(&mut self.store, player)
    }

    /// Resume continuous audio when the audio-settings surface loses focus
    pub fn on_unfocus_ui(&mut self, player: &PlayerId, target: &SurfaceId) -> usize {
        if !self.is_audio_settings(target) {
            return 0;
        }
        self.router.resume_continuous(&mut self.store, player)
    }

    /// Flush every live profile and drop pending joins; used on shutdown
    pub async fn flush_all(&mut self) -> usize {
        self.joins.cancel_all();

        let players: Vec<PlayerId> = self.store.players().cloned().collect();
        let mut flushed = 0;
        for player in &players {
            if self.flush(player).await {
                flushed += 1;
            }
        }
        info!(flushed, "Flushed all profiles");
        flushed
    }

    fn is_audio_settings(&self, target: &SurfaceId) -> bool {
        match &self.surface {
            Some(surface) => surface == target,
            None => {
                warn!(target = %target, "No audio-settings surface configured, ignoring focus change");
                false
            }
        }
    }

    /// Read, initialize and store the persisted profile
    async fn load_into_store(&mut self, player: &PlayerId) -> AudioProfile {
        let profile = self.load(player).await;
        self.store.set(player, profile);
        profile
    }

    async fn load(&self, player: &PlayerId) -> AudioProfile {
        let stored = match self.storage.get(player, PROFILE_STORAGE_KEY).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(player = %player, error = %e, "Failed to read stored profile, using defaults");
                None
            }
        };
        profile::initialize_from_bytes(stored.as_deref())
    }

    async fn flush(&self, player: &PlayerId) -> bool {
        let Some(profile) = self.store.get(player) else {
            return false;
        };

        let bytes = match profile.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(player = %player, error = %e, "Failed to serialize profile, save lost");
                return false;
            }
        };

        match self.storage.set(player, PROFILE_STORAGE_KEY, &bytes).await {
            Ok(()) => {
                info!(player = %player, "Profile saved");
                true
            }
            Err(e) => {
                error!(player = %player, error = %e, "Failed to persist profile, save lost");
                false
            }
        }
    }
}
