//! Channel-based client link
//!
//! Each connected client registers a tokio channel; messages addressed to a
//! player are delivered on that player's channel only. Sending to a player
//! without a live channel reports [`LinkError::RecipientGone`], which the
//! synchronizer treats as a harmless no-op.

use minstrel_core::domain::audio::PlayerId;
use minstrel_core::domain::messages::{ClientLink, ClientMessage, LinkError};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ChannelClientLink {
    clients: Mutex<HashMap<PlayerId, mpsc::UnboundedSender<ClientMessage>>>,
}

impl ChannelClientLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client and get the receiving end of its channel
    ///
    /// Reconnecting replaces the previous channel.
    pub fn connect(&self, player: &PlayerId) -> mpsc::UnboundedReceiver<ClientMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry().insert(player.clone(), tx);
        debug!(player = %player, "Client connected");
        rx
    }

    pub fn disconnect(&self, player: &PlayerId) {
        self.registry().remove(player);
        debug!(player = %player, "Client disconnected");
    }

    pub fn is_connected(&self, player: &PlayerId) -> bool {
        self.registry()
            .get(player)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Lock the registry, recovering it if a holder panicked
    ///
    /// Registration changes are single map operations, so the map is never
    /// left half-updated.
    fn registry(&self) -> MutexGuard<'_, HashMap<PlayerId, mpsc::UnboundedSender<ClientMessage>>> {
        self.clients.lock().unwrap_or_else(|poisoned| {
            warn!(error = %poisoned, "Client registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl ClientLink for ChannelClientLink {
    fn send(&self, player: &PlayerId, message: ClientMessage) -> Result<(), LinkError> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| LinkError::Transport(format!("client registry poisoned: {e}")))?;

        let Some(tx) = clients.get(player) else {
            return Err(LinkError::RecipientGone(player.to_string()));
        };

        if tx.send(message).is_err() {
            clients.remove(player);
            return Err(LinkError::RecipientGone(player.to_string()));
        }
        Ok(())
    }
}
