//! Event loop running the synchronizer
//!
//! All events enter through one bounded inbox and are handled to completion
//! one at a time, interleaved with settled join tickets. A leave therefore
//! always observes the edits that arrived before it, and its storage flush
//! finishes before the next event is looked at.

use crate::domain::audio::AudioPlayback;
use crate::domain::config::ManagerConfig;
use crate::domain::messages::{AudioEvent, ClientLink};
use crate::domain::storage::PlayerStorage;
use crate::domain::sync::{JoinTicket, Synchronizer};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The event loop has stopped
    #[error("Audio service is not running")]
    Closed,
}

enum Command {
    Event(AudioEvent),
    Shutdown(oneshot::Sender<usize>),
}

/// Cloneable sender side of a running [`AudioService`]
#[derive(Clone)]
pub struct AudioServiceHandle {
    tx: mpsc::Sender<Command>,
}

impl AudioServiceHandle {
    /// Queue an event, waiting for inbox capacity
    pub async fn send(&self, event: AudioEvent) -> Result<(), ServiceError> {
        self.tx
            .send(Command::Event(event))
            .await
            .map_err(|_| ServiceError::Closed)
    }

    /// Flush every live profile and stop the loop
    ///
    /// Returns the number of profiles persisted.
    pub async fn shutdown(&self) -> Result<usize, ServiceError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown(ack_tx))
            .await
            .map_err(|_| ServiceError::Closed)?;
        ack_rx.await.map_err(|_| ServiceError::Closed)
    }
}

pub struct AudioService;

impl AudioService {
    /// Build a synchronizer from its collaborators and start the loop
    pub fn start(
        config: ManagerConfig,
        storage: Arc<dyn PlayerStorage>,
        client: Arc<dyn ClientLink>,
        playback: Arc<dyn AudioPlayback>,
    ) -> (AudioServiceHandle, JoinHandle<()>) {
        let capacity = config.inbox_capacity.max(1);
        let (sync, tickets) = Synchronizer::new(config, storage, client, playback);
        Self::spawn(sync, tickets, capacity)
    }

    /// Start the loop around an existing synchronizer
    pub fn spawn(
        sync: Synchronizer,
        tickets: mpsc::UnboundedReceiver<JoinTicket>,
        capacity: usize,
    ) -> (AudioServiceHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(run(sync, rx, tickets));
        (AudioServiceHandle { tx }, task)
    }
}

async fn run(
    mut sync: Synchronizer,
    mut inbox: mpsc::Receiver<Command>,
    mut tickets: mpsc::UnboundedReceiver<JoinTicket>,
) {
    info!("Audio service started");

    loop {
        tokio::select! {
            command = inbox.recv() => match command {
                Some(Command::Event(event)) => {
                    debug!(player = %event.player(), ?event, "Handling event");
                    sync.handle(event).await;
                }
                Some(Command::Shutdown(ack)) => {
                    let flushed = sync.flush_all().await;
                    let _ = ack.send(flushed);
                    break;
                }
                None => {
                    sync.flush_all().await;
                    break;
                }
            },
            Some(ticket) = tickets.recv() => {
                sync.complete_join(ticket).await;
            }
        }
    }

    info!("Audio service stopped");
}
