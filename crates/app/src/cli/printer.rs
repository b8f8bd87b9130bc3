//! Printing of client-bound messages
//!
//! Every attached player gets a task draining their client channel into a
//! line sink. [`ClientPrinters::finish`] closes the channels and waits for
//! the tasks, so no pushed message is lost when the program exits.

use minstrel_core::domain::audio::PlayerId;
use minstrel_infra::ChannelClientLink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct ClientPrinters {
    clients: Arc<ChannelClientLink>,
    tasks: Vec<(PlayerId, JoinHandle<()>)>,
}

impl ClientPrinters {
    pub fn new(clients: Arc<ChannelClientLink>) -> Self {
        Self {
            clients,
            tasks: Vec::new(),
        }
    }

    /// Connect `player` and forward each message as a JSON line to `sink`
    pub fn attach<F>(&mut self, player: &PlayerId, mut sink: F)
    where
        F: FnMut(String) + Send + 'static,
    {
        let mut rx = self.clients.connect(player);
        let task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match serde_json::to_string(&message) {
                    Ok(json) => sink(json),
                    Err(e) => warn!(error = %e, "Failed to encode client message"),
                }
            }
        });
        self.tasks.push((player.clone(), task));
    }

    /// Close every client channel and wait until all pending lines are out
    pub async fn finish(self) {
        for (player, _) in &self.tasks {
            self.clients.disconnect(player);
        }
        for (player, task) in self.tasks {
            if let Err(e) = task.await {
                warn!(player = %player, error = %e, "Client printer failed");
            }
        }
        debug!("Client printers finished");
    }
}
