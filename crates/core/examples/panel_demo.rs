//! Example walking one player through join, a settings-panel edit and leave
//!
//! Run with: cargo run --package minstrel-core --example panel_demo

use minstrel_core::domain::audio::{AudioCategory, AudioHandle, AudioPlayback, PlayerId, Result};
use minstrel_core::domain::config::ConfigManager;
use minstrel_core::domain::messages::{AudioEvent, ClientLink, ClientMessage, LinkError};
use minstrel_core::domain::profile::{AudioProfile, PROFILE_STORAGE_KEY};
use minstrel_core::domain::settings_panel::SettingsPanel;
use minstrel_core::domain::storage::MemoryStorage;
use minstrel_core::AudioService;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Prints every playback command
struct PrintPlayback;

impl AudioPlayback for PrintPlayback {
    fn set_volume(&self, handle: &AudioHandle, volume: f32) -> Result<()> {
        println!("   ♪ {handle} volume {volume:.2}");
        Ok(())
    }

    fn play(&self, handle: &AudioHandle, player: &PlayerId) -> Result<()> {
        println!("   ♪ {handle} playing for {player}");
        Ok(())
    }

    fn pause(&self, handle: &AudioHandle, player: &PlayerId) -> Result<()> {
        println!("   ♪ {handle} paused for {player}");
        Ok(())
    }
}

/// Forwards pushes to the demo's "client"
struct ForwardClient(mpsc::UnboundedSender<ClientMessage>);

impl ClientLink for ForwardClient {
    fn send(&self, player: &PlayerId, message: ClientMessage) -> std::result::Result<(), LinkError> {
        self.0
            .send(message)
            .map_err(|_| LinkError::RecipientGone(player.to_string()))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("minstrel_core=debug,info")
        .init();

    println!("=== Minstrel Settings Panel Demo ===\n");

    // 1. Configuration in a scratch directory
    println!("1. Loading configuration...");
    let config_dir = tempfile::tempdir()?;
    let manager = ConfigManager::new(config_dir.path().to_path_buf());
    let mut config = manager.load().await;
    config.manager.settle_delay_ms = 200;
    config.manager.audio_settings_surface = Some("audio-settings".to_string());
    config.manager.join_music = Some("astral-projection".to_string());
    println!("   ✓ Config written to {}", manager.config_path().display());

    // 2. Start the audio service
    println!("\n2. Starting audio service...");
    let storage = Arc::new(MemoryStorage::new());
    let (push_tx, mut push_rx) = mpsc::unbounded_channel();
    let (service, task) = AudioService::start(
        config.manager.clone(),
        storage.clone(),
        Arc::new(ForwardClient(push_tx)),
        Arc::new(PrintPlayback),
    );

    // 3. Join and receive the profile
    println!("\n3. Player joins...");
    let player = PlayerId::new("wanderer");
    service
        .send(AudioEvent::PlayerEnterWorld {
            player: player.clone(),
        })
        .await?;

    let mut panel = SettingsPanel::new(player.clone(), Some(AudioHandle::new("preview-chime")));
    if let Some(ClientMessage::SetProfile(pushed)) = push_rx.recv().await {
        panel.apply(pushed.profile);
    }
    for category in AudioCategory::ALL {
        println!("   {}", panel.label(category));
    }

    // 4. Edit in the panel
    println!("\n4. Editing in the settings panel...");
    panel.slider_moved(AudioCategory::Music, 22.4);
    panel.slider_moved(AudioCategory::Sfx, 140.0);
    if let Some(preview) = panel.slider_lost_focus(AudioCategory::Music) {
        println!("   Preview {} at {:.2}", preview.handle, preview.volume);
    }
    println!("   {}", panel.label(AudioCategory::Music));
    println!("   {}", panel.label(AudioCategory::Sfx));

    if let Some(edit) = panel.commit() {
        service.send(AudioEvent::SetProfile(edit)).await?;
    }

    // 5. Leave, which flushes the profile
    println!("\n5. Player leaves...");
    service
        .send(AudioEvent::PlayerExitWorld {
            player: player.clone(),
        })
        .await?;
    service.shutdown().await?;
    task.await?;

    if let Some(bytes) = storage.snapshot(&player, PROFILE_STORAGE_KEY) {
        let saved = AudioProfile::from_bytes(&bytes)?;
        println!(
            "   ✓ Saved: music {}%, sfx {}%",
            saved.music_volume.value(),
            saved.sfx_volume.value()
        );
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
