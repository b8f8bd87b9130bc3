//! Minstrel CLI Application
//!
//! Replays a JSON-lines event script against the audio manager, using file
//! storage and an in-process gizmo host, and prints every message pushed to
//! a client as a JSON line on stdout.

mod printer;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use minstrel_core::domain::audio::AudioHandle;
use minstrel_core::domain::config::{ConfigManager, MinstrelConfig};
use minstrel_core::domain::messages::AudioEvent;
use minstrel_core::AudioService;
use minstrel_infra::{ChannelClientLink, FileStorage, GizmoHost};
use printer::ClientPrinters;
use script::{parse_line, ScriptStep};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minstrel")]
#[command(about = "Per-player audio preferences and playback routing", long_about = None)]
struct Cli {
    /// Event script (JSON lines); reads stdin when omitted
    script: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the player data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Persist every profile edit immediately
    #[arg(long)]
    persist_every_change: bool,

    /// Surface whose focus pauses music and ambient audio
    #[arg(long)]
    surface: Option<String>,

    /// Music handle played for each player once their join settles
    #[arg(long)]
    join_music: Option<String>,

    /// Audio gizmo to register with the host (repeatable)
    #[arg(long = "gizmo")]
    gizmos: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("🎻 Minstrel starting...");

    let config = load_config(&cli).await?;
    run(config, &cli).await
}

async fn load_config(cli: &Cli) -> Result<MinstrelConfig> {
    let mut config = match &cli.config {
        Some(path) => MinstrelConfig::load_from_file(path)
            .await
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let dir = ConfigManager::default_config_dir()?;
            ConfigManager::new(dir).load().await
        }
    };

    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if cli.persist_every_change {
        config.manager.persist_every_change = true;
    }
    if let Some(surface) = &cli.surface {
        config.manager.audio_settings_surface = Some(surface.clone());
    }
    if let Some(handle) = &cli.join_music {
        config.manager.join_music = Some(handle.clone());
    }

    config.validate()?;
    Ok(config)
}

async fn run(config: MinstrelConfig, cli: &Cli) -> Result<()> {
    let gizmos = Arc::new(GizmoHost::new());
    for handle in cli.gizmos.iter().chain(config.manager.join_music.iter()) {
        gizmos.register(AudioHandle::new(handle.clone()));
    }

    let storage = Arc::new(FileStorage::new(config.storage.data_dir.clone()));
    let clients = Arc::new(ChannelClientLink::new());
    info!(data_dir = %storage.data_dir().display(), "Using file storage");

    let (service, task) =
        AudioService::start(config.manager.clone(), storage, clients.clone(), gizmos);
    let mut printers = ClientPrinters::new(clients.clone());

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &cli.script {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open script {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let mut lines = BufReader::new(reader).lines();
    let mut line_no = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let step = match parse_line(line_no, &line) {
            Ok(Some(step)) => step,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Skipping script line");
                continue;
            }
        };

        match step {
            ScriptStep::Wait { wait_ms } => tokio::time::sleep(Duration::from_millis(wait_ms)).await,
            ScriptStep::Event(event) => {
                match &event {
                    AudioEvent::PlayerEnterWorld { player } => {
                        printers.attach(player, |line| println!("{line}"));
                        service.send(event).await?;
                    }
                    AudioEvent::PlayerExitWorld { player } => {
                        let player = player.clone();
                        service.send(event).await?;
                        clients.disconnect(&player);
                    }
                    _ => service.send(event).await?,
                }
            }
        }
    }

    let flushed = service.shutdown().await?;
    task.await?;
    printers.finish().await;
    info!(flushed, "Minstrel stopped");
    Ok(())
}
