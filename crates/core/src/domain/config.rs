//! Configuration management for Minstrel
//!
//! This module provides:
//! - Configuration structs for the audio manager and player storage
//! - TOML serialization and file load/save
//! - A configuration manager that falls back to defaults on missing or
//!   corrupt files

use crate::domain::audio::{AudioHandle, SurfaceId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Audio manager behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Wait between a join notification and the profile push, in ms
    pub settle_delay_ms: u64,

    /// Flush to storage after every client edit instead of only on exit
    pub persist_every_change: bool,

    /// Surface whose focus pauses continuous audio (None = focus ignored)
    pub audio_settings_surface: Option<String>,

    /// Capacity of the event inbox
    pub inbox_capacity: usize,

    /// Music handle played for every player once their join settles
    pub join_music: Option<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            persist_every_change: false,
            audio_settings_surface: None,
            inbox_capacity: 256,
            join_music: None,
        }
    }
}

impl ManagerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn audio_settings_surface(&self) -> Option<SurfaceId> {
        self.audio_settings_surface.clone().map(SurfaceId::new)
    }

    pub fn join_music(&self) -> Option<AudioHandle> {
        self.join_music.clone().map(AudioHandle::new)
    }
}

/// Player storage location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding per-player data files
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("player-data"),
        }
    }
}

/// Complete Minstrel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinstrelConfig {
    pub manager: ManagerConfig,
    pub storage: StorageConfig,
}

impl MinstrelConfig {
    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to TOML file
    #[instrument(skip(self, path))]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving configuration");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).await?;

        debug!("Configuration saved successfully");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.manager.inbox_capacity == 0 {
            return Err(ConfigError::Invalid(
                "manager.inbox_capacity must be greater than zero".to_string(),
            ));
        }
        if matches!(self.manager.audio_settings_surface.as_deref(), Some("")) {
            return Err(ConfigError::Invalid(
                "manager.audio_settings_surface must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration manager for the main Minstrel config
///
/// Manages the configuration file at `~/.config/minstrel/config.toml`.
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_path = config_dir.join("config.toml");
        Self {
            config_dir,
            config_path,
        }
    }

    /// Get the default config directory path
    ///
    /// Returns `~/.config/minstrel` on Linux, the platform equivalent elsewhere
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("minstrel"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file
    ///
    /// If the config file doesn't exist, writes and returns the defaults.
    /// If the config file is corrupt, logs an error, keeps a `.corrupt`
    /// copy and returns the defaults.
    #[instrument(skip(self))]
    pub async fn load(&self) -> MinstrelConfig {
        if !self.config_path.exists() {
            info!(
                path = %self.config_path.display(),
                "Config file not found, creating default"
            );

            let config = MinstrelConfig::default();
            if let Err(e) = self.save(&config).await {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to save default config"
                );
            }
            return config;
        }

        match MinstrelConfig::load_from_file(&self.config_path).await {
            Ok(config) => config,
            Err(e) => {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to load config, using defaults"
                );

                let backup_path = self.config_path.with_extension("toml.corrupt");
                if let Err(copy_err) = fs::copy(&self.config_path, &backup_path).await {
                    error!(
                        path = %backup_path.display(),
                        error = %copy_err,
                        "Failed to backup corrupt config"
                    );
                }

                MinstrelConfig::default()
            }
        }
    }

    #[instrument(skip(self, config))]
    pub async fn save(&self, config: &MinstrelConfig) -> Result<()> {
        fs::create_dir_all(&self.config_dir).await?;
        config.save_to_file(&self.config_path).await
    }

    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }
}
