//! Configuration management for saavn-bot

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitConfig,
}

/// Telegram-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub bot_token: String,
    /// Channel the converted audio files are posted to
    pub channel_id: i64,
}

/// Catalog API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Filesystem and database locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database holding the uploaded-track ledger
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Final MP3s are written here before upload
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    /// Per-track scratch files (raw audio, thumbnails)
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
}

/// Cost-control limits for the per-track pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Ceiling for both the raw download and the converted file
    #[serde(default = "default_max_file_mb")]
    pub max_file_mb: u64,
    /// Songs longer than this are skipped without downloading
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u32,
    /// Connect/read timeout for media downloads
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Pause between songs, to stay under upstream rate limits
    #[serde(default = "default_inter_track_delay_ms")]
    pub inter_track_delay_ms: u64,
}

impl LimitConfig {
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb * 1024 * 1024
    }
}

fn default_base_url() -> String {
    "https://saavn.sumit.co".to_string()
}

fn default_database_url() -> String {
    "sqlite://saavn-bot.db".to_string()
}

fn default_download_dir() -> String {
    "downloads".to_string()
}

fn default_temp_dir() -> String {
    "temp".to_string()
}

fn default_max_file_mb() -> u64 {
    50
}

fn default_max_duration_secs() -> u32 {
    900
}

fn default_download_timeout_secs() -> u64 {
    60
}

fn default_inter_track_delay_ms() -> u64 {
    500
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            download_dir: default_download_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_file_mb: default_max_file_mb(),
            max_duration_secs: default_max_duration_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            inter_track_delay_ms: default_inter_track_delay_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from environment variables alone
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .context("TELEGRAM_BOT_TOKEN not set and no config file found")?;
        let channel_id = std::env::var("TELEGRAM_CHANNEL_ID")
            .context("TELEGRAM_CHANNEL_ID not set and no config file found")?
            .parse::<i64>()
            .context("TELEGRAM_CHANNEL_ID is not a valid chat id")?;

        let config = Config {
            telegram: TelegramConfig {
                bot_token,
                channel_id,
            },
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            limits: LimitConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            anyhow::bail!("telegram.bot_token must not be empty");
        }
        if self.telegram.channel_id == 0 {
            anyhow::bail!("telegram.channel_id must not be zero");
        }
        if self.limits.max_file_mb == 0 {
            anyhow::bail!("limits.max_file_mb must be positive");
        }
        Ok(())
    }
}
