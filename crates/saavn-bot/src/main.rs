//! Saavn → Telegram channel archiver bot.
//!
//! Listens for `/artist` and `/playlist` commands, pulls every song of the
//! requested target from the Saavn catalog API, converts each stream to a
//! tagged 320 kbps MP3 via ffmpeg, posts it to the configured channel and
//! records the upload in a SQLite ledger so it is never posted twice.

mod batch;
mod config;
mod download;
mod errors;
mod handlers;
mod ledger;
mod outbound;
mod pipeline;
mod progress;
mod transcode;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::batch::{ActiveRuns, BatchRunner};
use crate::config::Config;
use crate::handlers::App;
use crate::ledger::Ledger;
use crate::outbound::{Messenger, TelegramMessenger};
use crate::pipeline::TrackPipeline;

/// Saavn archiver bot CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/saavn-bot.toml")]
    config: String,

    /// Telegram bot token (overrides config file)
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    bot_token: Option<String>,

    /// Target channel id (overrides config file)
    #[arg(long, env = "TELEGRAM_CHANNEL_ID")]
    channel_id: Option<i64>,

    /// Ledger database URL (overrides config file)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saavn_bot=debug,saavn_api=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Saavn archiver bot");

    let args = Args::parse();

    let mut config = if Path::new(&args.config).exists() {
        info!("Loading config from file: {}", args.config);
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using environment variables");
        Config::from_env()?
    };

    if let Some(bot_token) = args.bot_token {
        config.telegram.bot_token = bot_token;
    }
    if let Some(channel_id) = args.channel_id {
        config.telegram.channel_id = channel_id;
    }
    if let Some(database_url) = args.database_url {
        config.storage.database_url = database_url;
    }
    config.validate()?;

    info!("Catalog API: {}", config.api.base_url);
    info!("Archive channel: {}", config.telegram.channel_id);

    std::fs::create_dir_all(&config.storage.download_dir)?;
    std::fs::create_dir_all(&config.storage.temp_dir)?;

    let ledger = Ledger::connect(&config.storage.database_url).await?;

    let catalog = saavn_api::SaavnClient::new(reqwest::Client::new(), config.api.base_url.clone());
    let media_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.limits.download_timeout_secs))
        .build()?;

    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram.bot_token);

    match bot.get_me().await {
        Ok(me) => info!("Bot authenticated as: @{}", me.username()),
        Err(e) => {
            error!("Failed to authenticate bot: {}", e);
            return Err(e.into());
        }
    }

    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(
        bot.clone(),
        config.telegram.channel_id,
    ));

    let pipeline = TrackPipeline::new(
        catalog.clone(),
        media_http,
        ledger.clone(),
        messenger.clone(),
        config.storage.download_dir.clone().into(),
        config.storage.temp_dir.clone().into(),
        config.limits.max_file_bytes(),
        config.limits.max_duration_secs,
    );

    let runner = Arc::new(BatchRunner::new(
        catalog,
        pipeline,
        messenger.clone(),
        ActiveRuns::new(),
        Duration::from_millis(config.limits.inter_track_delay_ms),
    ));

    let app = App { runner, messenger };

    info!("Bot initialized, starting message dispatcher...");

    let handler = Update::filter_message().branch(
        dptree::filter(|msg: Message| msg.text().is_some())
            .endpoint(handlers::handle_text_message),
    );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped, closing ledger");
    ledger.close().await;
    info!("Saavn archiver bot stopped");
    Ok(())
}
