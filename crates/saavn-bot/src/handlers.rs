//! Inbound command handling for Telegram updates

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::markdown::escape;
use tracing::{error, info, warn};

use crate::batch::{BatchRunner, BatchTarget, TargetKind};
use crate::outbound::Messenger;

/// Shared state injected into the dispatcher.
#[derive(Clone)]
pub struct App {
    pub runner: Arc<BatchRunner>,
    pub messenger: Arc<dyn Messenger>,
}

const HELP_TEXT: &str = "🎵 *Saavn Downloader Bot*\n\n\
*Commands:*\n\
/artist `<artistId>` \\- Download all songs by artist\n\
/playlist `<playlistId>` \\- Download all songs from playlist\n\
/status \\- Check active downloads\n\
/help \\- Show this message\n\n\
*Examples:*\n\
`/artist 455782`\n\
`/playlist 159470188`\n\n\
Songs are sent to the configured channel and recorded in the database\\.";

/// Handle text messages; anything that is not a command is ignored.
pub async fn handle_text_message(_bot: Bot, msg: Message, app: App) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default();
    if !text.starts_with('/') {
        return Ok(());
    }

    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(());
    }

    let command = parts[0].trim_start_matches('/').to_lowercase();
    let args: Vec<&str> = parts[1..].to_vec();
    let chat_id = msg.chat.id.0;

    info!(
        "Received command: {} with {} args from {}",
        command,
        args.len(),
        msg.from.as_ref().map(|u| u.id.0).unwrap_or(0)
    );

    match command.as_str() {
        "artist" => start_batch(&app, chat_id, TargetKind::Artist, args.first().copied()).await,
        "playlist" => start_batch(&app, chat_id, TargetKind::Playlist, args.first().copied()).await,
        "status" => send_active_runs(&app, chat_id).await,
        "help" | "start" => {
            if let Err(e) = app.messenger.send_status(chat_id, HELP_TEXT).await {
                error!("Failed to send help text: {}", e);
            }
        }
        other => warn!("Ignoring unknown command: /{}", other),
    }

    Ok(())
}

/// Acknowledge the request and spawn the batch run in the background so the
/// dispatcher keeps serving other chats.
async fn start_batch(app: &App, chat_id: i64, kind: TargetKind, id: Option<&str>) {
    let id = match id {
        Some(id) => id.to_string(),
        None => {
            let usage = escape(&format!(
                "Usage: /{} <id>",
                kind.label().to_lowercase()
            ));
            if let Err(e) = app.messenger.send_status(chat_id, &usage).await {
                error!("Failed to send usage hint: {}", e);
            }
            return;
        }
    };

    let ack = format!(
        "🔍 Fetching {} info for ID: `{}`{}",
        kind.label().to_lowercase(),
        escape(&id),
        escape("...")
    );
    if let Err(e) = app.messenger.send_status(chat_id, &ack).await {
        error!("Failed to acknowledge command: {}", e);
    }

    let runner = app.runner.clone();
    let target = BatchTarget { kind, id };
    tokio::spawn(async move {
        runner.run(target, chat_id).await;
    });
}

async fn send_active_runs(app: &App, chat_id: i64) {
    let keys = app.runner.active_keys();
    let text = if keys.is_empty() {
        escape("✅ No active downloads")
    } else {
        format!(
            "📥 *Active Downloads:*\n• {}",
            escape(&keys.join("\n• "))
        )
    };
    if let Err(e) = app.messenger.send_status(chat_id, &text).await {
        error!("Failed to send status: {}", e);
    }
}
