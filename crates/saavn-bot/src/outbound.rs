//! Outbound Telegram surface: status messages to the requesting chat and
//! audio uploads to the archive channel.
//!
//! Everything above this module talks to the [`Messenger`] trait, so batch
//! runs and the pipeline can be driven against a recording fake in tests.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, MessageId, ParseMode};
use teloxide::{ApiError, Bot, RequestError};
use tracing::debug;

/// A finished MP3 on its way to the channel.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub path: PathBuf,
    pub caption: String,
    pub title: String,
    pub performer: String,
    pub duration_secs: u32,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a MarkdownV2 status message; returns its message id for edits.
    async fn send_status(&self, chat_id: i64, text: &str) -> Result<i32>;

    /// Edit a previously sent status message. An unchanged body is not an
    /// error.
    async fn edit_status(&self, chat_id: i64, message_id: i32, text: &str) -> Result<()>;

    /// Upload an MP3 to the archive channel; returns the channel message id.
    async fn send_audio(&self, upload: AudioUpload) -> Result<i64>;
}

/// Production implementation over a teloxide [`Bot`].
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    channel_id: ChatId,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, channel_id: i64) -> Self {
        Self {
            bot,
            channel_id: ChatId(channel_id),
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_status(&self, chat_id: i64, text: &str) -> Result<i32> {
        let mut req = self.bot.send_message(ChatId(chat_id), text);
        req.parse_mode = Some(ParseMode::MarkdownV2);
        let sent = req.await?;
        Ok(sent.id.0)
    }

    async fn edit_status(&self, chat_id: i64, message_id: i32, text: &str) -> Result<()> {
        let mut req = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text);
        req.parse_mode = Some(ParseMode::MarkdownV2);

        match req.await {
            Ok(_) => Ok(()),
            // Throttled progress edits can race to an identical body.
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                debug!("Progress edit skipped: message not modified");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn send_audio(&self, upload: AudioUpload) -> Result<i64> {
        let audio = InputFile::file(upload.path);
        let mut req = self.bot.send_audio(self.channel_id, audio);
        req.caption = Some(upload.caption);
        req.title = Some(upload.title);
        req.performer = Some(upload.performer);
        req.duration = Some(upload.duration_secs);

        let sent = req.await?;
        Ok(sent.id.0 as i64)
    }
}
