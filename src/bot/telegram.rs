//! Telegram send boundary.

use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode};
use tracing::warn;
use url::Url;

/// Telegram's caption length limit.
pub const CAPTION_LIMIT: usize = 1024;

/// Outbound operations used by the generation flow.
///
/// `TelegramClient` is the production implementation; tests substitute a
/// recording mock so the flow runs without a live bot.
#[allow(async_fn_in_trait)]
pub trait Messenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64, String>;
    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<(), String>;
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), String>;
    /// Send a remote audio file with a Markdown caption.
    async fn send_audio(
        &self,
        chat_id: i64,
        audio_url: &str,
        title: &str,
        caption: &str,
    ) -> Result<i64, String>;
    /// Send a remote file as a generic document attachment.
    async fn send_document(
        &self,
        chat_id: i64,
        document_url: &str,
        caption: &str,
    ) -> Result<i64, String>;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64, String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<(), String> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id as i32), text)
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to edit message: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), String> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id as i32))
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to delete message: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn send_audio(
        &self,
        chat_id: i64,
        audio_url: &str,
        title: &str,
        caption: &str,
    ) -> Result<i64, String> {
        let url = Url::parse(audio_url).map_err(|e| format!("Bad audio URL '{audio_url}': {e}"))?;

        self.bot
            .send_audio(ChatId(chat_id), InputFile::url(url))
            .title(title)
            .caption(caption)
            .parse_mode(ParseMode::Markdown)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send audio: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn send_document(
        &self,
        chat_id: i64,
        document_url: &str,
        caption: &str,
    ) -> Result<i64, String> {
        let url =
            Url::parse(document_url).map_err(|e| format!("Bad document URL '{document_url}': {e}"))?;

        self.bot
            .send_document(ChatId(chat_id), InputFile::url(url))
            .caption(caption)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send document: {e}");
                warn!("{}", msg);
                msg
            })
    }
}
