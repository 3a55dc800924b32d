//! Generation request lifecycle: submit, poll until terminal, deliver.
//!
//! One linear chain per request: `submitted → polling → {success | failed |
//! timed-out}`. The flow is generic over the provider and the transport so
//! every transition is testable without the network.

use std::fmt;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::bot::telegram::{CAPTION_LIMIT, Messenger};
use crate::suno::{
    DEFAULT_MODEL, GenerationResult, STATUS_SUCCESS, SongResult, SunoClient, SunoError,
    truncate_chars,
};

/// Max chars of the song's prompt echoed into the caption.
const CAPTION_PROMPT_LIMIT: usize = 500;

/// Provider operations used by the flow.
#[allow(async_fn_in_trait)]
pub trait GenerationBackend {
    async fn submit(&self, prompt: &str, instrumental: bool) -> Result<String, SunoError>;
    async fn poll(&self, task_id: &str) -> Result<GenerationResult, SunoError>;
}

impl GenerationBackend for SunoClient {
    async fn submit(&self, prompt: &str, instrumental: bool) -> Result<String, SunoError> {
        // Free-text requests go out in auto-lyrics mode: no style or title,
        // the provider infers both from the description.
        self.generate(prompt, "", "", instrumental, DEFAULT_MODEL).await
    }

    async fn poll(&self, task_id: &str) -> Result<GenerationResult, SunoError> {
        self.status(task_id).await
    }
}

#[derive(Debug)]
pub enum PollError {
    Provider(SunoError),
    /// The poll budget ran out before the task reached a terminal state.
    TimedOut(u64),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Provider(e) => write!(f, "{e}"),
            PollError::TimedOut(secs) => write!(f, "generation exceeded {secs}s"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub poll_interval_sec: u64,
    pub timeout_sec: u64,
}

/// Poll a task until it succeeds, fails, or the budget runs out.
///
/// Makes at most `timeout / interval` status calls; a terminal-failure
/// status surfaces as `PollError::Provider` via the backend.
pub async fn poll_until_complete<B: GenerationBackend>(
    backend: &B,
    task_id: &str,
    settings: &GenerationSettings,
) -> Result<GenerationResult, PollError> {
    let mut elapsed = 0;
    while elapsed < settings.timeout_sec {
        let result = backend.poll(task_id).await.map_err(PollError::Provider)?;
        if result.status == STATUS_SUCCESS {
            return Ok(result);
        }
        tokio::time::sleep(Duration::from_secs(settings.poll_interval_sec)).await;
        elapsed += settings.poll_interval_sec;
    }
    Err(PollError::TimedOut(settings.timeout_sec))
}

/// Handle to the "in progress" status message.
///
/// Every exit path accounts for it: on success it is deleted, on failure or
/// timeout it is edited in place into the final reply.
struct StatusMessage<'a, M: Messenger> {
    messenger: &'a M,
    chat_id: i64,
    message_id: i64,
}

impl<'a, M: Messenger> StatusMessage<'a, M> {
    async fn send(messenger: &'a M, chat_id: i64, text: &str) -> Result<Self, String> {
        let message_id = messenger.send_text(chat_id, text).await?;
        Ok(Self { messenger, chat_id, message_id })
    }

    /// Repurpose the status message as the final reply.
    async fn finish_with(self, text: &str) {
        if let Err(e) = self.messenger.edit_text(self.chat_id, self.message_id, text).await {
            warn!("Failed to edit status message: {e}");
        }
    }

    async fn discard(self) {
        if let Err(e) = self.messenger.delete_message(self.chat_id, self.message_id).await {
            warn!("Failed to delete status message: {e}");
        }
    }
}

/// Run one generation request end to end.
pub async fn run_generation<B: GenerationBackend, M: Messenger>(
    backend: &B,
    messenger: &M,
    chat_id: i64,
    text: &str,
    instrumental: bool,
    settings: &GenerationSettings,
) {
    let text = text.trim();
    if text.is_empty() {
        if let Err(e) = messenger.send_text(chat_id, "Send a song description as text.").await {
            warn!("Failed to reply to empty request: {e}");
        }
        return;
    }

    let status = match StatusMessage::send(
        messenger,
        chat_id,
        "⏳ Generating your song, this takes ~1-2 minutes...",
    )
    .await
    {
        Ok(status) => status,
        Err(e) => {
            warn!("Failed to send status message: {e}");
            return;
        }
    };

    let task_id = match backend.submit(text, instrumental).await {
        Ok(task_id) => task_id,
        Err(e) => {
            error!("Generate failed: {e}");
            status.finish_with(&format!("❌ Generation error: {e}")).await;
            return;
        }
    };

    let result = match poll_until_complete(backend, &task_id, settings).await {
        Ok(result) => result,
        Err(PollError::TimedOut(secs)) => {
            warn!("Task {task_id} timed out after {secs}s");
            status.finish_with(&format!("⏱ Generation exceeded {secs}s. Try again later.")).await;
            return;
        }
        Err(PollError::Provider(e)) => {
            error!("Poll failed for task {task_id}: {e}");
            status.finish_with(&format!("❌ Error: {e}")).await;
            return;
        }
    };

    info!("🎵 Task {task_id} finished with {} song(s)", result.songs.len());

    for song in &result.songs {
        if song.audio_url.is_empty() {
            continue;
        }
        deliver_song(messenger, chat_id, song).await;
    }

    status.discard().await;
}

/// Deliver one song, degrading from audio to document to a bare link.
/// Failures here never abort the surrounding loop.
async fn deliver_song<M: Messenger>(messenger: &M, chat_id: i64, song: &SongResult) {
    let caption = song_caption(song);

    match messenger.send_audio(chat_id, &song.audio_url, &song.title, &caption).await {
        Ok(_) => return,
        Err(e) => warn!("Failed to send audio, trying as document: {e}"),
    }

    match messenger.send_document(chat_id, &song.audio_url, &caption).await {
        Ok(_) => return,
        Err(e) => error!("Failed to send document: {e}"),
    }

    let fallback = format!("Could not attach the audio. Link: {}", song.audio_url);
    if let Err(e) = messenger.send_text(chat_id, &fallback).await {
        error!("Failed to send fallback link: {e}");
    }
}

fn song_caption(song: &SongResult) -> String {
    let mut caption = format!("🎵 *{}*", song.title);
    if let Some(prompt) = song.prompt.as_deref().filter(|p| !p.is_empty()) {
        caption.push_str("\n\n");
        caption.push_str(&truncate_chars(prompt, CAPTION_PROMPT_LIMIT));
    }
    truncate_chars(&caption, CAPTION_LIMIT)
}
