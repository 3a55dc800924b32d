//! Client for the SunoAPI.org music generation API.
//!
//! Three endpoints behind one envelope shape (`{code, msg, data}`): start a
//! generation, fetch a task's status, fetch the credit balance. Completion is
//! observed by polling; the callback URL in the submit payload is a dummy.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_MODEL: &str = "V5";

/// Not served; generation progress is polled via `status` instead.
const CALLBACK_URL: &str = "https://example.com/callback";

/// Prompt limit when the provider writes the lyrics itself.
const AUTO_PROMPT_LIMIT: usize = 500;
/// Prompt limit in custom mode (explicit style/title).
const CUSTOM_PROMPT_LIMIT: usize = 5000;
const TITLE_LIMIT: usize = 80;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);
const BALANCE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub enum SunoError {
    /// Transport-level failure (connect, timeout, body read).
    Http(String),
    /// The provider reported an error, via HTTP status, envelope code,
    /// or a terminal-failure task status.
    Api { message: String, code: Option<i64> },
    /// A 200 response whose body we could not make sense of.
    Parse(String),
}

impl fmt::Display for SunoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SunoError::Http(e) => write!(f, "HTTP error: {e}"),
            SunoError::Api { message, code: Some(code) } => write!(f, "{message} (code {code})"),
            SunoError::Api { message, code: None } => write!(f, "{message}"),
            SunoError::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for SunoError {}

/// One finished track.
#[derive(Debug, Clone)]
pub struct SongResult {
    pub id: String,
    pub title: String,
    /// Empty when the provider returned no usable URL; such songs are
    /// not deliverable.
    pub audio_url: String,
    pub prompt: Option<String>,
    pub tags: Option<String>,
    pub duration: Option<f64>,
}

/// A task's current state and whatever tracks it has produced.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub task_id: String,
    /// Uppercased provider status, e.g. `PENDING` or `SUCCESS`.
    pub status: String,
    pub songs: Vec<SongResult>,
}

pub const STATUS_SUCCESS: &str = "SUCCESS";

pub struct SunoClient {
    api_key: String,
    base_url: String,
    failed_statuses: Vec<String>,
    http: reqwest::Client,
}

impl SunoClient {
    pub fn new(api_key: String, base_url: String, failed_statuses: Vec<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            failed_statuses,
            http: reqwest::Client::new(),
        }
    }

    /// Start a generation. Returns the task id to poll.
    ///
    /// Passing a non-empty `style` or `title` switches the request into
    /// custom mode (explicit style/title, longer prompt); otherwise the
    /// provider infers lyrics and style from the prompt alone.
    pub async fn generate(
        &self,
        prompt: &str,
        style: &str,
        title: &str,
        instrumental: bool,
        model: &str,
    ) -> Result<String, SunoError> {
        let payload = build_generate_payload(prompt, style, title, instrumental, model);

        let response = self
            .http
            .post(format!("{}/api/v1/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(GENERATE_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SunoError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SunoError::Http(e.to_string()))?;
        let task_id = parse_generate_response(status, &body)?;

        info!("Generation started, task_id={task_id}");
        Ok(task_id)
    }

    /// Fetch the current state of a task.
    ///
    /// A status from the configured terminal-failure set is reported as an
    /// error; songs are only extracted once the task has succeeded.
    pub async fn status(&self, task_id: &str) -> Result<GenerationResult, SunoError> {
        let response = self
            .http
            .get(format!("{}/api/v1/generate/record-info", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(STATUS_TIMEOUT)
            .query(&[("taskId", task_id)])
            .send()
            .await
            .map_err(|e| SunoError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SunoError::Http(e.to_string()))?;
        parse_status_response(status, &body, task_id, &self.failed_statuses)
    }

    /// Remaining credit balance.
    pub async fn balance(&self) -> Result<i64, SunoError> {
        let response = self
            .http
            .get(format!("{}/api/v1/generate/credit", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(BALANCE_TIMEOUT)
            .send()
            .await
            .map_err(|e| SunoError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SunoError::Http(e.to_string()))?;
        parse_balance_response(status, &body)
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct GeneratePayload {
    custom_mode: bool,
    instrumental: bool,
    model: String,
    prompt: String,
    call_back_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

fn build_generate_payload(
    prompt: &str,
    style: &str,
    title: &str,
    instrumental: bool,
    model: &str,
) -> GeneratePayload {
    if style.is_empty() && title.is_empty() {
        GeneratePayload {
            custom_mode: false,
            instrumental,
            model: model.to_string(),
            prompt: truncate_chars(prompt, AUTO_PROMPT_LIMIT),
            call_back_url: CALLBACK_URL.to_string(),
            style: None,
            title: None,
        }
    } else {
        GeneratePayload {
            custom_mode: true,
            instrumental,
            model: model.to_string(),
            prompt: truncate_chars(prompt, CUSTOM_PROMPT_LIMIT),
            call_back_url: CALLBACK_URL.to_string(),
            style: Some(if style.is_empty() { "Pop".to_string() } else { style.to_string() }),
            title: Some(truncate_chars(title, TITLE_LIMIT)),
        }
    }
}

/// Truncate to at most `max_chars` characters, never splitting a char.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Response envelope shared by all three endpoints.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: Option<i64>,
    msg: Option<String>,
    data: Option<serde_json::Value>,
}

/// Apply the shared error-mapping contract: non-200 HTTP or a non-200
/// envelope code is a provider error carrying the envelope's `msg` (or the
/// raw body, or the HTTP status as a last resort).
fn check_envelope(status: u16, body: &str) -> Result<Envelope, SunoError> {
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => {
            if status == 200 && envelope.code == Some(200) {
                Ok(envelope)
            } else {
                let message = envelope
                    .msg
                    .clone()
                    .filter(|m| !m.is_empty())
                    .or_else(|| non_empty(body))
                    .unwrap_or_else(|| format!("HTTP {status}"));
                Err(SunoError::Api { message, code: envelope.code })
            }
        }
        Err(e) if status == 200 => Err(SunoError::Parse(e.to_string())),
        Err(_) => Err(SunoError::Api {
            message: non_empty(body).unwrap_or_else(|| format!("HTTP {status}")),
            code: None,
        }),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Deserialize)]
struct GenerateData {
    #[serde(rename = "taskId")]
    task_id: Option<String>,
}

fn parse_generate_response(status: u16, body: &str) -> Result<String, SunoError> {
    let envelope = check_envelope(status, body)?;
    let data: GenerateData = match envelope.data {
        Some(value) => serde_json::from_value(value).map_err(|e| SunoError::Parse(e.to_string()))?,
        None => GenerateData { task_id: None },
    };

    data.task_id
        .filter(|id| !id.is_empty())
        .ok_or(SunoError::Api { message: "no taskId in response".to_string(), code: None })
}

#[derive(Debug, Default, Deserialize)]
struct RecordInfo {
    status: Option<String>,
    response: Option<RecordResponse>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    #[serde(rename = "sunoData")]
    suno_data: Option<Vec<RawTrack>>,
}

/// Track entry as the provider serializes it. Several deployments disagree
/// on the audio URL field name, so all known spellings are captured.
#[derive(Debug, Deserialize)]
struct RawTrack {
    #[serde(default)]
    id: String,
    title: Option<String>,
    #[serde(rename = "audioUrl")]
    audio_url: Option<String>,
    #[serde(rename = "audio_url")]
    audio_url_snake: Option<String>,
    #[serde(rename = "streamAudioUrl")]
    stream_audio_url: Option<String>,
    prompt: Option<String>,
    tags: Option<String>,
    duration: Option<f64>,
}

impl RawTrack {
    /// First non-empty of `audioUrl`, `audio_url`, `streamAudioUrl`.
    fn pick_audio_url(&self) -> String {
        [&self.audio_url, &self.audio_url_snake, &self.stream_audio_url]
            .into_iter()
            .flatten()
            .find(|url| !url.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    fn into_song(self) -> SongResult {
        let audio_url = self.pick_audio_url();
        SongResult {
            audio_url,
            id: self.id,
            title: self.title.filter(|t| !t.is_empty()).unwrap_or_else(|| "Unknown".to_string()),
            prompt: self.prompt,
            tags: self.tags,
            duration: self.duration,
        }
    }
}

fn parse_status_response(
    status: u16,
    body: &str,
    task_id: &str,
    failed_statuses: &[String],
) -> Result<GenerationResult, SunoError> {
    let envelope = check_envelope(status, body)?;
    let info: RecordInfo = match envelope.data {
        Some(value) => serde_json::from_value(value).map_err(|e| SunoError::Parse(e.to_string()))?,
        None => RecordInfo::default(),
    };

    let task_status = info.status.unwrap_or_default().to_uppercase();

    if failed_statuses.contains(&task_status) {
        let detail = info
            .error_message
            .filter(|m| !m.is_empty())
            .or_else(|| info.error_code.as_ref().map(json_to_string))
            .unwrap_or_else(|| task_status.clone());
        return Err(SunoError::Api { message: format!("generation failed: {detail}"), code: None });
    }

    // Tracks are only trustworthy once the task has actually finished;
    // intermediate payloads can carry partial stream entries.
    let songs = if task_status == STATUS_SUCCESS {
        info.response
            .and_then(|r| r.suno_data)
            .unwrap_or_default()
            .into_iter()
            .map(RawTrack::into_song)
            .collect()
    } else {
        Vec::new()
    };

    Ok(GenerationResult { task_id: task_id.to_string(), status: task_status, songs })
}

fn json_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_balance_response(status: u16, body: &str) -> Result<i64, SunoError> {
    let envelope = check_envelope(status, body)?;
    Ok(envelope.data.as_ref().and_then(serde_json::Value::as_i64).unwrap_or(0))
}
