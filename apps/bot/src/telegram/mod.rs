/// Telegram client: the single point of entry for all Bot API calls.
///
/// Long polling via `getUpdates`; replies via `sendMessage` and `sendDocument`.
/// Conversation code talks to the `ChatTransport` trait, never to this client
/// directly, so flows can be exercised without a live bot.
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub mod types;

pub use types::{Message, Update};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
/// Slack on top of the long-poll timeout before the HTTP request itself gives up.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API error ({code}): {description}")]
    Api { code: u16, description: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound side of a chat: what conversation flows need to reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), TelegramError>;

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
        caption: &str,
    ) -> Result<(), TelegramError>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(
        token: &str,
        api_url: &str,
        poll_timeout: Duration,
    ) -> Result<Self, TelegramError> {
        Ok(Self {
            client: Client::builder()
                .timeout(poll_timeout + HTTP_TIMEOUT_SLACK)
                .build()?,
            base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            poll_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// Long-polls for updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&request)
            .send()
            .await?;
        parse_response(response).await
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_to_message_id: reply_to,
        };
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;
        parse_response::<Message>(response).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
        caption: &str,
    ) -> Result<(), TelegramError> {
        let bytes = tokio::fs::read(path).await?;
        debug!("Uploading {file_name} ({} bytes) to chat {chat_id}", bytes.len());

        let document = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", document);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        parse_response::<Message>(response).await?;
        Ok(())
    }
}

/// Unwraps the Bot API envelope `{"ok": bool, "result": .., "description": ..}`.
async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TelegramError> {
    let status = response.status();
    let envelope: types::ApiResponse<T> = response.json().await?;
    match envelope.result {
        Some(result) if envelope.ok => Ok(result),
        _ => Err(TelegramError::Api {
            code: envelope.error_code.unwrap_or(status.as_u16()),
            description: envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
        }),
    }
}
