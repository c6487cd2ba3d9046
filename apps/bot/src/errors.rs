use thiserror::Error;

use crate::models::SchemaError;
use crate::normalizer::NormalizeError;
use crate::render::RenderError;
use crate::telegram::TelegramError;

/// Everything that can end a CV generation attempt.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("CV backend returned status {0}")]
    UpstreamStatus(u16),

    #[error("CV backend reported an error: {0}")]
    UpstreamReported(String),

    #[error("could not reach CV backend: {0}")]
    Connection(#[source] reqwest::Error),

    #[error(transparent)]
    Malformed(#[from] NormalizeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("rendering task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to deliver document: {0}")]
    Delivery(#[from] TelegramError),
}

impl BotError {
    /// The reply shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            BotError::UpstreamStatus(code) => format!("Server error: {code}"),
            BotError::UpstreamReported(message) => format!("Server error: {message}"),
            BotError::Connection(_) => {
                "Sorry, couldn't connect to the CV generation service.".to_string()
            }
            BotError::Malformed(_) => "Error: Invalid JSON response from the server.".to_string(),
            BotError::Schema(_) => "Invalid CV data format received from the server.".to_string(),
            BotError::Render(_) | BotError::Join(_) | BotError::Delivery(_) => {
                "Sorry, there was an error creating your PDF.".to_string()
            }
        }
    }
}
