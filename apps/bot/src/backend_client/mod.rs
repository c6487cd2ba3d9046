/// Client for the CV generation service (`GET /generate_cv`).
///
/// Returns the model's raw text; cleaning it up is the normalizer's job.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::BotError;
use crate::models::CvRequest;

pub const DEFAULT_BACKEND_URL: &str = "http://cv-backend:8000";
/// Generation is one model call; allow for a slow model.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Clone)]
pub struct CvBackendClient {
    client: Client,
    base_url: String,
}

impl CvBackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn generate_cv(&self, request: &CvRequest) -> Result<String, BotError> {
        let response = self
            .client
            .get(format!("{}/generate_cv", self.base_url))
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(BotError::Connection)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("CV backend returned {status}");
            return Err(BotError::UpstreamStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(BotError::Connection)?;
        debug!("CV backend returned {} bytes", body.len());
        decode_body(body)
    }
}

/// The service answers with the model text encoded as a JSON string.
/// Anything that is not a string literal is passed through untouched.
fn decode_body(body: String) -> Result<String, BotError> {
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::String(text)) => Ok(text),
        Ok(Value::Object(map)) => match map.get("error") {
            Some(Value::String(message)) => Err(BotError::UpstreamReported(message.clone())),
            _ => Ok(body),
        },
        _ => Ok(body),
    }
}
