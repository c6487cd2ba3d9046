use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::backend_client::DEFAULT_BACKEND_URL;
use crate::render::FontSource;
use crate::telegram::DEFAULT_API_URL;

/// Bot configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_bot_key: String,
    pub telegram_api_url: String,
    pub cv_backend_url: String,
    pub pdf_output_dir: PathBuf,
    pub session_idle: Duration,
    pub poll_timeout: Duration,
    pub fonts: FontSource,
    pub rust_log: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(BotConfig {
            telegram_bot_key: require_env("TELEGRAM_BOT_KEY")?,
            telegram_api_url: env_or("TELEGRAM_API_URL", DEFAULT_API_URL),
            cv_backend_url: env_or("CV_BACKEND_URL", DEFAULT_BACKEND_URL),
            pdf_output_dir: std::env::var("PDF_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            session_idle: Duration::from_secs(secs_env("SESSION_IDLE_SECS", 1800)?),
            poll_timeout: Duration::from_secs(secs_env("POLL_TIMEOUT_SECS", 30)?),
            fonts: font_source(
                std::env::var("CV_FONT_REGULAR").ok(),
                std::env::var("CV_FONT_BOLD").ok(),
            )?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs_env(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds")),
        Err(_) => Ok(default),
    }
}

/// Both TTF paths or neither.
fn font_source(regular: Option<String>, bold: Option<String>) -> Result<FontSource> {
    match (regular, bold) {
        (None, None) => Ok(FontSource::Builtin),
        (Some(regular), Some(bold)) => Ok(FontSource::External {
            regular: PathBuf::from(regular),
            bold: PathBuf::from(bold),
        }),
        _ => bail!("CV_FONT_REGULAR and CV_FONT_BOLD must be set together"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_source_requires_both_paths() {
        assert_eq!(font_source(None, None).unwrap(), FontSource::Builtin);
        assert_eq!(
            font_source(Some("r.ttf".into()), Some("b.ttf".into())).unwrap(),
            FontSource::External {
                regular: PathBuf::from("r.ttf"),
                bold: PathBuf::from("b.ttf"),
            }
        );
        assert!(font_source(Some("r.ttf".into()), None).is_err());
    }
}
