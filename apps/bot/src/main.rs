mod backend_client;
mod config;
mod conversation;
mod dispatcher;
mod errors;
mod flow;
mod models;
mod normalizer;
mod render;
mod telegram;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backend_client::CvBackendClient;
use crate::config::BotConfig;
use crate::dispatcher::{poll_updates, Dispatcher};
use crate::flow::BotContext;
use crate::render::default_page_style;
use crate::telegram::TelegramClient;

/// Buffered updates between the poller and the dispatcher.
const UPDATE_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = BotConfig::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV bot v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(&config.pdf_output_dir).with_context(|| {
        format!(
            "PDF_OUTPUT_DIR '{}' is not usable",
            config.pdf_output_dir.display()
        )
    })?;

    let telegram = TelegramClient::new(
        &config.telegram_bot_key,
        &config.telegram_api_url,
        config.poll_timeout,
    )?;
    let backend = CvBackendClient::new(&config.cv_backend_url)?;
    info!("CV backend: {}", config.cv_backend_url);

    let ctx = Arc::new(BotContext {
        backend,
        transport: Arc::new(telegram.clone()),
        page_style: default_page_style(),
        fonts: config.fonts.clone(),
        output_dir: config.pdf_output_dir.clone(),
    });

    let (tx, rx) = mpsc::channel(UPDATE_QUEUE);
    tokio::spawn(poll_updates(telegram, tx));

    info!("Polling for updates");
    tokio::select! {
        _ = Dispatcher::new(ctx, config.session_idle).run(rx) => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
