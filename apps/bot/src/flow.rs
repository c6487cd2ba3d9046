//! CV generation flow: backend → normalizer → schema → PDF → chat.
//!
//! Exactly one reply per run: the document on success, one error text otherwise.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::backend_client::CvBackendClient;
use crate::conversation::SessionKey;
use crate::errors::BotError;
use crate::models::{CvRecord, CvRequest};
use crate::normalizer;
use crate::render::{write_cv_pdf, FontSource, PageStyle};
use crate::telegram::ChatTransport;

pub const SUCCESS_CAPTION: &str = "Here's your generated CV in PDF format! 📄";

/// Shared by every session worker.
pub struct BotContext {
    pub backend: CvBackendClient,
    pub transport: Arc<dyn ChatTransport>,
    pub page_style: PageStyle,
    pub fonts: FontSource,
    pub output_dir: PathBuf,
}

/// Runs the whole pipeline for one submitted form and replies to the user.
pub async fn generate_and_deliver(ctx: &BotContext, session: SessionKey, request: CvRequest) {
    match build_and_send(ctx, session, &request).await {
        Ok(()) => info!(
            chat_id = session.chat_id,
            user_id = session.user_id,
            "CV delivered"
        ),
        Err(e) => {
            error!(
                chat_id = session.chat_id,
                user_id = session.user_id,
                "CV generation failed: {e}"
            );
            if let Err(send_err) = ctx
                .transport
                .send_text(session.chat_id, &e.user_message(), None)
                .await
            {
                warn!("Failed to report error to chat {}: {send_err}", session.chat_id);
            }
        }
    }
}

async fn build_and_send(
    ctx: &BotContext,
    session: SessionKey,
    request: &CvRequest,
) -> Result<(), BotError> {
    let raw = ctx.backend.generate_cv(request).await?;
    let cleaned = normalizer::normalize(&raw)?;
    let record = CvRecord::from_normalized(&cleaned)?;

    let style = ctx.page_style.clone();
    let fonts = ctx.fonts.clone();
    let dir = ctx.output_dir.clone();
    let user_id = session.user_id;
    let pdf = tokio::task::spawn_blocking(move || {
        write_cv_pdf(&record, &style, &fonts, &dir, user_id)
    })
    .await??;

    // `pdf` is removed from disk when it goes out of scope, sent or not.
    ctx.transport
        .send_document(
            session.chat_id,
            pdf.path(),
            &format!("cv_{user_id}.pdf"),
            SUCCESS_CAPTION,
        )
        .await?;
    Ok(())
}
