//! JSON Normalizer: coerces near-JSON model output into strict JSON.
//!
//! Pipeline:
//! 1. `extract_fenced_object`: strip a markdown fence and surrounding prose.
//!    Input that now parses strictly is returned as-is (re-serialized).
//! 2. `CLEANUP_STAGES`: un-escape, collapse to one line, drop trailing commas.
//! 3. strict parse; on failure `REPAIR_STAGES` (quote bare keys/values), parse again.
//! 4. re-serialize pretty-printed, key order and non-ASCII text preserved.
//!
//! Heuristic by nature: tuned to the mistakes generative models make, not a
//! general JSON repair algorithm. New failure modes get a new stage.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, trace};

pub mod stages;

/// Max characters of model output carried in logs and errors.
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed model output ({reason}): {preview}")]
    MalformedOutput { reason: String, preview: String },
}

/// A single text transform of the pipeline.
pub type Stage = fn(&str) -> String;

/// Applied in order before the first strict parse.
pub const CLEANUP_STAGES: &[(&str, Stage)] = &[
    ("unescape_sequences", stages::unescape_sequences),
    ("collapse_newlines", stages::collapse_newlines),
    ("strip_trailing_commas", stages::strip_trailing_commas),
    ("collapse_whitespace", stages::collapse_whitespace),
    ("trim", stages::trim),
];

/// Applied only when the cleaned text still fails to parse.
pub const REPAIR_STAGES: &[(&str, Stage)] = &[("quote_bare_scalars", stages::quote_bare_scalars)];

/// Normalizes model output into pretty-printed strict JSON.
pub fn normalize(raw: &str) -> Result<String, NormalizeError> {
    let value = normalize_value(raw)?;
    let pretty = serde_json::to_string_pretty(&value).map_err(|e| malformed(e.to_string(), raw))?;
    debug!("Cleaned JSON: {}", preview(&pretty));
    Ok(pretty)
}

/// Same pipeline as [`normalize`], returning the parsed object.
pub fn normalize_value(raw: &str) -> Result<Value, NormalizeError> {
    debug!("Original model output: {}", preview(raw));

    let extracted = stages::extract_fenced_object(raw);
    if let Ok(value) = parse_object(&extracted) {
        return Ok(value);
    }

    let cleaned = run_stages(extracted, CLEANUP_STAGES);
    let first_error = match parse_object(&cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    debug!("Strict parse failed after cleanup ({first_error}), trying repair stages");

    let repaired = run_stages(cleaned, REPAIR_STAGES);
    parse_object(&repaired).map_err(|reason| {
        error!("JSON cleaning failed: {reason}");
        error!("Failed string: {}", preview(&repaired));
        malformed(reason, &repaired)
    })
}

fn run_stages(text: String, pipeline: &[(&str, Stage)]) -> String {
    pipeline.iter().fold(text, |text, (name, stage)| {
        let next = stage(&text);
        if next != text {
            trace!(stage = name, "{}", preview(&next));
        }
        next
    })
}

fn parse_object(text: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("top-level value is not an object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn malformed(reason: String, text: &str) -> NormalizeError {
    NormalizeError::MalformedOutput {
        reason,
        preview: preview(text),
    }
}

pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
