//! Axum route handlers for the Generation API.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::errors::AppError;
use crate::generation::generator::{generate_cv, CvRequest};
use crate::state::AppState;

/// GET /generate_cv?name=&experience=&education=&tech_stack=...
///
/// `tech_stack` repeats once per skill, so the query is taken as raw pairs.
/// Responds with the model's text as a JSON string; it is not guaranteed to be
/// valid JSON itself.
pub async fn handle_generate_cv(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<String>, AppError> {
    let request = CvRequest::from_query_pairs(pairs)?;
    let text = generate_cv(&state.llm, &request).await?;
    Ok(Json(text))
}
