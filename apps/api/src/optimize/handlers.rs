//! Axum route handler for the Optimize API.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::optimize::pipeline::optimize_resume;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OptimizeQuery {
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub success: bool,
    pub optimized: ResumeRecord,
    pub fallback: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /optimize?provider=<name>
///
/// Tailors the resume to the job description. AI failures degrade to a
/// fallback record (`fallback: true`) rather than an error response.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Query(query): Query<OptimizeQuery>,
    body: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, AppError> {
    let Json(req) = body?;

    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resumeText is required".to_string()));
    }
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation("jobDescription is required".to_string()));
    }

    let provider = state.providers.resolve(query.provider.as_deref())?;
    info!(
        "Optimizing resume with {} ({} chars, JD {} chars)",
        provider.name(),
        req.resume_text.len(),
        req.job_description.len()
    );

    let outcome = optimize_resume(
        &req.resume_text,
        &req.job_description,
        provider.as_ref(),
        &state.cache,
    )
    .await;

    Ok(Json(OptimizeResponse {
        success: true,
        optimized: outcome.record,
        fallback: outcome.used_fallback,
    }))
}
