//! Axum route handlers for document upload and DOCX generation.

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::document::reader::extract_raw_text;
use crate::document::writer::{render_docx, DOCX_MIME};
use crate::errors::AppError;
use crate::extraction::extract;
use crate::models::resume::ResumeRecord;

/// Multipart field names accepted for the uploaded document.
const FILE_FIELDS: [&str; 2] = ["resume", "file"];
const DOCX_FILENAME: &str = "optimized_resume.docx";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub text: String,
    pub structured: ResumeRecord,
}

/// POST /upload
/// Extracts raw text from the uploaded document plus a best-effort structured record.
pub async fn handle_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Upload(e.body_text()))?;

    let mut upload: Option<(Option<String>, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.body_text()))?
    {
        if !FILE_FIELDS.contains(&field.name().unwrap_or_default()) {
            continue;
        }
        let filename = field.file_name().map(String::from);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(e.body_text()))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| AppError::Upload("No file provided".to_string()))?;
    info!(
        "Received upload {} ({} bytes)",
        filename.as_deref().unwrap_or("<unnamed>"),
        data.len()
    );

    let text = tokio::task::spawn_blocking(move || extract_raw_text(&data, filename.as_deref()))
        .await
        .map_err(|e| anyhow::anyhow!("Document reader task failed: {e}"))??;
    let structured = extract(&text);

    Ok(Json(UploadResponse {
        success: true,
        text,
        structured,
    }))
}

/// POST /generate-docx
/// Renders the posted resume record as a DOCX attachment.
pub async fn handle_generate_docx(
    body: Result<Json<ResumeRecord>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(record) = body?;
    let docx = render_docx(&record)?;
    info!("Generated DOCX ({} bytes)", docx.len());

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOCX_FILENAME}\""),
            ),
        ],
        Bytes::from(docx),
    ))
}
