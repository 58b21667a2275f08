use axum::{extract::Multipart, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::intake::parse_document;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub text: String,
}

/// POST /api/v1/parse
/// Multipart upload with a single `file` field. Returns the extracted text.
pub async fn handle_parse(mut multipart: Multipart) -> Result<Json<ParseResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mime = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let text = parse_document(bytes, mime.as_deref(), file_name.as_deref()).await?;
        info!(
            "Parsed upload {} ({}) into {} characters",
            file_name.as_deref().unwrap_or("<unnamed>"),
            mime.as_deref().unwrap_or("no content type"),
            text.chars().count()
        );
        return Ok(Json(ParseResponse { text }));
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}
