use std::collections::HashSet;

use axum::Json;
use serde::Deserialize;

use crate::errors::{AppError, AppJson};
use crate::evaluation::models::EvaluationResult;
use crate::review::presentation::{present, ReviewLayout};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLayoutRequest {
    #[serde(default)]
    pub essay_text: String,
    pub results: Vec<EvaluationResult>,
    #[serde(default)]
    pub active_school: Option<String>,
    #[serde(default)]
    pub focused_annotation_id: Option<String>,
}

/// POST /api/v1/review/layout
///
/// Annotation ids are keyed by school name, so each school may appear once.
pub async fn handle_review_layout(
    AppJson(request): AppJson<ReviewLayoutRequest>,
) -> Result<Json<ReviewLayout>, AppError> {
    let mut seen = HashSet::new();
    if let Some(dup) = request
        .results
        .iter()
        .find(|r| !seen.insert(r.school_name.as_str()))
    {
        return Err(AppError::Validation(format!(
            "School '{}' appears more than once in results",
            dup.school_name
        )));
    }

    if let Some(active) = request.active_school.as_deref() {
        if !request.results.iter().any(|r| r.school_name == active) {
            return Err(AppError::Validation(format!(
                "activeSchool '{active}' is not among the results"
            )));
        }
    }

    Ok(Json(present(
        &request.essay_text,
        &request.results,
        request.active_school.as_deref(),
        request.focused_annotation_id.as_deref(),
    )))
}
