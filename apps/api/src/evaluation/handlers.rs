use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::{AppError, AppJson};
use crate::evaluation::models::{EvaluationRequest, EvaluationResult, ScoringMode};
use crate::evaluation::requester::evaluate;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateBody {
    // Missing fields reach request validation as empty values.
    #[serde(default)]
    pub essay_text: String,
    #[serde(default)]
    pub school_names: Vec<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub scoring_mode: ScoringMode,
    #[serde(default)]
    pub force_actionable: bool,
    #[serde(default)]
    pub is_retry: bool,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub results: Vec<EvaluationResult>,
}

/// POST /api/v1/evaluate
///
/// Charges one credit (none for a retry) and returns one result per school in
/// request order. Per-school provider failures are `status = "error"` entries
/// in a 200 response.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<EvaluateBody>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let request = EvaluationRequest {
        essay_text: body.essay_text,
        school_names: body.school_names,
        model_id: body
            .model_id
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| state.config.default_model.clone()),
        tone: body.tone.filter(|t| !t.trim().is_empty()),
        scoring_mode: body.scoring_mode,
        force_actionable: body.force_actionable,
        is_retry: body.is_retry,
    };

    let results = evaluate(
        &state.criteria,
        state.llm.as_ref(),
        state.ledger.as_ref(),
        user_id,
        request,
    )
    .await?;

    Ok(Json(EvaluateResponse { results }))
}
