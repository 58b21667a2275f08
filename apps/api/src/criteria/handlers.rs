use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSummary {
    pub name: String,
    pub must_hit_signals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_failure_modes: Option<Vec<String>>,
    pub overall_guidance: String,
}

#[derive(Debug, Serialize)]
pub struct SchoolListResponse {
    pub schools: Vec<SchoolSummary>,
}

/// GET /api/v1/schools
///
/// Lists the committees a student can pick from, with the criteria shown in
/// the picker.
pub async fn handle_list_schools(State(state): State<AppState>) -> Json<SchoolListResponse> {
    let schools = state
        .criteria
        .all()
        .iter()
        .map(|s| SchoolSummary {
            name: s.name.clone(),
            must_hit_signals: s.must_hit_signals.clone(),
            common_failure_modes: s.failure_modes().map(<[String]>::to_vec),
            overall_guidance: s.overall_guidance.clone(),
        })
        .collect();

    Json(SchoolListResponse { schools })
}
