use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::{AppError, AppJson};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub credits_remaining: i32,
    pub last_grant_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AddCreditsRequest {
    pub amount: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCreditsResponse {
    pub success: bool,
    pub new_total: i32,
}

/// GET /api/v1/credits
pub async fn handle_get_balance(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<BalanceResponse>, AppError> {
    let account = state.ledger.get_balance(user_id).await?;
    Ok(Json(BalanceResponse {
        credits_remaining: account.credits_remaining,
        last_grant_date: account.last_grant_date,
    }))
}

/// POST /api/v1/credits/add
pub async fn handle_add_credits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<AddCreditsRequest>,
) -> Result<Json<AddCreditsResponse>, AppError> {
    let account = state.ledger.add(user_id, request.amount).await?;
    info!(
        "Added {} credits for user {user_id}; balance now {}",
        request.amount, account.credits_remaining
    );
    Ok(Json(AddCreditsResponse {
        success: true,
        new_total: account.credits_remaining,
    }))
}
