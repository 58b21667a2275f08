pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::credits::handlers as credits;
use crate::criteria::handlers as criteria;
use crate::evaluation::handlers as evaluation;
use crate::intake::handlers as intake;
use crate::review::handlers as review;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/schools", get(criteria::handle_list_schools))
        .route("/api/v1/evaluate", post(evaluation::handle_evaluate))
        .route("/api/v1/review/layout", post(review::handle_review_layout))
        .route("/api/v1/parse", post(intake::handle_parse))
        .route("/api/v1/credits", get(credits::handle_get_balance))
        .route("/api/v1/credits/add", post(credits::handle_add_credits))
        .with_state(state)
}
