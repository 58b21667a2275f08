//! Charges one credit per request and runs one committee call per school
//! concurrently.
//!
//! Flow: validate → resolve schools → hydrate prompts → deduct credit (unless
//! retry) → join_all(committee calls) → aggregate.
//!
//! All calls run on the request's task and are awaited together, so results come
//! back in request order no matter which call finishes first. There is no
//! cancellation and no automatic retry.

use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::credits::CreditLedger;
use crate::criteria::{CriteriaStore, SchoolCriteria};
use crate::errors::AppError;
use crate::evaluation::aggregator::{aggregate, SchoolOutcome};
use crate::evaluation::models::{
    committee_schema, CommitteeResponse, EvaluationRequest, EvaluationResult, ProviderFailure,
    ANNOTATION_RANGE,
};
use crate::evaluation::prompts::build_prompt;
use crate::llm_client::LanguageModel;

/// Maximum committees per request.
pub const MAX_SCHOOLS: usize = 5;

const SCHEMA_NAME: &str = "committee_evaluation";

/// Runs the full evaluation for one user action.
///
/// Input and account failures abort before any model call. Per-school provider
/// failures come back as `status = error` entries.
pub async fn evaluate(
    criteria: &CriteriaStore,
    llm: &dyn LanguageModel,
    ledger: &dyn CreditLedger,
    user_id: Uuid,
    request: EvaluationRequest,
) -> Result<Vec<EvaluationResult>, AppError> {
    let schools = validate_request(criteria, &request)?;

    // Hydrate before charging: a template defect must not cost a credit.
    let prepared = schools
        .into_iter()
        .map(|school| {
            build_prompt(&request, school)
                .map(|prompt| (school, prompt))
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!(
                        "Prompt hydration failed for {}: {e}",
                        school.name
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if request.is_retry {
        info!(
            "Retrying {} for user {user_id} (no credit charged)",
            prepared[0].0.name
        );
    } else {
        let account = ledger.deduct(user_id).await?;
        info!(
            "Charged 1 credit to user {user_id}; {} remaining",
            account.credits_remaining
        );
    }

    info!(
        "Evaluating essay ({} words) with {} committees on {} ({:?} scoring)",
        request.essay_text.split_whitespace().count(),
        prepared.len(),
        request.model_id,
        request.scoring_mode
    );

    let schema = committee_schema();
    let outcomes = join_all(
        prepared
            .iter()
            .map(|(_, prompt)| call_committee(llm, &request.model_id, prompt, &schema)),
    )
    .await;

    let results = aggregate(
        prepared
            .into_iter()
            .zip(outcomes)
            .map(|((school, prompt), outcome)| SchoolOutcome {
                school,
                prompt,
                outcome,
            })
            .collect(),
    );

    let failed = results.iter().filter(|r| !r.is_success()).count();
    info!(
        "Evaluation finished for user {user_id}: {} succeeded, {failed} failed",
        results.len() - failed
    );

    Ok(results)
}

/// Checks the request shape and resolves school names, deduplicating while
/// keeping first-seen order.
fn validate_request<'a>(
    criteria: &'a CriteriaStore,
    request: &EvaluationRequest,
) -> Result<Vec<&'a SchoolCriteria>, AppError> {
    if request.essay_text.trim().is_empty() {
        return Err(AppError::Validation("essayText cannot be empty".to_string()));
    }
    if request.model_id.trim().is_empty() {
        return Err(AppError::Validation("modelId cannot be empty".to_string()));
    }

    let mut schools: Vec<&SchoolCriteria> = Vec::new();
    let mut unknown: Vec<&str> = Vec::new();

    for name in &request.school_names {
        match criteria.resolve(name) {
            Some(school) => {
                if !schools.iter().any(|s| s.name == school.name) {
                    schools.push(school);
                }
            }
            None => unknown.push(name.as_str()),
        }
    }

    if !unknown.is_empty() {
        return Err(AppError::Validation(format!(
            "Unknown school(s): {}",
            unknown.join(", ")
        )));
    }
    if schools.is_empty() {
        return Err(AppError::Validation(
            "Select at least one school".to_string(),
        ));
    }
    if schools.len() > MAX_SCHOOLS {
        return Err(AppError::Validation(format!(
            "Select at most {MAX_SCHOOLS} schools (got {})",
            schools.len()
        )));
    }
    if request.is_retry && schools.len() != 1 {
        return Err(AppError::Validation(
            "A retry must name exactly one school".to_string(),
        ));
    }

    Ok(schools)
}

/// One structured-generation call, validated at the boundary.
async fn call_committee(
    llm: &dyn LanguageModel,
    model_id: &str,
    prompt: &str,
    schema: &Value,
) -> Result<CommitteeResponse, ProviderFailure> {
    let value = llm
        .generate_object(model_id, prompt, SCHEMA_NAME, schema)
        .await?;
    let response = CommitteeResponse::from_value(value)?;

    if !ANNOTATION_RANGE.contains(&response.annotations.len()) {
        warn!(
            "Committee returned {} annotations (expected {}-{})",
            response.annotations.len(),
            ANNOTATION_RANGE.start(),
            ANNOTATION_RANGE.end()
        );
    }

    Ok(response)
}
