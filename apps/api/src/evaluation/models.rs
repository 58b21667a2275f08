//! Evaluation data models: the request, the model's structured answer, and the
//! per-school result returned to the client.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::criteria::SchoolCriteria;
use crate::llm_client::LlmError;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;
/// The schema asks for this many annotations; counts outside it are logged, not rejected.
pub const ANNOTATION_RANGE: std::ops::RangeInclusive<usize> = 4..=6;

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// How the model is told to derive its numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Absolute 0–10 scores with calibration rules.
    #[default]
    Standard,
    /// Additive scores from a base of 5.0.
    Experimental,
}

/// One user action: evaluate an essay against a set of committees.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub essay_text: String,
    pub school_names: Vec<String>,
    pub model_id: String,
    pub tone: Option<String>,
    pub scoring_mode: ScoringMode,
    pub force_actionable: bool,
    /// A user-triggered retry of one school; never charged.
    pub is_retry: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Model response (validated at the boundary)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub fit: f64,
    pub clarity: f64,
    pub likeability: f64,
    pub accomplishments: f64,
    pub overall: f64,
}

impl Scores {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("fit", self.fit),
            ("clarity", self.clarity),
            ("likeability", self.likeability),
            ("accomplishments", self.accomplishments),
            ("overall", self.overall),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Strength,
    Critique,
}

/// A comment bound to a verbatim quotation from the essay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub anchor: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: AnnotationKind,
    pub comment: String,
}

/// The JSON object a committee call must return.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitteeResponse {
    pub scores: Scores,
    pub committee_reaction: String,
    #[serde(default)]
    pub math_log: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl CommitteeResponse {
    /// Parses and range-checks a raw model answer.
    pub fn from_value(value: Value) -> Result<Self, ProviderFailure> {
        let response: CommitteeResponse = serde_json::from_value(value)
            .map_err(|e| ProviderFailure::Malformed(e.to_string()))?;
        response.validate()?;
        Ok(response)
    }

    pub fn validate(&self) -> Result<(), ProviderFailure> {
        for (name, score) in self.scores.named() {
            if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                return Err(ProviderFailure::Invalid(format!(
                    "score '{name}' = {score} is outside [{MIN_SCORE}, {MAX_SCORE}]"
                )));
            }
        }

        if self.committee_reaction.trim().is_empty() {
            return Err(ProviderFailure::Invalid(
                "committee_reaction is empty".to_string(),
            ));
        }

        if let Some(idx) = self
            .annotations
            .iter()
            .position(|a| a.anchor.trim().is_empty())
        {
            return Err(ProviderFailure::Invalid(format!(
                "annotation {idx} has an empty anchor"
            )));
        }

        Ok(())
    }
}

/// JSON schema sent with every committee call.
pub fn committee_schema() -> Value {
    let score = json!({ "type": "number", "minimum": MIN_SCORE, "maximum": MAX_SCORE });
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["scores", "committee_reaction", "math_log", "annotations"],
        "properties": {
            "scores": {
                "type": "object",
                "additionalProperties": false,
                "required": ["fit", "clarity", "likeability", "accomplishments", "overall"],
                "properties": {
                    "fit": score,
                    "clarity": score,
                    "likeability": score,
                    "accomplishments": score,
                    "overall": score
                }
            },
            "committee_reaction": { "type": "string" },
            "math_log": { "type": ["string", "null"] },
            "annotations": {
                "type": "array",
                "minItems": *ANNOTATION_RANGE.start(),
                "maxItems": *ANNOTATION_RANGE.end(),
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["anchor", "type", "comment"],
                    "properties": {
                        "anchor": { "type": "string" },
                        "type": { "type": "string", "enum": ["strength", "critique"] },
                        "comment": { "type": "string" }
                    }
                }
            }
        }
    })
}

/// Why a single committee produced no evaluation. Recorded on that school's
/// result; never fails the batch.
#[derive(Debug, Error)]
pub enum ProviderFailure {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("Malformed committee response: {0}")]
    Malformed(String),

    #[error("Invalid committee response: {0}")]
    Invalid(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Result
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

/// The criteria a committee was judged against, echoed for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaSummary {
    pub must_hits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_modes: Option<Vec<String>>,
    pub overall_guidance: String,
}

impl From<&SchoolCriteria> for CriteriaSummary {
    fn from(school: &SchoolCriteria) -> Self {
        Self {
            must_hits: school.must_hit_signals.clone(),
            failure_modes: school.failure_modes().map(<[String]>::to_vec),
            overall_guidance: school.overall_guidance.clone(),
        }
    }
}

/// One committee's outcome. Held in memory for the review session only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub school_name: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
    /// Convenience copy of `scores.overall`; never recomputed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committee_reaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// The hydrated prompt, for the debug panel.
    #[serde(default)]
    pub prompt: String,
    pub criteria: CriteriaSummary,
}

impl EvaluationResult {
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}
