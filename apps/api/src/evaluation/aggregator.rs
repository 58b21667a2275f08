//! Result Aggregator — turns ordered per-school outcomes into result entries.

use tracing::warn;

use crate::criteria::SchoolCriteria;
use crate::evaluation::models::{
    CommitteeResponse, CriteriaSummary, EvaluationResult, ProviderFailure, ResultStatus,
};

/// Everything known about one school's call once it has resolved.
pub struct SchoolOutcome<'a> {
    pub school: &'a SchoolCriteria,
    pub prompt: String,
    pub outcome: Result<CommitteeResponse, ProviderFailure>,
}

/// Maps outcomes to results one-to-one, in the order given. Failures become
/// `status = error` entries; nothing is dropped or reordered.
pub fn aggregate(outcomes: Vec<SchoolOutcome<'_>>) -> Vec<EvaluationResult> {
    outcomes.into_iter().map(to_result).collect()
}

fn to_result(outcome: SchoolOutcome<'_>) -> EvaluationResult {
    let SchoolOutcome {
        school,
        prompt,
        outcome,
    } = outcome;

    match outcome {
        Ok(response) => EvaluationResult {
            school_name: school.name.clone(),
            status: ResultStatus::Success,
            overall_score: Some(response.scores.overall),
            scores: Some(response.scores),
            committee_reaction: Some(response.committee_reaction),
            math_log: response.math_log.filter(|m| !m.trim().is_empty()),
            annotations: Some(response.annotations),
            error_message: None,
            prompt,
            criteria: CriteriaSummary::from(school),
        },
        Err(failure) => {
            warn!("Committee {} failed: {failure}", school.name);
            let message = failure.to_string();
            EvaluationResult {
                school_name: school.name.clone(),
                status: ResultStatus::Error,
                scores: None,
                overall_score: None,
                committee_reaction: None,
                math_log: None,
                annotations: None,
                error_message: Some(if message.trim().is_empty() {
                    "Committee evaluation failed".to_string()
                } else {
                    message
                }),
                prompt,
                criteria: CriteriaSummary::from(school),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::fixtures::school;
    use crate::evaluation::models::{Annotation, AnnotationKind, Scores};
    use crate::llm_client::LlmError;

    fn response(overall: f64) -> CommitteeResponse {
        CommitteeResponse {
            scores: Scores {
                fit: 6.0,
                clarity: 7.0,
                likeability: 8.0,
                accomplishments: 5.0,
                overall,
            },
            committee_reaction: "Solid.".to_string(),
            math_log: Some("  ".to_string()),
            annotations: vec![Annotation {
                anchor: "robotics club".to_string(),
                kind: AnnotationKind::Strength,
                comment: "clear interest".to_string(),
            }],
        }
    }

    #[test]
    fn test_preserves_order_and_length_with_failures() {
        let a = school("Alpha College");
        let b = school("Beta University");
        let c = school("Gamma Institute");

        let results = aggregate(vec![
            SchoolOutcome {
                school: &a,
                prompt: "pa".to_string(),
                outcome: Ok(response(7.0)),
            },
            SchoolOutcome {
                school: &b,
                prompt: "pb".to_string(),
                outcome: Err(ProviderFailure::Llm(LlmError::Api {
                    status: 500,
                    message: "upstream exploded".to_string(),
                })),
            },
            SchoolOutcome {
                school: &c,
                prompt: "pc".to_string(),
                outcome: Ok(response(4.5)),
            },
        ]);

        let names: Vec<_> = results.iter().map(|r| r.school_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha College", "Beta University", "Gamma Institute"]);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[2].is_success());
    }

    #[test]
    fn test_success_overall_score_mirrors_model_value() {
        let a = school("Alpha College");
        let results = aggregate(vec![SchoolOutcome {
            school: &a,
            prompt: "p".to_string(),
            outcome: Ok(response(6.5)),
        }]);
        assert_eq!(results[0].overall_score, Some(6.5));
        assert_eq!(results[0].scores.unwrap().overall, 6.5);
        assert!(results[0].math_log.is_none(), "blank math log is dropped");
        assert_eq!(results[0].criteria.must_hits.len(), 2);
    }

    #[test]
    fn test_error_entry_has_message_and_no_scores() {
        let b = school("Beta University");
        let results = aggregate(vec![SchoolOutcome {
            school: &b,
            prompt: "p".to_string(),
            outcome: Err(ProviderFailure::Malformed("missing field `scores`".to_string())),
        }]);
        let r = &results[0];
        assert_eq!(r.status, ResultStatus::Error);
        assert!(r.scores.is_none());
        assert!(r.overall_score.is_none());
        assert!(r.annotations.is_none());
        assert!(r
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("missing field")));
        assert_eq!(r.prompt, "p");
    }
}
