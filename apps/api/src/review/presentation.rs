//! Review presentation: annotation identities, school colours and emphasis.

use serde::Serialize;

use crate::evaluation::models::{AnnotationKind, EvaluationResult};
use crate::review::layout::{layout, Anchor, Segment};

/// One colour per school, assigned by result index and cycled.
pub const PALETTE: [&str; 5] = ["#ef4444", "#3b82f6", "#22c55e", "#a855f7", "#f97316"];

pub fn school_color(result_index: usize) -> &'static str {
    PALETTE[result_index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    /// Belongs to the committee under review.
    Active,
    /// Belongs to another committee; shown desaturated.
    Muted,
}

/// An annotation with its review identity (`"{school}-{index}"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedAnnotation {
    pub id: String,
    pub school_name: String,
    pub anchor: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub comment: String,
    pub color: &'static str,
}

/// Every annotation from successful results, in result order then annotation
/// order. Failed results contribute nothing.
pub fn collect_annotations(results: &[EvaluationResult]) -> Vec<TaggedAnnotation> {
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_success())
        .flat_map(|(result_index, r)| {
            r.annotations
                .iter()
                .flatten()
                .enumerate()
                .map(move |(i, a)| TaggedAnnotation {
                    id: format!("{}-{i}", r.school_name),
                    school_name: r.school_name.clone(),
                    anchor: a.anchor.clone(),
                    kind: a.kind,
                    comment: a.comment.clone(),
                    color: school_color(result_index),
                })
        })
        .collect()
}

/// First successful school, else the first school, else none.
pub fn default_active_school(results: &[EvaluationResult]) -> Option<&str> {
    results
        .iter()
        .find(|r| r.is_success())
        .or_else(|| results.first())
        .map(|r| r.school_name.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledSegment {
    #[serde(flatten)]
    pub segment: Segment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Emphasis>,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLayout {
    pub active_school: Option<String>,
    pub segments: Vec<StyledSegment>,
    pub annotations: Vec<TaggedAnnotation>,
    pub unmatched: Vec<String>,
}

/// Lays out every committee's annotations over the essay and styles each
/// highlight for the current review state.
pub fn present(
    essay: &str,
    results: &[EvaluationResult],
    active_school: Option<&str>,
    focused_annotation_id: Option<&str>,
) -> ReviewLayout {
    let annotations = collect_annotations(results);
    let active_school = active_school
        .or_else(|| default_active_school(results))
        .map(str::to_string);

    let anchors: Vec<Anchor<'_>> = annotations
        .iter()
        .map(|a| Anchor {
            id: &a.id,
            text: &a.anchor,
        })
        .collect();
    let laid_out = layout(essay, &anchors);

    let segments = laid_out
        .segments
        .into_iter()
        .map(|segment| {
            let owner = segment
                .annotation_id()
                .and_then(|id| annotations.iter().find(|a| a.id == id));
            match owner {
                Some(a) => StyledSegment {
                    school_name: Some(a.school_name.clone()),
                    color: Some(a.color),
                    emphasis: Some(if active_school.as_deref() == Some(a.school_name.as_str()) {
                        Emphasis::Active
                    } else {
                        Emphasis::Muted
                    }),
                    focused: focused_annotation_id == Some(a.id.as_str()),
                    segment,
                },
                None => StyledSegment {
                    segment,
                    school_name: None,
                    color: None,
                    emphasis: None,
                    focused: false,
                },
            }
        })
        .collect();

    ReviewLayout {
        active_school,
        segments,
        annotations,
        unmatched: laid_out.unmatched,
    }
}
