//! Annotation Matcher — splits the essay into plain and highlighted runs.
//!
//! Annotations are applied first-in first-out in the order received. Each one
//! claims the first literal, case-sensitive occurrence of its anchor inside a
//! fragment that is still plain; once claimed, that span is no longer
//! searchable. Highlights therefore never overlap, and a later anchor that
//! repeats or overlaps an earlier one may land on a different occurrence or
//! not at all.

use std::ops::Range;

use serde::Serialize;

/// A contiguous run of the essay. Offsets are byte offsets into the essay text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Plain {
        start: usize,
        end: usize,
        text: String,
    },
    Highlight {
        start: usize,
        end: usize,
        text: String,
        #[serde(rename = "annotationId")]
        annotation_id: String,
    },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain { text, .. } | Segment::Highlight { text, .. } => text,
        }
    }

    pub fn annotation_id(&self) -> Option<&str> {
        match self {
            Segment::Plain { .. } => None,
            Segment::Highlight { annotation_id, .. } => Some(annotation_id),
        }
    }
}

/// An anchor to place, identified by its annotation id.
#[derive(Debug, Clone, Copy)]
pub struct Anchor<'a> {
    pub id: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub segments: Vec<Segment>,
    /// Ids whose anchor found no plain occurrence, in processing order.
    pub unmatched: Vec<String>,
}

enum Fragment {
    Plain(Range<usize>),
    Highlight(Range<usize>, usize),
}

/// Lays out `anchors` over `essay`. Concatenating the returned segment texts
/// always reproduces `essay` exactly. Empty anchors never match.
pub fn layout(essay: &str, anchors: &[Anchor<'_>]) -> Layout {
    let mut fragments = if essay.is_empty() {
        Vec::new()
    } else {
        vec![Fragment::Plain(0..essay.len())]
    };
    let mut unmatched = Vec::new();

    for (idx, anchor) in anchors.iter().enumerate() {
        if anchor.text.is_empty() || !claim(essay, &mut fragments, anchor.text, idx) {
            unmatched.push(anchor.id.to_string());
        }
    }

    let segments = fragments
        .into_iter()
        .map(|fragment| match fragment {
            Fragment::Plain(range) => Segment::Plain {
                start: range.start,
                end: range.end,
                text: essay[range].to_string(),
            },
            Fragment::Highlight(range, idx) => Segment::Highlight {
                start: range.start,
                end: range.end,
                text: essay[range].to_string(),
                annotation_id: anchors[idx].id.to_string(),
            },
        })
        .collect();

    Layout {
        segments,
        unmatched,
    }
}

/// Splits the first plain fragment containing `needle` into
/// prefix / highlight / suffix. Empty prefix or suffix pieces are dropped.
fn claim(essay: &str, fragments: &mut Vec<Fragment>, needle: &str, idx: usize) -> bool {
    let hit = fragments.iter().enumerate().find_map(|(pos, fragment)| match fragment {
        Fragment::Plain(range) => essay[range.clone()]
            .find(needle)
            .map(|offset| (pos, range.clone(), range.start + offset)),
        Fragment::Highlight(..) => None,
    });

    let Some((pos, range, start)) = hit else {
        return false;
    };
    let end = start + needle.len();

    let mut pieces = Vec::with_capacity(3);
    if range.start < start {
        pieces.push(Fragment::Plain(range.start..start));
    }
    pieces.push(Fragment::Highlight(start..end, idx));
    if end < range.end {
        pieces.push(Fragment::Plain(end..range.end));
    }
    fragments.splice(pos..=pos, pieces);

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors<'a>(pairs: &'a [(&'a str, &'a str)]) -> Vec<Anchor<'a>> {
        pairs
            .iter()
            .map(|&(id, text)| Anchor { id, text })
            .collect()
    }

    fn joined(layout: &Layout) -> String {
        layout.segments.iter().map(Segment::text).collect()
    }

    fn highlights(layout: &Layout) -> Vec<(&str, &str)> {
        layout
            .segments
            .iter()
            .filter_map(|s| s.annotation_id().map(|id| (id, s.text())))
            .collect()
    }

    #[test]
    fn test_single_anchor_scenario() {
        let essay = "I love science and robotics club.";
        let out = layout(essay, &anchors(&[("Stanford-0", "science and robotics club")]));

        assert_eq!(
            out.segments,
            vec![
                Segment::Plain {
                    start: 0,
                    end: 7,
                    text: "I love ".to_string()
                },
                Segment::Highlight {
                    start: 7,
                    end: 32,
                    text: "science and robotics club".to_string(),
                    annotation_id: "Stanford-0".to_string(),
                },
                Segment::Plain {
                    start: 32,
                    end: 33,
                    text: ".".to_string()
                },
            ]
        );
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let essay = "Dear committee,\n\tMy grandmother's café taught me patience. Patience, then grit.\n";
        let out = layout(
            essay,
            &anchors(&[
                ("a", "Patience"),
                ("b", "café"),
                ("c", "nowhere to be found"),
                ("d", "\n"),
                ("e", "grit."),
            ]),
        );
        assert_eq!(joined(&out), essay);

        for segment in &out.segments {
            let (start, end) = match segment {
                Segment::Plain { start, end, .. } | Segment::Highlight { start, end, .. } => {
                    (*start, *end)
                }
            };
            assert_eq!(&essay[start..end], segment.text());
        }
    }

    #[test]
    fn test_first_processed_claims_overlapping_span() {
        let essay = "The robotics club changed me.";
        let out = layout(
            essay,
            &anchors(&[("first", "robotics club"), ("second", "club changed")]),
        );

        assert_eq!(highlights(&out), vec![("first", "robotics club")]);
        assert_eq!(out.unmatched, vec!["second".to_string()]);
        assert_eq!(joined(&out), essay);
    }

    #[test]
    fn test_repeated_anchor_moves_to_next_occurrence() {
        let essay = "I tried. I failed. I tried again.";
        let out = layout(essay, &anchors(&[("x", "I tried"), ("y", "I tried")]));

        let hits: Vec<_> = out
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Highlight {
                    start,
                    annotation_id,
                    ..
                } => Some((annotation_id.as_str(), *start)),
                Segment::Plain { .. } => None,
            })
            .collect();
        assert_eq!(hits, vec![("x", 0), ("y", 19)]);
    }

    #[test]
    fn test_order_is_fifo_not_positional() {
        let essay = "alpha beta gamma";
        let out = layout(essay, &anchors(&[("g", "gamma"), ("a", "alpha")]));
        assert_eq!(highlights(&out), vec![("a", "alpha"), ("g", "gamma")]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let out = layout("Science matters.", &anchors(&[("s", "science")]));
        assert!(highlights(&out).is_empty());
        assert_eq!(out.unmatched, vec!["s".to_string()]);
    }

    #[test]
    fn test_empty_anchor_and_empty_essay() {
        let out = layout("Some text.", &anchors(&[("blank", "")]));
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.unmatched, vec!["blank".to_string()]);

        let out = layout("", &anchors(&[("a", "anything")]));
        assert!(out.segments.is_empty());
        assert_eq!(out.unmatched, vec!["a".to_string()]);
    }

    #[test]
    fn test_whole_essay_anchor_leaves_no_plain_pieces() {
        let out = layout("Short.", &anchors(&[("all", "Short.")]));
        assert_eq!(highlights(&out), vec![("all", "Short.")]);
        assert_eq!(out.segments.len(), 1);
    }

    #[test]
    fn test_segment_serializes_with_kind_tag() {
        let segment = Segment::Highlight {
            start: 0,
            end: 2,
            text: "Hi".to_string(),
            annotation_id: "Yale University-1".to_string(),
        };
        let value = serde_json::to_value(&segment).unwrap();
        assert_eq!(value["kind"], "highlight");
        assert_eq!(value["annotationId"], "Yale University-1");
    }
}
