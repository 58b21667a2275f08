//! Committee prompt templates and the hydrator that fills them.
//!
//! Templates use `{{name}}` placeholders. Hydration is a pure function of its
//! inputs: no shared state, no clock, no randomness.

use std::collections::HashMap;

use thiserror::Error;

use crate::criteria::SchoolCriteria;
use crate::evaluation::models::{EvaluationRequest, ScoringMode};

/// Standard template: absolute 0–10 scores with calibration rules.
pub const STANDARD_TEMPLATE: &str = r#"You are the Admissions Committee for {{school_name}}.
Persona: You are a {{personality_style}}.
Tone: {{tone_guidance}}

Evaluation Logic:
- Core Priorities: {{priorities}}
- Must-Hit Signals: {{must_hits}}
- Avoid these Failure Modes: {{failure_modes}}
- Subject Matter Guidance: {{subject_matter}}
- Overall Guidance: {{overall_guidance}}

CRITICAL CALIBRATION - Scoring Sensitivity:
1. BREVITY PENALTY: If the student's essay is extremely short (e.g., fewer than 100 words), DO NOT give scores above 4.0 for Fit or Accomplishments. An empty or 1-2 sentence essay is an automatic 1 or 2. This essay has {{word_count}} words.
2. NUANCE & CONTEXT: Read carefully for metaphors, humor, and non-literal names. Do not critique literal misreadings of student slang or humor.
3. DIFFERENTIATION: Reserve 8-10 for truly exceptional, detailed, and revealing writing. Average work should land in 5-7. Poor work or lack of effort must land in 1-4.

Task: Review the student's essay: '{{essay_text}}'. Read like a human officer looking for 'Decision Logic' and 'Personal Values.'

Output Instructions (Strict JSON Only): Return a JSON object with:
1. scores: { "fit": 0, "clarity": 0, "likeability": 0, "accomplishments": 0, "overall": 0 } (all 0-10). Be critical!
2. committee_reaction: A 2-3 sentence 'human-sounding' summary of the vibe in the room. Explain WHY the scores are what they are.
3. math_log: null.
4. annotations: A list of 4-6 objects. Each must contain:
   - anchor: VERBATIM quote from the essay (min 5 words). Must match text in the essay exactly!
   - type: 'strength' or 'critique'.
   - comment: Specific feedback based on the criteria."#;

/// Experimental template: every score starts at 5.0 and moves by stated deltas.
pub const EXPERIMENTAL_TEMPLATE: &str = r#"You are the Admissions Committee for {{school_name}}.
Persona: You are a {{personality_style}}.
Tone: {{tone_guidance}}

Evaluation Logic:
- Must-Hit Signals: {{must_hits}}
- Failure Modes: {{failure_modes}}
- Overall Guidance: {{overall_guidance}}

SCORING ALGORITHM (Additive/Subtractive):
Start every score at 5.0 (Average).
+ Add 1.0 for each Must-Hit Signal found (Max +3.0)
+ Add 0.5 for clear, vivid storytelling
- Subtract 1.0 for each Failure Mode found
- Subtract 2.0 for vagueness or cliches
- Subtract 4.0 if the essay is under 200 words (Brevity Penalty). This essay has {{word_count}} words.
Clamp every final score to the range 0.0 to 10.0.

Task: Review the student's essay: '{{essay_text}}'.

Output Instructions (Strict JSON Only): Return a JSON object with:
1. scores: { "fit": 0, "clarity": 0, "likeability": 0, "accomplishments": 0, "overall": 0 }
2. committee_reaction: A 2-3 sentence summary of the room's reaction.
3. math_log: The score calculation step by step (e.g., "Fit: start 5.0, +1.0 for ..., -2.0 for ... = 4.0").
4. annotations: A list of 4-6 objects with a VERBATIM essay quote as anchor, type 'strength' or 'critique', and a comment."#;

/// Appended when the request asks for actionable feedback only.
pub const ACTIONABLE_DIRECTIVE: &str = "\n\nACTIONABLE FEEDBACK REQUIRED: Every critique comment must end with one concrete revision the student can make (what to cut, add, or rewrite, and where).";

const DEFAULT_TONE: &str = "Candid, specific, and constructive.";

impl ScoringMode {
    pub fn template(self) -> &'static str {
        match self {
            ScoringMode::Standard => STANDARD_TEMPLATE,
            ScoringMode::Experimental => EXPERIMENTAL_TEMPLATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HydrationError {
    #[error("template references unknown placeholder '{{{{{0}}}}}'")]
    UnknownPlaceholder(String),

    #[error("template has an unclosed placeholder on line {0}")]
    Unclosed(usize),
}

/// Formats the tone line: an explicit override becomes an imperative directive,
/// otherwise the school's own guidance is joined into prose.
pub fn tone_directive(school: &SchoolCriteria, tone: Option<&str>) -> String {
    match tone.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tone) => format!("Deliver all feedback in this voice: {tone}."),
        None if school.tone_guidance.is_empty() => DEFAULT_TONE.to_string(),
        None => school
            .tone_guidance
            .iter()
            .map(|t| t.trim())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn joined(items: &[String]) -> Option<String> {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Fills `template` for one school.
///
/// Every `{{name}}` must be a known placeholder. A line whose placeholder has no
/// value for this school (e.g. no failure modes) is dropped whole. Substituted
/// values are not re-scanned, so an essay containing braces is copied verbatim.
pub fn hydrate(
    template: &str,
    school: &SchoolCriteria,
    essay_text: &str,
    tone: Option<&str>,
) -> Result<String, HydrationError> {
    let must_hits = joined(&school.must_hit_signals);

    let values: HashMap<&str, Option<String>> = HashMap::from([
        ("school_name", Some(school.name.clone())),
        ("personality_style", Some(school.personality().to_string())),
        ("tone_guidance", Some(tone_directive(school, tone))),
        ("priorities", must_hits.clone()),
        ("must_hits", must_hits),
        ("failure_modes", joined(&school.common_failure_modes)),
        ("subject_matter", joined(&school.subject_matter_guidance)),
        ("overall_guidance", non_blank(&school.overall_guidance)),
        ("word_count", Some(word_count(essay_text).to_string())),
        ("essay_text", Some(essay_text.to_string())),
    ]);

    let mut lines = Vec::new();
    for (line_no, line) in template.lines().enumerate() {
        if let Some(rendered) = render_line(line, line_no + 1, &values)? {
            lines.push(rendered);
        }
    }
    Ok(lines.join("\n"))
}

/// Renders one template line; `Ok(None)` means the line is omitted.
fn render_line(
    line: &str,
    line_no: usize,
    values: &HashMap<&str, Option<String>>,
) -> Result<Option<String>, HydrationError> {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or(HydrationError::Unclosed(line_no))?;
        let name = after[..close].trim();

        match values.get(name) {
            Some(Some(value)) => out.push_str(value),
            Some(None) => return Ok(None),
            None => return Err(HydrationError::UnknownPlaceholder(name.to_string())),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);

    Ok(Some(out))
}

/// Selects the template for the request's scoring mode, hydrates it for
/// `school`, and appends the actionable directive when requested.
pub fn build_prompt(
    request: &EvaluationRequest,
    school: &SchoolCriteria,
) -> Result<String, HydrationError> {
    let mut prompt = hydrate(
        request.scoring_mode.template(),
        school,
        &request.essay_text,
        request.tone.as_deref(),
    )?;
    if request.force_actionable {
        prompt.push_str(ACTIONABLE_DIRECTIVE);
    }
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::fixtures::school;
    use crate::criteria::DEFAULT_PERSONALITY;

    const SHORT_ESSAY: &str = "I love science and robotics club.";

    fn request(mode: ScoringMode, force_actionable: bool) -> EvaluationRequest {
        EvaluationRequest {
            essay_text: SHORT_ESSAY.to_string(),
            school_names: vec!["Stanford University".to_string()],
            model_id: "openai/gpt-4o".to_string(),
            tone: None,
            scoring_mode: mode,
            force_actionable,
            is_retry: false,
        }
    }

    #[test]
    fn test_hydration_is_deterministic_and_fully_resolved() {
        let s = school("Stanford University");
        for template in [STANDARD_TEMPLATE, EXPERIMENTAL_TEMPLATE] {
            let a = hydrate(template, &s, SHORT_ESSAY, Some("Blunt")).unwrap();
            let b = hydrate(template, &s, SHORT_ESSAY, Some("Blunt")).unwrap();
            assert_eq!(a, b);
            assert!(!a.contains("{{"), "unresolved placeholder in: {a}");
            assert!(!a.contains("}}"));
        }
    }

    #[test]
    fn test_standard_template_includes_brevity_penalty_for_short_essay() {
        let prompt = build_prompt(
            &request(ScoringMode::Standard, false),
            &school("Stanford University"),
        )
        .unwrap();
        assert!(word_count(SHORT_ESSAY) < 100);
        assert!(prompt.contains("BREVITY PENALTY"));
        assert!(prompt.contains("fewer than 100 words"));
        assert!(prompt.contains("This essay has 6 words."));
    }

    #[test]
    fn test_experimental_template_is_additive_from_five() {
        let prompt = build_prompt(
            &request(ScoringMode::Experimental, false),
            &school("Stanford University"),
        )
        .unwrap();
        assert!(prompt.contains("Start every score at 5.0"));
        assert!(prompt.contains("math_log"));
        assert!(!prompt.contains("CRITICAL CALIBRATION"));
    }

    #[test]
    fn test_substitutes_school_fields() {
        let s = school("Stanford University");
        let prompt = hydrate(STANDARD_TEMPLATE, &s, SHORT_ESSAY, None).unwrap();
        assert!(prompt.contains("Admissions Committee for Stanford University."));
        assert!(prompt.contains("Persona: You are a Curious Faculty Reader."));
        assert!(prompt.contains("Must-Hit Signals: Intellectual vitality, Community impact"));
        assert!(prompt.contains("Core Priorities: Intellectual vitality, Community impact"));
        assert!(prompt.contains(
            "Avoid these Failure Modes: Resume recitation, Generic praise of the school"
        ));
        assert!(prompt.contains("Tone: Warm but exacting. Reward specificity."));
        assert!(prompt.contains(&format!("'{SHORT_ESSAY}'")));
    }

    #[test]
    fn test_explicit_tone_overrides_school_guidance() {
        let s = school("Stanford University");
        let prompt = hydrate(STANDARD_TEMPLATE, &s, SHORT_ESSAY, Some("Blunt and brutally honest"))
            .unwrap();
        assert!(prompt.contains("Tone: Deliver all feedback in this voice: Blunt and brutally honest."));
        assert!(!prompt.contains("Warm but exacting."));
    }

    #[test]
    fn test_blank_tone_falls_back_to_school_guidance() {
        let s = school("Stanford University");
        let prompt = hydrate(STANDARD_TEMPLATE, &s, SHORT_ESSAY, Some("   ")).unwrap();
        assert!(prompt.contains("Tone: Warm but exacting. Reward specificity."));
    }

    #[test]
    fn test_missing_personality_uses_default() {
        let mut s = school("Reed College");
        s.personality_style = None;
        let prompt = hydrate(STANDARD_TEMPLATE, &s, SHORT_ESSAY, None).unwrap();
        assert!(prompt.contains(&format!("Persona: You are a {DEFAULT_PERSONALITY}.")));
    }

    #[test]
    fn test_absent_failure_modes_line_is_omitted() {
        let mut s = school("Reed College");
        s.common_failure_modes.clear();
        let prompt = hydrate(STANDARD_TEMPLATE, &s, SHORT_ESSAY, None).unwrap();
        assert!(!prompt.contains("Failure Modes"));
        assert!(!prompt.contains("Subject Matter Guidance"));
        assert!(prompt.contains("Must-Hit Signals"));
    }

    #[test]
    fn test_essay_with_braces_is_copied_verbatim() {
        let s = school("Stanford University");
        let essay = "My favorite template is {{school_name}} and {{oops";
        let prompt = hydrate(STANDARD_TEMPLATE, &s, essay, None).unwrap();
        assert!(prompt.contains(essay));
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        let s = school("Stanford University");
        let err = hydrate("Hello {{mascot}}", &s, SHORT_ESSAY, None).unwrap_err();
        assert_eq!(err, HydrationError::UnknownPlaceholder("mascot".to_string()));
        assert!(err.to_string().contains("{{mascot}}"));
    }

    #[test]
    fn test_unclosed_placeholder_is_an_error() {
        let s = school("Stanford University");
        let err = hydrate("line one\nHello {{school_name", &s, SHORT_ESSAY, None).unwrap_err();
        assert_eq!(err, HydrationError::Unclosed(2));
    }

    #[test]
    fn test_force_actionable_appends_directive() {
        let s = school("Stanford University");
        let plain = build_prompt(&request(ScoringMode::Standard, false), &s).unwrap();
        let actionable = build_prompt(&request(ScoringMode::Standard, true), &s).unwrap();
        assert!(!plain.contains("ACTIONABLE FEEDBACK REQUIRED"));
        assert!(actionable.ends_with(ACTIONABLE_DIRECTIVE));
        assert!(actionable.starts_with(&plain));
    }
}
