//! Parser for the plain-text school brief format.
//!
//! ```text
//! 1) Stanford University
//! Must-Hit Signals
//! • Intellectual vitality
//! Common Failure Modes
//! • Listing achievements
//! Tone Guidance
//! Warm, curious.
//! Overall Guidance
//! Show how you think.
//! ```
//!
//! Each numbered block becomes one `SchoolCriteria`. Lines before the first
//! section header are ignored. A later block with the same name (case-insensitive)
//! replaces the earlier one.

use super::SchoolCriteria;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    MustHit,
    FailureModes,
    Tone,
    SubjectMatter,
    Overall,
}

fn section_for(line: &str) -> Option<Section> {
    let lower = line.to_lowercase();
    if lower.contains("must-hit signals") {
        Some(Section::MustHit)
    } else if lower.contains("common failure modes") {
        Some(Section::FailureModes)
    } else if lower.contains("tone guidance") {
        Some(Section::Tone)
    } else if lower.contains("subject matter guidance") {
        Some(Section::SubjectMatter)
    } else if lower.contains("overall guidance") {
        Some(Section::Overall)
    } else {
        None
    }
}

/// Returns the text after a leading `N)` marker, if the line starts a block.
fn block_header(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(')').map(str::trim)
}

fn strip_bullet(line: &str) -> &str {
    let line = line
        .trim_start_matches(['•', '-', '*', '\u{25aa}'])
        .trim_start();
    // Word exports nested bullets as "o<TAB>".
    match line.strip_prefix("o\t").or_else(|| line.strip_prefix("o ")) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

pub fn parse_briefs(text: &str) -> Vec<SchoolCriteria> {
    let mut schools: Vec<SchoolCriteria> = Vec::new();
    let mut current: Option<SchoolCriteria> = None;
    let mut section: Option<Section> = None;
    let mut awaiting_name = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = block_header(line) {
            if let Some(done) = current.take() {
                push_school(&mut schools, done);
            }
            section = None;
            awaiting_name = rest.is_empty();
            current = Some(empty_school(rest));
            continue;
        }

        let Some(school) = current.as_mut() else {
            continue;
        };

        if awaiting_name {
            school.name = line.to_string();
            awaiting_name = false;
            continue;
        }

        if let Some(next) = section_for(line) {
            section = Some(next);
            continue;
        }

        match section {
            Some(Section::MustHit) => school.must_hit_signals.push(strip_bullet(line).to_string()),
            Some(Section::FailureModes) => {
                school.common_failure_modes.push(strip_bullet(line).to_string())
            }
            Some(Section::Tone) => school.tone_guidance.push(strip_bullet(line).to_string()),
            Some(Section::SubjectMatter) => school
                .subject_matter_guidance
                .push(strip_bullet(line).to_string()),
            Some(Section::Overall) => {
                if !school.overall_guidance.is_empty() {
                    school.overall_guidance.push(' ');
                }
                school.overall_guidance.push_str(line);
            }
            None => {}
        }
    }

    if let Some(done) = current.take() {
        push_school(&mut schools, done);
    }

    schools
}

fn empty_school(name: &str) -> SchoolCriteria {
    SchoolCriteria {
        name: name.to_string(),
        must_hit_signals: Vec::new(),
        common_failure_modes: Vec::new(),
        tone_guidance: Vec::new(),
        subject_matter_guidance: Vec::new(),
        overall_guidance: String::new(),
        personality_style: None,
    }
}

fn push_school(schools: &mut Vec<SchoolCriteria>, school: SchoolCriteria) {
    if school.name.trim().is_empty() {
        return;
    }
    let key = school.name.to_lowercase();
    match schools.iter_mut().find(|s| s.name.to_lowercase() == key) {
        Some(existing) => *existing = school,
        None => schools.push(school),
    }
}
