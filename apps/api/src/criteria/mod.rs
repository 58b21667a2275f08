//! Criteria Store — the read-only catalogue of per-school evaluation records.
//!
//! Loaded once at startup (see `source`) and shared behind an `Arc`. Lookups
//! accept the canonical name or a loose variant of it ("The …", "… University").

pub mod briefs;
pub mod handlers;
pub mod source;

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// Fallback persona when a school record does not define one.
pub const DEFAULT_PERSONALITY: &str = "Experienced Admissions Reader";

/// One school's evaluation record. Immutable after load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchoolCriteria {
    pub name: String,
    #[serde(default)]
    pub must_hit_signals: Vec<String>,
    /// Not every brief lists failure modes; empty means "absent".
    #[serde(default)]
    pub common_failure_modes: Vec<String>,
    #[serde(default)]
    pub tone_guidance: Vec<String>,
    #[serde(default)]
    pub subject_matter_guidance: Vec<String>,
    #[serde(default)]
    pub overall_guidance: String,
    #[serde(default)]
    pub personality_style: Option<String>,
}

impl SchoolCriteria {
    pub fn personality(&self) -> &str {
        self.personality_style
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PERSONALITY)
    }

    pub fn failure_modes(&self) -> Option<&[String]> {
        if self.common_failure_modes.is_empty() {
            None
        } else {
            Some(&self.common_failure_modes)
        }
    }
}

#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("school record has an empty name")]
    EmptyName,

    #[error("duplicate school record: {0}")]
    Duplicate(String),

    #[error("criteria catalogue is empty")]
    Empty,

    #[error("invalid criteria JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory catalogue keyed by school name.
#[derive(Debug, Clone)]
pub struct CriteriaStore {
    schools: Vec<SchoolCriteria>,
    by_name: HashMap<String, usize>,
    by_normalized: HashMap<String, usize>,
}

impl CriteriaStore {
    pub fn new(schools: Vec<SchoolCriteria>) -> Result<Self, CriteriaError> {
        if schools.is_empty() {
            return Err(CriteriaError::Empty);
        }

        let mut by_name = HashMap::with_capacity(schools.len());
        let mut by_normalized = HashMap::with_capacity(schools.len());

        for (idx, school) in schools.iter().enumerate() {
            let name = school.name.trim();
            if name.is_empty() {
                return Err(CriteriaError::EmptyName);
            }
            if by_name.insert(name.to_string(), idx).is_some() {
                return Err(CriteriaError::Duplicate(name.to_string()));
            }
            // First record wins when two names normalize identically.
            by_normalized.entry(normalize_name(name)).or_insert(idx);
        }

        Ok(Self {
            schools,
            by_name,
            by_normalized,
        })
    }

    /// Parses a JSON array of school records.
    pub fn from_json(text: &str) -> Result<Self, CriteriaError> {
        let schools: Vec<SchoolCriteria> = serde_json::from_str(text)?;
        Self::new(schools)
    }

    /// Parses the numbered plain-text brief format.
    pub fn from_briefs(text: &str) -> Result<Self, CriteriaError> {
        Self::new(briefs::parse_briefs(text))
    }

    /// Exact lookup by canonical name.
    pub fn get(&self, name: &str) -> Option<&SchoolCriteria> {
        self.by_name.get(name.trim()).map(|&idx| &self.schools[idx])
    }

    /// Exact lookup, falling back to the normalized form of `name`.
    pub fn resolve(&self, name: &str) -> Option<&SchoolCriteria> {
        self.get(name).or_else(|| {
            self.by_normalized
                .get(&normalize_name(name))
                .map(|&idx| &self.schools[idx])
        })
    }

    pub fn all(&self) -> &[SchoolCriteria] {
        &self.schools
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }
}

/// Lowercases and strips a leading "the", a trailing parenthetical and a
/// trailing "university"/"college", so "The Ohio State University (Columbus)"
/// and "ohio state" compare equal.
pub fn normalize_name(name: &str) -> String {
    let mut n = name.trim().to_lowercase();

    if let Some(rest) = n.strip_prefix("the ") {
        n = rest.trim_start().to_string();
    }
    if n.ends_with(')') {
        if let Some(open) = n.rfind('(') {
            n.truncate(open);
            n = n.trim_end().to_string();
        }
    }
    for suffix in [" university", " college"] {
        if let Some(rest) = n.strip_suffix(suffix) {
            n = rest.trim_end().to_string();
            break;
        }
    }

    n.split_whitespace().collect::<Vec<_>>().join(" ")
}
