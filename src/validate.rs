//! Structural validation for work-item documents.
//!
//! Validation runs over the raw JSON rather than the typed model because a
//! typed parse would reject the very documents this module must diagnose.
//! All issues are collected in one pass so a single run surfaces every
//! defect, never just the first.

use serde_json::Value;
use thiserror::Error;

/// Required fields every story must carry.
const REQUIRED_STORY_FIELDS: [&str; 3] = ["id", "title", "priority"];

/// One structural defect found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// The story list is missing or not a sequence.
    #[error("structure error: {detail}")]
    Structure { detail: String },

    /// The same story id appears more than once.
    #[error("duplicate story id '{id}' ({count} occurrences)")]
    DuplicateId { id: String, count: usize },

    /// A story is missing (or has an unusable value for) a required field.
    #[error("story {story_index}: missing required field '{field}'")]
    MissingField { story_index: usize, field: String },
}

/// The complete set of issues found in one validation pass.
///
/// Always carries the full list (empty on success) so a caller can report
/// everything at once.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true if the document passed validation (no issues).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Generate a human-readable summary of the validation result.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_valid() {
            "Document is valid.".to_string()
        } else {
            format!("Document is invalid with {} issue(s).", self.issues.len())
        }
    }

    fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }
}

/// Validate a parsed document.
///
/// Pure inspection; the input is never mutated. Checks, in order:
/// `userStories` is a sequence, no story id appears twice (every duplicate
/// is listed), and each story carries `id`, `title`, and `priority` (each
/// absence reported independently, per story).
#[must_use]
pub fn validate(document: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let stories = match document.get("userStories") {
        Some(Value::Array(stories)) => stories,
        Some(other) => {
            report.push(ValidationIssue::Structure {
                detail: format!("userStories must be a sequence, found {}", json_kind(other)),
            });
            return report;
        }
        None => {
            report.push(ValidationIssue::Structure {
                detail: "userStories is missing".to_string(),
            });
            return report;
        }
    };

    check_duplicate_ids(stories, &mut report);

    for (index, story) in stories.iter().enumerate() {
        check_required_fields(index, story, &mut report);
    }

    report
}

/// Validate a document from its JSON text. Unparseable input is a single
/// structure issue.
#[must_use]
pub fn validate_str(content: &str) -> ValidationReport {
    match serde_json::from_str::<Value>(content) {
        Ok(value) => validate(&value),
        Err(e) => ValidationReport {
            issues: vec![ValidationIssue::Structure {
                detail: format!("document is not valid JSON: {}", e),
            }],
        },
    }
}

/// Report every id that appears more than once, one issue per id.
fn check_duplicate_ids(stories: &[Value], report: &mut ValidationReport) {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for story in stories {
        let Some(id) = story.get("id").and_then(Value::as_str) else {
            continue; // absence reported separately as a missing field
        };
        match counts.iter_mut().find(|(seen, _)| seen == id) {
            Some((_, count)) => *count += 1,
            None => counts.push((id.to_string(), 1)),
        }
    }

    for (id, count) in counts {
        if count > 1 {
            report.push(ValidationIssue::DuplicateId { id, count });
        }
    }
}

/// Check `id`, `title`, and `priority` independently so one pass reports
/// every defect across every story.
fn check_required_fields(index: usize, story: &Value, report: &mut ValidationReport) {
    for field in REQUIRED_STORY_FIELDS {
        let present = match (field, story.get(field)) {
            (_, None) => false,
            // title is required and non-empty; an integer priority is the
            // only usable shape for ordering
            ("title", Some(value)) => value.as_str().is_some_and(|s| !s.is_empty()),
            ("id", Some(value)) => value.as_str().is_some_and(|s| !s.is_empty()),
            ("priority", Some(value)) => value.as_i64().is_some(),
            (_, Some(_)) => true,
        };

        if !present {
            report.push(ValidationIssue::MissingField {
                story_index: index,
                field: field.to_string(),
            });
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "an object",
    }
}
