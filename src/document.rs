//! Work-item document model.
//!
//! The document is the persisted record of a project's planned work: a list
//! of stories with acceptance criteria, priority, and completion state. The
//! external worker mutates it in place, so callers re-read it fresh rather
//! than caching a copy across iterations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, WorkloopError};

/// One unit of planned work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "acceptanceCriteria", default)]
    pub acceptance_criteria: Vec<String>,
    pub priority: i64,
    #[serde(default)]
    pub passes: bool,
    #[serde(default)]
    pub notes: String,
}

/// The persisted work-item document.
///
/// `branch_name` is the logical run identity; a change to it is what
/// triggers archiving of the previous run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkDocument {
    pub project: String,
    #[serde(rename = "branchName")]
    pub branch_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "userStories")]
    pub user_stories: Vec<Story>,
}

/// Completion summary for the `status` command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub project: String,
    pub total_stories: usize,
    pub completed_stories: usize,
    pub completion_percentage: f64,
    pub incomplete_stories: Vec<StoryRef>,
}

/// Minimal story reference used in summaries.
#[derive(Debug, Clone, Serialize)]
pub struct StoryRef {
    pub id: String,
    pub title: String,
}

/// How many incomplete stories a summary lists before truncating.
const SUMMARY_INCOMPLETE_LIMIT: usize = 5;

impl WorkDocument {
    /// Load and parse the document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WorkloopError::Document {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&content)
    }

    /// Parse the document from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| WorkloopError::Document {
            message: format!("failed to parse document: {}", e),
        })
    }

    /// The next story to work on: lowest priority value among stories that
    /// have not yet passed, ties broken by document order.
    pub fn next_story(&self) -> Option<&Story> {
        self.user_stories
            .iter()
            .filter(|s| !s.passes)
            .min_by_key(|s| s.priority)
    }

    /// Count of stories marked as passing.
    pub fn completed(&self) -> usize {
        self.user_stories.iter().filter(|s| s.passes).count()
    }

    /// True once every story passes.
    pub fn all_complete(&self) -> bool {
        !self.user_stories.is_empty() && self.completed() == self.user_stories.len()
    }

    /// Build a completion summary (first few incomplete stories in
    /// ascending priority order).
    pub fn status(&self) -> StatusSummary {
        let total = self.user_stories.len();
        let completed = self.completed();

        let mut incomplete: Vec<&Story> =
            self.user_stories.iter().filter(|s| !s.passes).collect();
        incomplete.sort_by_key(|s| s.priority);

        StatusSummary {
            project: self.project.clone(),
            total_stories: total,
            completed_stories: completed,
            completion_percentage: if total > 0 {
                (completed as f64 / total as f64 * 1000.0).round() / 10.0
            } else {
                0.0
            },
            incomplete_stories: incomplete
                .into_iter()
                .take(SUMMARY_INCOMPLETE_LIMIT)
                .map(|s| StoryRef {
                    id: s.id.clone(),
                    title: s.title.clone(),
                })
                .collect(),
        }
    }
}

/// Read just the branch identity from a document file, tolerating any
/// failure. The archive manager uses this so a missing or corrupt document
/// never blocks the loop.
pub fn read_branch_name(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    let branch = value.get("branchName")?.as_str()?;
    if branch.is_empty() {
        None
    } else {
        Some(branch.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    #[test]
    fn test_parse_document() {
        let doc = WorkDocument::from_json(fixtures::TWO_STORY_DOCUMENT).unwrap();
        assert_eq!(doc.project, "Demo");
        assert_eq!(doc.branch_name, "workloop/demo-feature");
        assert_eq!(doc.user_stories.len(), 2);
        assert_eq!(doc.user_stories[0].acceptance_criteria.len(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = WorkDocument::from_json("{not json").unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_next_story_honors_priority() {
        // US-001 has priority 2, US-002 has priority 1
        let doc = WorkDocument::from_json(fixtures::TWO_STORY_DOCUMENT).unwrap();
        let next = doc.next_story().unwrap();
        assert_eq!(next.id, "US-002");
    }

    #[test]
    fn test_next_story_skips_passed() {
        let mut doc = WorkDocument::from_json(fixtures::TWO_STORY_DOCUMENT).unwrap();
        let idx = doc
            .user_stories
            .iter()
            .position(|s| s.id == "US-002")
            .unwrap();
        doc.user_stories[idx].passes = true;

        assert_eq!(doc.next_story().unwrap().id, "US-001");
    }

    #[test]
    fn test_next_story_none_when_all_pass() {
        let mut doc = WorkDocument::from_json(fixtures::TWO_STORY_DOCUMENT).unwrap();
        for story in &mut doc.user_stories {
            story.passes = true;
        }
        assert!(doc.next_story().is_none());
        assert!(doc.all_complete());
    }

    #[test]
    fn test_status_summary() {
        let mut doc = WorkDocument::from_json(fixtures::TWO_STORY_DOCUMENT).unwrap();
        doc.user_stories[0].passes = true;

        let status = doc.status();
        assert_eq!(status.total_stories, 2);
        assert_eq!(status.completed_stories, 1);
        assert!((status.completion_percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(status.incomplete_stories.len(), 1);
    }

    #[test]
    fn test_status_empty_document() {
        let doc = WorkDocument {
            project: "Empty".into(),
            branch_name: "workloop/empty".into(),
            description: String::new(),
            user_stories: vec![],
        };
        let status = doc.status();
        assert_eq!(status.completion_percentage, 0.0);
        assert!(!doc.all_complete());
    }

    #[test]
    fn test_read_branch_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("workplan.json");
        std::fs::write(&path, fixtures::TWO_STORY_DOCUMENT).unwrap();

        assert_eq!(
            read_branch_name(&path).as_deref(),
            Some("workloop/demo-feature")
        );
    }

    #[test]
    fn test_read_branch_name_fails_open() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.json");
        assert!(read_branch_name(&missing).is_none());

        let corrupt = temp.path().join("corrupt.json");
        std::fs::write(&corrupt, "{oops").unwrap();
        assert!(read_branch_name(&corrupt).is_none());
    }
}
