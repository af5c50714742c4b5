//! Task graph conversion for work-item documents.
//!
//! Expands a validated document into a two-level graph: one parent task per
//! story and one child task per acceptance criterion, with dependency edges
//! that enforce cross-story priority ordering. Conversion is a pure function
//! of the document: same input, same graph. Callers must validate first;
//! behavior on invalid documents is unspecified.

use serde::{Deserialize, Serialize};

use crate::document::WorkDocument;

/// Role of a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Parent,
    Child,
}

/// One node in the derived graph.
///
/// `depends_on` lists node ids that must be tracked to completion before
/// this node: a child depends on its parent, and each parent (after the
/// first in priority order) depends on the previous story's final node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub story_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// The derived parent/child dependency structure, ready for handoff to an
/// external task-tracking system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGraph {
    pub tasks: Vec<TaskNode>,
}

/// Counts of what a conversion produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub parent_tasks: usize,
    pub child_tasks: usize,
    pub dependency_edges: usize,
}

impl TaskGraph {
    /// Convert a validated document into a task graph.
    ///
    /// Stories are processed in ascending priority order (stable on ties).
    /// For each story one parent task is emitted, then one child task per
    /// acceptance criterion in original order. Children link to their
    /// parent; each parent after the first links to the previous story's
    /// last child (or its parent when that story has no criteria), which
    /// totally orders stories while leaving intra-story ordering to the
    /// consuming system.
    #[must_use]
    pub fn from_document(document: &WorkDocument) -> Self {
        let mut order: Vec<usize> = (0..document.user_stories.len()).collect();
        order.sort_by_key(|&i| document.user_stories[i].priority);

        let mut tasks = Vec::new();
        let mut previous_tail: Option<String> = None;

        for index in order {
            let story = &document.user_stories[index];

            let mut parent = TaskNode {
                id: story.id.clone(),
                title: story.title.clone(),
                kind: TaskKind::Parent,
                story_id: story.id.clone(),
                depends_on: Vec::new(),
            };
            if let Some(tail) = previous_tail.take() {
                parent.depends_on.push(tail);
            }
            let parent_id = parent.id.clone();
            tasks.push(parent);

            let mut tail = parent_id.clone();
            for (n, criterion) in story.acceptance_criteria.iter().enumerate() {
                let child_id = format!("{}.{}", story.id, n + 1);
                tasks.push(TaskNode {
                    id: child_id.clone(),
                    title: criterion.clone(),
                    kind: TaskKind::Child,
                    story_id: story.id.clone(),
                    depends_on: vec![parent_id.clone()],
                });
                tail = child_id;
            }

            previous_tail = Some(tail);
        }

        Self { tasks }
    }

    /// Counts of parents, children, and dependency edges in this graph.
    #[must_use]
    pub fn report(&self) -> ConversionReport {
        let parent_tasks = self
            .tasks
            .iter()
            .filter(|t| t.kind == TaskKind::Parent)
            .count();
        ConversionReport {
            parent_tasks,
            child_tasks: self.tasks.len() - parent_tasks,
            dependency_edges: self.tasks.iter().map(|t| t.depends_on.len()).sum(),
        }
    }
}
