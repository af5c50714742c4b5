//! Pre-built work-item documents for tests.

/// A well-formed two-story document. US-002 carries the lower priority
/// value and is therefore the next unit of work.
pub const TWO_STORY_DOCUMENT: &str = r#"{
  "project": "Demo",
  "branchName": "workloop/demo-feature",
  "description": "A small demo plan",
  "userStories": [
    {
      "id": "US-001",
      "title": "Polish the output",
      "description": "As a user, I want tidy output so that I can read it",
      "acceptanceCriteria": [
        "Output is aligned",
        "No trailing whitespace"
      ],
      "priority": 2,
      "passes": false,
      "notes": ""
    },
    {
      "id": "US-002",
      "title": "Wire up the parser",
      "description": "As a user, I want input parsed so that work can start",
      "acceptanceCriteria": [
        "Parser accepts valid input",
        "Typecheck passes"
      ],
      "priority": 1,
      "passes": false,
      "notes": ""
    }
  ]
}"#;

// US-002.2 exists because the second story has exactly two criteria; the
// taskgraph tests lean on that.

/// A document with one duplicated id and two missing required fields.
pub const DEFECTIVE_DOCUMENT: &str = r#"{
  "project": "Broken",
  "branchName": "workloop/broken",
  "userStories": [
    { "id": "US-001", "title": "First", "priority": 1 },
    { "id": "US-001", "title": "Shadowing first", "priority": 2 },
    { "id": "US-002", "priority": 3 },
    { "id": "US-003", "title": "No priority" }
  ]
}"#;
