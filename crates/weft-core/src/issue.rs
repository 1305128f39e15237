//! Issue records — tickets keyed by their upstream issue key.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Partial issue attributes carried by a fact. Same merge discipline as
/// [`crate::user::UserAttrs`]: absent fields never clear stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueAttrs {
  pub issue_type:  Option<String>,
  pub summary:     Option<String>,
  pub description: Option<String>,
  pub created:     Option<DateTime<FixedOffset>>,
  /// Project key, e.g. `"FW"`.
  pub project:     Option<String>,
  /// Keys of subtask issues.
  pub subtasks:    Vec<String>,
}

/// A stored issue. Uniquely keyed by `key`; re-ingestion of the same key
/// merges in place, so ingesting a ticket twice is idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
  pub key:         String,
  pub issue_type:  Option<String>,
  pub summary:     Option<String>,
  pub description: Option<String>,
  pub created:     Option<DateTime<FixedOffset>>,
  pub project:     Option<String>,
  pub subtasks:    Vec<String>,

  // Relation slots. The first three are one-cardinality (a later relation
  // fact replaces the referenced user); `mentioned` is many-cardinality.
  pub assignee:  Option<String>,
  pub creator:   Option<String>,
  pub reporter:  Option<String>,
  pub mentioned: Vec<String>,
}

impl IssueRecord {
  pub fn stub(key: impl Into<String>) -> Self {
    Self {
      key:         key.into(),
      issue_type:  None,
      summary:     None,
      description: None,
      created:     None,
      project:     None,
      subtasks:    Vec::new(),
      assignee:    None,
      creator:     None,
      reporter:    None,
      mentioned:   Vec::new(),
    }
  }

  pub fn merge(&mut self, attrs: IssueAttrs) {
    if attrs.issue_type.is_some() {
      self.issue_type = attrs.issue_type;
    }
    if attrs.summary.is_some() {
      self.summary = attrs.summary;
    }
    if attrs.description.is_some() {
      self.description = attrs.description;
    }
    if attrs.created.is_some() {
      self.created = attrs.created;
    }
    if attrs.project.is_some() {
      self.project = attrs.project;
    }
    if !attrs.subtasks.is_empty() {
      self.subtasks = attrs.subtasks;
    }
  }

  /// Record a mention, preserving first-seen order. Re-asserting an
  /// existing mention is a no-op.
  pub fn add_mention(&mut self, user: String) {
    if !self.mentioned.contains(&user) {
      self.mentioned.push(user);
    }
  }
}
