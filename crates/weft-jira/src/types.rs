//! Wire types for the Jira search response.
//!
//! Only the projected fields are modelled; everything else in the payload
//! is ignored by serde. All fields are defaulted — tickets in the wild are
//! missing more of them than the API documentation admits.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Body of `POST /rest/api/2/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchBody {
  #[serde(default)]
  pub issues: Vec<RawIssue>,
  #[serde(default)]
  pub total:  u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
  pub key:    String,
  #[serde(default)]
  pub fields: RawFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFields {
  #[serde(default)]
  pub issuetype:   Option<RawIssueType>,
  #[serde(default)]
  pub summary:     Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub created:     Option<String>,
  #[serde(default)]
  pub project:     Option<RawProject>,
  #[serde(default)]
  pub subtasks:    Vec<RawSubtask>,
  #[serde(default)]
  pub assignee:    Option<RawUser>,
  #[serde(default)]
  pub creator:     Option<RawUser>,
  #[serde(default)]
  pub reporter:    Option<RawUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawIssueType {
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProject {
  pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubtask {
  pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
  pub name:         String,
  #[serde(default, rename = "displayName")]
  pub display_name: Option<String>,
  /// Size label (e.g. `"48x48"`) to URL.
  #[serde(default, rename = "avatarUrls")]
  pub avatar_urls:  BTreeMap<String, String>,
  #[serde(default)]
  pub active:       Option<bool>,
  #[serde(default, rename = "timeZone")]
  pub time_zone:    Option<String>,
}
