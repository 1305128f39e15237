//! Ingestion mapper: one raw issue in, a batch of facts out.
//!
//! Emits stub users for every `[~name]` mention in the description, full
//! user facts for the present roles, the issue fact itself, and one
//! relation fact per present role and per mention. Absent roles emit
//! nothing; a missing description yields zero mentions.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use weft_core::{
  Fact, RelationKind, issue::IssueAttrs, user::UserAttrs,
};

use crate::types::{RawIssue, RawUser};

/// `[~pengxiao]` => `pengxiao`.
static MENTION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\[~(\w+)\]").unwrap());

/// Extract mentioned user names from free text, in order of appearance.
pub fn mentioned_users(text: &str) -> Vec<String> {
  MENTION
    .captures_iter(text)
    .map(|capture| capture[1].to_string())
    .collect()
}

/// Jira timestamps look like `2023-03-01T12:34:56.000+0000`; tolerate
/// RFC 3339 as well and give up quietly on anything else.
fn parse_created(raw: &str) -> Option<DateTime<FixedOffset>> {
  DateTime::parse_from_rfc3339(raw)
    .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.3f%z"))
    .ok()
}

fn user_fact(raw: &RawUser) -> Fact {
  Fact::User {
    name:  raw.name.clone(),
    attrs: UserAttrs {
      display_name: raw.display_name.clone(),
      avatar_urls:  raw.avatar_urls.clone(),
      active:       raw.active,
      time_zone:    raw.time_zone.clone(),
      profile:      Default::default(),
    },
  }
}

/// Map one raw issue to the facts that represent it.
pub fn issue_to_facts(issue: &RawIssue) -> Vec<Fact> {
  let fields = &issue.fields;
  let mentioned =
    mentioned_users(fields.description.as_deref().unwrap_or_default());

  let mut facts = Vec::new();
  for name in &mentioned {
    facts.push(Fact::user_stub(name.clone()));
  }

  let roles = [
    (RelationKind::Assignee, fields.assignee.as_ref()),
    (RelationKind::Creator, fields.creator.as_ref()),
    (RelationKind::Reporter, fields.reporter.as_ref()),
  ];
  for user in roles.iter().filter_map(|(_, user)| *user) {
    facts.push(user_fact(user));
  }

  facts.push(Fact::Issue {
    key:   issue.key.clone(),
    attrs: IssueAttrs {
      issue_type:  fields.issuetype.as_ref().map(|t| t.name.clone()),
      summary:     fields.summary.clone(),
      description: Some(fields.description.clone().unwrap_or_default()),
      created:     fields.created.as_deref().and_then(parse_created),
      project:     fields.project.as_ref().map(|p| p.key.clone()),
      subtasks:    fields.subtasks.iter().map(|s| s.key.clone()).collect(),
    },
  });

  for (kind, user) in roles {
    if let Some(user) = user {
      facts.push(Fact::Relation {
        issue: issue.key.clone(),
        kind,
        user: user.name.clone(),
      });
    }
  }
  for name in mentioned {
    facts.push(Fact::Relation {
      issue: issue.key.clone(),
      kind:  RelationKind::Mentioned,
      user:  name,
    });
  }
  facts
}
