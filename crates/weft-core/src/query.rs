//! Declarative link-pattern queries over a store snapshot.
//!
//! The collaboration pattern: for a focal member `m`, every pair
//! `(u1, u2)` where some issue in the allowed project set has `u1` as
//! assignee, `u1 != u2`, `u2` is creator, reporter, or mentioned on that
//! issue, and `m` is one of the two. The result row points from the
//! contributor to the assignee — "who contributes to what the assignee
//! owns".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::store::Snapshot;

/// Query parameters for [`direct_links`].
#[derive(Debug, Clone)]
pub struct LinkPattern<'a> {
  /// The focal member; every returned row touches this user.
  pub member:         &'a str,
  /// Allowed project keys; issues outside are invisible to the pattern.
  pub projects:       &'a BTreeSet<String>,
  /// When set, rows carry the originating issue's key and summary and one
  /// row is produced per (pair, issue). When unset, rows are bare pairs
  /// deduplicated across issues — the cheap form used during exploration.
  pub include_detail: bool,
}

/// Key and summary of the issue a link was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRef {
  pub key:     String,
  pub summary: String,
}

/// One directed collaboration link: `source` contributed to an issue that
/// `target` owns as assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRow {
  pub source: String,
  pub target: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ticket: Option<TicketRef>,
}

/// Evaluate the collaboration pattern against a snapshot.
pub fn direct_links(snapshot: &Snapshot, pattern: &LinkPattern<'_>) -> Vec<LinkRow> {
  let mut rows = Vec::new();
  // Pair-level dedup used only in the bare form; detail rows are distinct
  // per issue already.
  let mut seen_pairs: BTreeSet<(String, String)> = BTreeSet::new();

  for issue in snapshot.issues() {
    let in_scope = issue
      .project
      .as_ref()
      .is_some_and(|p| pattern.projects.contains(p));
    if !in_scope {
      continue;
    }
    let Some(assignee) = issue.assignee.as_deref() else {
      continue;
    };

    // Set semantics per issue: a user who is both creator and reporter
    // contributes one pair, not two.
    let contributors: BTreeSet<&str> = issue
      .creator
      .as_deref()
      .into_iter()
      .chain(issue.reporter.as_deref())
      .chain(issue.mentioned.iter().map(String::as_str))
      .collect();

    for contributor in contributors {
      if contributor == assignee {
        continue;
      }
      if pattern.member != assignee && pattern.member != contributor {
        continue;
      }
      if !pattern.include_detail {
        let pair = (contributor.to_string(), assignee.to_string());
        if !seen_pairs.insert(pair) {
          continue;
        }
      }
      rows.push(LinkRow {
        source: contributor.to_string(),
        target: assignee.to_string(),
        ticket: pattern.include_detail.then(|| TicketRef {
          key:     issue.key.clone(),
          summary: issue.summary.clone().unwrap_or_default(),
        }),
      });
    }
  }
  rows
}
