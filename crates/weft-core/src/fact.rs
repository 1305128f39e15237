//! Fact types — the unit of mutation accepted by [`crate::EntityStore`].
//!
//! A fact is an upsert keyed by an entity's unique name or issue key.
//! Relation facts reference both ends by key, never by internal identifier,
//! and implicitly create stub records for ends not yet in the store.

use serde::{Deserialize, Serialize};

use crate::{issue::IssueAttrs, user::UserAttrs};

/// The relation slots an issue can hold toward users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
  Assignee,
  Creator,
  Reporter,
  Mentioned,
}

impl RelationKind {
  /// Whether an issue holds at most one user in this slot.
  pub fn is_single(self) -> bool { !matches!(self, Self::Mentioned) }
}

/// One upsert applied by [`crate::EntityStore::transact`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "fact", rename_all = "snake_case")]
pub enum Fact {
  User {
    name:  String,
    attrs: UserAttrs,
  },
  Issue {
    key:   String,
    attrs: IssueAttrs,
  },
  Relation {
    issue: String,
    kind:  RelationKind,
    user:  String,
  },
}

impl Fact {
  /// A user fact that asserts nothing beyond existence.
  pub fn user_stub(name: impl Into<String>) -> Self {
    Self::User {
      name:  name.into(),
      attrs: UserAttrs::default(),
    }
  }
}
