//! The append-only in-memory entity store.
//!
//! Uniqueness is enforced by the index keys: users by name, issues by issue
//! key. There is no delete operation — the only mutation is an upsert batch
//! applied atomically under the write lock, so transactions never interleave
//! partially and readers always observe a fully-applied snapshot.

use std::{
  collections::BTreeMap,
  sync::{RwLock, RwLockReadGuard},
};

use crate::{
  fact::{Fact, RelationKind},
  issue::IssueRecord,
  user::UserRecord,
};

/// A consistent view of store contents. Obtained via [`EntityStore::read`];
/// holding it blocks writers, so keep it scoped to one query.
#[derive(Debug, Default)]
pub struct Snapshot {
  users:  BTreeMap<String, UserRecord>,
  issues: BTreeMap<String, IssueRecord>,
}

impl Snapshot {
  pub fn user(&self, name: &str) -> Option<&UserRecord> {
    self.users.get(name)
  }

  pub fn users(&self) -> impl Iterator<Item = &UserRecord> {
    self.users.values()
  }

  pub fn issue(&self, key: &str) -> Option<&IssueRecord> {
    self.issues.get(key)
  }

  pub fn issues(&self) -> impl Iterator<Item = &IssueRecord> {
    self.issues.values()
  }

  /// Total entity count, for crawl-summary logging.
  pub fn entity_count(&self) -> usize { self.users.len() + self.issues.len() }

  fn apply(&mut self, fact: Fact) {
    match fact {
      Fact::User { name, attrs } => {
        self
          .users
          .entry(name.clone())
          .or_insert_with(|| UserRecord::stub(name))
          .merge(attrs);
      }
      Fact::Issue { key, attrs } => {
        self
          .issues
          .entry(key.clone())
          .or_insert_with(|| IssueRecord::stub(key))
          .merge(attrs);
      }
      Fact::Relation { issue, kind, user } => {
        // Reference-valued: both ends exist after this fact, as stubs if
        // nothing else is known about them yet.
        self
          .users
          .entry(user.clone())
          .or_insert_with(|| UserRecord::stub(user.clone()));
        let record = self
          .issues
          .entry(issue.clone())
          .or_insert_with(|| IssueRecord::stub(issue));
        match kind {
          RelationKind::Assignee => record.assignee = Some(user),
          RelationKind::Creator => record.creator = Some(user),
          RelationKind::Reporter => record.reporter = Some(user),
          RelationKind::Mentioned => record.add_mention(user),
        }
      }
    }
  }
}

/// An append-only relational store shared by one crawl service.
///
/// Lives for the lifetime of its owning service; external idle-eviction
/// policy decides when the whole service (and this store with it) is
/// discarded.
#[derive(Debug, Default)]
pub struct EntityStore {
  inner: RwLock<Snapshot>,
}

impl EntityStore {
  pub fn new() -> Self { Self::default() }

  /// Apply a batch of facts atomically. Writers serialize on the lock;
  /// a batch is never observed half-applied.
  pub fn transact(&self, facts: Vec<Fact>) {
    let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
    for fact in facts {
      inner.apply(fact);
    }
  }

  /// Take a read snapshot for query evaluation.
  pub fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
    self.inner.read().unwrap_or_else(|e| e.into_inner())
  }
}
