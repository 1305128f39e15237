//! Bounded recursive expansion from a seed identity.
//!
//! Each newly-seen identity gets one ticket fetch (through the coalescing
//! cache) and one transact; its direct links then drive the recursion over
//! both endpoints at a reduced depth budget. Sibling branches run
//! concurrently; store writes stay serialized by the store's own lock.

use std::{collections::HashSet, time::Instant};

use futures::{FutureExt as _, future::BoxFuture};
use tokio::sync::Mutex;
use weft_core::query::LinkRow;
use weft_jira::{Upstream, ingest};

use crate::{query, service::GraphService};

impl<U: Upstream + 'static> GraphService<U> {
  /// Recursively expand `user`, returning its direct links plus everything
  /// found below it. Duplicate rows across branches are expected; the
  /// assembler deduplicates.
  ///
  /// `visited` is scoped to one crawl call. The populated set outlives it:
  /// conflating the two would either break recursion termination or undo
  /// cross-crawl fetch caching.
  pub(crate) fn expand<'a>(
    &'a self,
    user: &'a str,
    depth: u32,
    visited: &'a Mutex<HashSet<String>>,
  ) -> BoxFuture<'a, Vec<LinkRow>> {
    async move {
      if depth == 0 {
        return Vec::new();
      }
      {
        let mut visited = visited.lock().await;
        if !visited.insert(user.to_string()) {
          return Vec::new();
        }
      }

      if let Err(err) = self.populate(user).await {
        // Keep crawling on whatever the store already holds for this
        // user; this node just contributes fewer (possibly zero) links.
        tracing::warn!(user, %err, "population failed, continuing");
      }

      let links = query::direct_links(&self.store, &self.config, user, false);

      let children = links
        .iter()
        .flat_map(|link| [link.source.clone(), link.target.clone()])
        .map(|endpoint| async move {
          self.expand(&endpoint, depth - 1, visited).await
        });
      let nested = futures::future::join_all(children).await;

      let mut all = links;
      all.extend(nested.into_iter().flatten());
      all
    }
    .boxed()
  }

  /// Fetch and ingest `user`'s recent tickets unless already done during
  /// this service's lifetime.
  pub(crate) async fn populate(
    &self,
    user: &str,
  ) -> Result<(), weft_jira::Error> {
    if self.populated.lock().await.contains(user) {
      return Ok(());
    }

    let query = self.config.seed_query(user);
    let start = Instant::now();
    let pending = {
      let mut in_flight =
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
      in_flight.insert(user.to_string());
      in_flight.len()
    };
    tracing::info!(user, pending, "searching tickets");

    let result = self.fetcher.search_issues(&query).await;
    self
      .in_flight
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .remove(user);
    let body = result?;

    let facts: Vec<_> =
      body.issues.iter().flat_map(ingest::issue_to_facts).collect();
    self.store.transact(facts);
    self.populated.lock().await.insert(user.to_string());

    tracing::info!(
      user,
      issues = body.issues.len(),
      elapsed_ms = start.elapsed().as_millis() as u64,
      "populated"
    );
    Ok(())
  }
}
