//! The crawl service — one instance per session, owning the store, the
//! cached fetch layer, and the populated-seed set for its lifetime.

use std::{
  collections::HashSet,
  sync::Mutex as SyncMutex,
  time::Instant,
};

use serde::Serialize;
use tokio::sync::Mutex;
use weft_core::{EntityStore, user::UserRecord};
use weft_jira::{JiraFetcher, Upstream};

use crate::{
  assemble::{self, PresentationGraph},
  config::CrawlConfig,
  query,
};

/// What the sole entry point hands back: the assembled graph, or a
/// structured error. Serialises untagged, so callers receive either
/// `{nodes, edges}` or `{error}` and never an exception.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GraphResponse {
  Graph(PresentationGraph),
  Error { error: String },
}

/// Collaboration graph engine for one session.
///
/// The store and populated-seed set live as long as this service; a later
/// crawl reuses everything an earlier crawl fetched. Per-call state (the
/// visited set) never leaks between invocations.
pub struct GraphService<U: Upstream + 'static> {
  pub(crate) store:     EntityStore,
  pub(crate) fetcher:   JiraFetcher<U>,
  pub(crate) config:    CrawlConfig,
  /// Users whose tickets have been fetched and ingested at least once.
  /// Membership is monotonic for the service lifetime.
  pub(crate) populated: Mutex<HashSet<String>>,
  /// Users with a ticket search currently on the wire, for observability.
  pub(crate) in_flight: SyncMutex<HashSet<String>>,
}

impl<U: Upstream + 'static> GraphService<U> {
  pub fn new(upstream: U, config: CrawlConfig) -> Self {
    Self {
      store: EntityStore::new(),
      fetcher: JiraFetcher::new(upstream, config.cache_ttl, config.retries),
      config,
      populated: Mutex::new(HashSet::new()),
      in_flight: SyncMutex::new(HashSet::new()),
    }
  }

  /// Number of identity ticket searches currently in flight.
  pub fn in_flight_fetches(&self) -> usize {
    self
      .in_flight
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .len()
  }

  /// Build the collaboration graph around `seed`. The sole external
  /// operation; all failures come back as [`GraphResponse::Error`].
  pub async fn collaboration_graph(&self, seed: &str) -> GraphResponse {
    match self.build_graph(seed).await {
      Ok(graph) => GraphResponse::Graph(graph),
      Err(err) => {
        tracing::error!(seed, %err, "graph build failed");
        GraphResponse::Error {
          error: err.to_string(),
        }
      }
    }
  }

  async fn build_graph(
    &self,
    seed: &str,
  ) -> Result<PresentationGraph, weft_jira::Error> {
    let start = Instant::now();

    // The seed's own tickets are the one fetch the graph cannot do
    // without; deeper population failures are tolerated inside the
    // expansion.
    self.populate(seed).await?;

    let visited = Mutex::new(HashSet::new());
    self.expand(seed, self.config.max_depth, &visited).await;

    let links =
      query::links_from(&self.store, &self.config, seed, self.config.max_depth);
    let users = self.enriched_users().await?;

    tracing::info!(
      seed,
      entities = self.store.read().entity_count(),
      links = links.len(),
      elapsed_ms = start.elapsed().as_millis() as u64,
      "crawl complete"
    );
    Ok(assemble::assemble(seed, &users, links))
  }

  /// All users currently in the store, each enriched with profile fields
  /// through the cached profile lookup.
  async fn enriched_users(&self) -> Result<Vec<UserRecord>, weft_jira::Error> {
    let users: Vec<UserRecord> =
      self.store.read().users().cloned().collect();

    let enriched = futures::future::join_all(users.into_iter().map(
      |mut user| async move {
        let fields = self.fetcher.user_profile(&user.name).await?;
        user
          .profile
          .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok::<_, weft_jira::Error>(user)
      },
    ))
    .await;

    enriched.into_iter().collect()
  }
}
