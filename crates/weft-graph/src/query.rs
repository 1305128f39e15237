//! Link queries over the entity store, with crawl-friendly wrappers.

use std::{collections::HashSet, time::Instant};

use weft_core::{
  EntityStore,
  query::{self, LinkPattern, LinkRow},
};

use crate::config::CrawlConfig;

/// Direct collaboration links touching `user`. `include_detail` pulls the
/// originating issue key/summary onto each row; the bare form is cheaper
/// and used while exploring.
pub fn direct_links(
  store: &EntityStore,
  config: &CrawlConfig,
  user: &str,
  include_detail: bool,
) -> Vec<LinkRow> {
  let start = Instant::now();
  let snapshot = store.read();
  let rows = query::direct_links(&snapshot, &LinkPattern {
    member: user,
    projects: &config.projects,
    include_detail,
  });
  tracing::debug!(
    user,
    links = rows.len(),
    elapsed_ms = start.elapsed().as_millis() as u64,
    "direct link query"
  );
  rows
}

/// Presentation traversal: recursively walk links outward from `user` over
/// the already-populated store, always with issue detail. Structurally the
/// same expansion as the crawl, minus the fetching.
pub fn links_from(
  store: &EntityStore,
  config: &CrawlConfig,
  user: &str,
  max_depth: u32,
) -> Vec<LinkRow> {
  fn walk(
    store: &EntityStore,
    config: &CrawlConfig,
    user: &str,
    depth: u32,
    seen: &mut HashSet<String>,
  ) -> Vec<LinkRow> {
    if depth == 0 || !seen.insert(user.to_string()) {
      return Vec::new();
    }
    let links = direct_links(store, config, user, true);
    let mut all = links.clone();
    for link in &links {
      all.extend(walk(store, config, &link.source, depth - 1, seen));
      all.extend(walk(store, config, &link.target, depth - 1, seen));
    }
    all
  }

  let mut seen = HashSet::new();
  walk(store, config, user, max_depth, &mut seen)
}
