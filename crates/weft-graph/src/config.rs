//! Crawl constants. These are deployment facts, not user-facing flags.

use std::{collections::BTreeSet, time::Duration};

/// Tuning for one crawl service instance.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
  /// Project keys the crawl is allowed to see.
  pub projects:      BTreeSet<String>,
  /// Only tickets updated within this window are fetched.
  pub lookback_days: u32,
  /// Recursion budget from the seed. Identity count grows roughly as
  /// branching-factor^depth, so this stays small.
  pub max_depth:     u32,
  /// Age after which a cached upstream response is refetched.
  pub cache_ttl:     Duration,
  /// Extra attempts after a failed upstream fetch.
  pub retries:       u32,
}

impl Default for CrawlConfig {
  fn default() -> Self {
    Self {
      projects:      ["FW", "FWS", "UX", "EN"]
        .into_iter()
        .map(String::from)
        .collect(),
      lookback_days: 30,
      max_depth:     2,
      cache_ttl:     Duration::from_secs(5 * 60),
      retries:       1,
    }
  }
}

impl CrawlConfig {
  /// The JQL filter that finds one user's recent activity.
  pub fn seed_query(&self, user: &str) -> String {
    format!(
      "(assignee = \"{user}\" OR creator = \"{user}\" OR reporter = \
       \"{user}\") AND updated > startOfDay(\"-{}d\") order by updated DESC",
      self.lookback_days
    )
  }
}
