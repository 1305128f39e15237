//! Per-session graph services with idle eviction.
//!
//! Each browser session gets its own [`GraphService`] — its own entity
//! store and populated-seed set — created on first use. A background
//! reaper drops services idle for longer than the configured window; that
//! is the external lifecycle policy the engine itself stays agnostic of.

use std::{
  collections::HashMap,
  sync::Arc,
  time::{Duration, Instant},
};

use tokio::sync::Mutex;
use weft_graph::{CrawlConfig, GraphService};
use weft_jira::{JiraClient, JiraConfig};

/// How long a session may sit unused before its service is dropped.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Reaper wake-up interval.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

struct SessionEntry {
  service:   Arc<GraphService<JiraClient>>,
  last_used: Instant,
}

pub struct SessionRegistry {
  jira:     JiraConfig,
  sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
  pub fn new(jira: JiraConfig) -> Self {
    Self {
      jira,
      sessions: Mutex::new(HashMap::new()),
    }
  }

  /// Fetch the session's service, creating it on first use. Refreshes the
  /// idle clock.
  pub async fn service(
    &self,
    session: &str,
  ) -> Result<Arc<GraphService<JiraClient>>, weft_jira::Error> {
    let mut sessions = self.sessions.lock().await;
    if let Some(entry) = sessions.get_mut(session) {
      entry.last_used = Instant::now();
      return Ok(Arc::clone(&entry.service));
    }

    tracing::info!(session, "created new graph service");
    let client = JiraClient::new(self.jira.clone())?;
    let service =
      Arc::new(GraphService::new(client, CrawlConfig::default()));
    sessions.insert(session.to_string(), SessionEntry {
      service:   Arc::clone(&service),
      last_used: Instant::now(),
    });
    Ok(service)
  }

  /// Drop sessions idle for longer than `idle`. Returns how many went.
  pub async fn evict_idle(&self, idle: Duration) -> usize {
    let mut sessions = self.sessions.lock().await;
    let before = sessions.len();
    sessions.retain(|session, entry| {
      let keep = entry.last_used.elapsed() <= idle;
      if !keep {
        tracing::info!(session, "evicting idle graph service");
      }
      keep
    });
    before - sessions.len()
  }
}

/// Run the eviction loop forever. Spawned once at startup.
pub async fn reap_idle_sessions(registry: Arc<SessionRegistry>) {
  let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
  loop {
    ticker.tick().await;
    registry.evict_idle(IDLE_TIMEOUT).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn registry() -> SessionRegistry {
    SessionRegistry::new(JiraConfig {
      base_url: "https://tracker.example.com".into(),
      username: "svc".into(),
      password: "secret".into(),
    })
  }

  #[tokio::test]
  async fn sessions_are_reused_until_idle() {
    let registry = registry();
    let first = registry.service("s1").await.unwrap();
    let again = registry.service("s1").await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    assert_eq!(registry.evict_idle(Duration::from_secs(60)).await, 0);
    assert_eq!(registry.evict_idle(Duration::ZERO).await, 1);

    // A fresh service is built after eviction.
    let rebuilt = registry.service("s1").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
  }
}
