//! Coalescing TTL cache over the upstream — the system's backpressure.
//!
//! The pending future is registered under its key *before* it is first
//! awaited, so any number of concurrent identical requests share exactly
//! one upstream call. A completed entry carries its completion time; an
//! access older than the TTL evicts and refetches. Any failure evicts and
//! is retried a bounded number of times before surfacing.

use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::{FutureExt as _, future::BoxFuture, future::Shared};
use tokio::{sync::Mutex, time::Instant};

use crate::{
  client::Upstream,
  error::{Error, Result},
  profile,
  types::SearchBody,
};

/// A resolved cache entry. Cloned out of the shared future by every waiter.
#[derive(Debug)]
struct Entry<T> {
  value:        Arc<T>,
  completed_at: Instant,
}

impl<T> Clone for Entry<T> {
  fn clone(&self) -> Self {
    Self {
      value:        Arc::clone(&self.value),
      completed_at: self.completed_at,
    }
  }
}

type Flight<T> = Shared<BoxFuture<'static, Result<Entry<T>>>>;

/// Single-flight registry with TTL, keyed by exact query string.
pub struct FlightCache<T> {
  ttl:   Duration,
  slots: Mutex<HashMap<String, Flight<T>>>,
}

impl<T: Send + Sync + 'static> FlightCache<T> {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      slots: Mutex::new(HashMap::new()),
    }
  }

  /// Return the cached value for `key`, joining an in-flight fetch or
  /// issuing a new one. `fetch` is invoked once per upstream attempt.
  pub async fn get_or_fetch<F, Fut>(
    &self,
    key: &str,
    retries: u32,
    fetch: F,
  ) -> Result<Arc<T>>
  where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let mut retries_left = retries;
    loop {
      let flight = {
        let mut slots = self.slots.lock().await;
        match slots.get(key) {
          Some(flight) => flight.clone(),
          None => {
            tracing::debug!(key, "cache miss, issuing upstream fetch");
            let fresh: Flight<T> = fetch()
              .map(|result| {
                result.map(|value| Entry {
                  value:        Arc::new(value),
                  completed_at: Instant::now(),
                })
              })
              .boxed()
              .shared();
            slots.insert(key.to_string(), fresh.clone());
            fresh
          }
        }
      };

      match flight.clone().await {
        Ok(entry) => {
          if entry.completed_at.elapsed() > self.ttl {
            // Stale: evict (unless someone already replaced it) and go
            // around again. TTL refresh does not consume a retry.
            tracing::debug!(key, "cache entry expired, refetching");
            self.evict(key, &flight).await;
            continue;
          }
          return Ok(entry.value);
        }
        Err(err) => {
          self.evict(key, &flight).await;
          if retries_left > 0 {
            retries_left -= 1;
            continue;
          }
          return Err(err);
        }
      }
    }
  }

  /// Remove `key` only if it still maps to the flight we observed;
  /// a concurrent caller may have evicted and reinserted already.
  async fn evict(&self, key: &str, flight: &Flight<T>) {
    let mut slots = self.slots.lock().await;
    if slots.get(key).is_some_and(|current| current.ptr_eq(flight)) {
      slots.remove(key);
    }
  }
}

/// The cached fetch layer: one search cache keyed by JQL string, one
/// profile cache keyed by user name, both with the same TTL/retry contract.
pub struct JiraFetcher<U> {
  upstream: Arc<U>,
  retries:  u32,
  search:   FlightCache<SearchBody>,
  profiles: FlightCache<profile::ProfileFields>,
}

impl<U: Upstream + 'static> JiraFetcher<U> {
  pub fn new(upstream: U, ttl: Duration, retries: u32) -> Self {
    Self {
      upstream: Arc::new(upstream),
      retries,
      search: FlightCache::new(ttl),
      profiles: FlightCache::new(ttl),
    }
  }

  /// Search issues by JQL through the cache.
  pub async fn search_issues(&self, jql: &str) -> Result<Arc<SearchBody>> {
    let upstream = Arc::clone(&self.upstream);
    let query = jql.to_string();
    self
      .search
      .get_or_fetch(jql, self.retries, move || {
        let upstream = Arc::clone(&upstream);
        let query = query.clone();
        async move { upstream.search(&query).await }
      })
      .await
  }

  /// Fetch and parse a user's profile fields through the cache. The parse
  /// is total (malformed pages yield an empty map), so only fetch failures
  /// take the evict-and-retry path.
  pub async fn user_profile(
    &self,
    name: &str,
  ) -> Result<Arc<profile::ProfileFields>> {
    let upstream = Arc::clone(&self.upstream);
    let name_owned = name.to_string();
    self
      .profiles
      .get_or_fetch(name, self.retries, move || {
        let upstream = Arc::clone(&upstream);
        let name = name_owned.clone();
        async move {
          let page = upstream.profile_page(&name).await?;
          Ok(profile::extract_fields(&page))
        }
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  fn counting_fetch(
    calls: Arc<AtomicUsize>,
  ) -> impl Fn() -> BoxFuture<'static, Result<u32>> {
    move || {
      let calls = Arc::clone(&calls);
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(7)
      }
      .boxed()
    }
  }

  #[tokio::test(start_paused = true)]
  async fn concurrent_identical_keys_share_one_fetch() {
    let cache = FlightCache::new(Duration::from_secs(300));
    let calls = Arc::new(AtomicUsize::new(0));

    let (a, b) = tokio::join!(
      cache.get_or_fetch("q", 1, counting_fetch(Arc::clone(&calls))),
      cache.get_or_fetch("q", 1, counting_fetch(Arc::clone(&calls))),
    );
    assert_eq!(*a.unwrap(), 7);
    assert_eq!(*b.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn distinct_keys_fetch_independently() {
    let cache = FlightCache::new(Duration::from_secs(300));
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .get_or_fetch("a", 1, counting_fetch(Arc::clone(&calls)))
      .await
      .unwrap();
    cache
      .get_or_fetch("b", 1, counting_fetch(Arc::clone(&calls)))
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn fresh_entry_is_a_cache_hit() {
    let cache = FlightCache::new(Duration::from_secs(300));
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
      cache
        .get_or_fetch("q", 1, counting_fetch(Arc::clone(&calls)))
        .await
        .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn expired_entry_triggers_exactly_one_refetch() {
    let cache = FlightCache::new(Duration::from_secs(300));
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .get_or_fetch("q", 1, counting_fetch(Arc::clone(&calls)))
      .await
      .unwrap();
    tokio::time::advance(Duration::from_secs(301)).await;
    cache
      .get_or_fetch("q", 1, counting_fetch(Arc::clone(&calls)))
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn failure_is_retried_once_then_succeeds() {
    let cache: FlightCache<u32> = FlightCache::new(Duration::from_secs(300));
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch = {
      let calls = Arc::clone(&calls);
      move || {
        let calls = Arc::clone(&calls);
        async move {
          if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(Error::Upstream {
              status:  500,
              query:   "q".into(),
              message: "boom".into(),
            })
          } else {
            Ok(9)
          }
        }
        .boxed()
      }
    };

    let value = cache.get_or_fetch("q", 1, fetch).await.unwrap();
    assert_eq!(*value, 9);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn exhausted_retries_surface_the_typed_error() {
    let cache: FlightCache<u32> = FlightCache::new(Duration::from_secs(300));
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch = {
      let calls = Arc::clone(&calls);
      move || {
        let calls = Arc::clone(&calls);
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Err(Error::Upstream {
            status:  500,
            query:   "bad jql".into(),
            message: "server error".into(),
          })
        }
        .boxed()
      }
    };

    let err = cache.get_or_fetch("bad jql", 1, fetch).await.unwrap_err();
    // Initial attempt plus one retry, no more.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    match err {
      Error::Upstream { status, query, .. } => {
        assert_eq!(status, 500);
        assert_eq!(query, "bad jql");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn failed_entry_is_evicted_for_later_callers() {
    let cache: FlightCache<u32> = FlightCache::new(Duration::from_secs(300));
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch = |calls: Arc<AtomicUsize>, ok: bool| {
      move || {
        let calls = Arc::clone(&calls);
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          if ok {
            Ok(1)
          } else {
            Err(Error::Transport {
              query:   "q".into(),
              message: "reset".into(),
            })
          }
        }
        .boxed()
      }
    };

    let err = cache
      .get_or_fetch("q", 0, fetch(Arc::clone(&calls), false))
      .await;
    assert!(err.is_err());

    // The failure must not be cached.
    let value = cache
      .get_or_fetch("q", 0, fetch(Arc::clone(&calls), true))
      .await
      .unwrap();
    assert_eq!(*value, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
