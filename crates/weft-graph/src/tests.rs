//! Crawl and service tests against a canned fake upstream.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use tokio::sync::Mutex;
use weft_jira::{
  Error, Result, Upstream,
  types::{RawFields, RawIssue, RawProject, RawUser, SearchBody},
};

use crate::{GraphResponse, GraphService, config::CrawlConfig};

// ─── Fake upstream ───────────────────────────────────────────────────────────

/// Serves canned search results keyed by the quoted user name appearing in
/// the JQL, and canned profile pages keyed by user name.
#[derive(Default)]
struct FakeUpstream {
  tickets:      HashMap<String, Vec<RawIssue>>,
  profiles:     HashMap<String, String>,
  failing:      HashSet<String>,
  search_calls: Arc<AtomicUsize>,
}

impl FakeUpstream {
  fn with_tickets(mut self, user: &str, issues: Vec<RawIssue>) -> Self {
    self.tickets.insert(user.to_string(), issues);
    self
  }

  fn failing_for(mut self, user: &str) -> Self {
    self.failing.insert(user.to_string());
    self
  }
}

impl Upstream for FakeUpstream {
  async fn search(&self, jql: &str) -> Result<SearchBody> {
    self.search_calls.fetch_add(1, Ordering::SeqCst);
    let user = self
      .tickets
      .keys()
      .chain(self.failing.iter())
      .find(|name| jql.contains(&format!("\"{name}\"")));
    if let Some(user) = user
      && self.failing.contains(user.as_str())
    {
      return Err(Error::Upstream {
        status:  500,
        query:   jql.to_string(),
        message: "internal server error".into(),
      });
    }
    Ok(SearchBody {
      issues: user
        .and_then(|u| self.tickets.get(u))
        .cloned()
        .unwrap_or_default(),
      total:  0,
    })
  }

  async fn profile_page(&self, name: &str) -> Result<String> {
    Ok(self.profiles.get(name).cloned().unwrap_or_default())
  }
}

fn raw_user(name: &str) -> RawUser {
  RawUser {
    name:         name.into(),
    display_name: Some(name.to_uppercase()),
    avatar_urls:  Default::default(),
    active:       Some(true),
    time_zone:    None,
  }
}

fn issue(
  key: &str,
  assignee: &str,
  reporter: Option<&str>,
  description: Option<&str>,
) -> RawIssue {
  RawIssue {
    key:    key.into(),
    fields: RawFields {
      summary: Some(format!("{key} summary")),
      description: description.map(String::from),
      project: Some(RawProject { key: "FW".into() }),
      assignee: Some(raw_user(assignee)),
      reporter: reporter.map(raw_user),
      ..RawFields::default()
    },
  }
}

fn service(fake: FakeUpstream) -> GraphService<FakeUpstream> {
  GraphService::new(fake, CrawlConfig::default())
}

fn graph(response: GraphResponse) -> crate::PresentationGraph {
  match response {
    GraphResponse::Graph(graph) => graph,
    GraphResponse::Error { error } => panic!("unexpected error: {error}"),
  }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn one_shared_ticket_yields_one_edge() {
  let fake = FakeUpstream::default()
    .with_tickets("alice", vec![issue("FW-1", "alice", Some("bob"), None)]);
  let service = service(fake);

  let graph = graph(service.collaboration_graph("alice").await);
  assert_eq!(graph.nodes.len(), 2);
  assert_eq!(graph.edges.len(), 1);

  let edge = &graph.edges[0];
  assert_eq!(edge.source, "bob");
  assert_eq!(edge.target, "alice");
  assert_eq!(edge.tickets[0].key, "FW-1");
}

#[tokio::test]
async fn text_mentions_become_collaboration_edges() {
  let fake = FakeUpstream::default().with_tickets("alice", vec![issue(
    "FW-1",
    "alice",
    None,
    Some("ping [~carol] please"),
  )]);
  let service = service(fake);

  let graph = graph(service.collaboration_graph("alice").await);
  assert!(graph.nodes.iter().any(|n| n.id == "carol"));
  assert!(
    graph
      .edges
      .iter()
      .any(|e| e.source == "carol" && e.target == "alice")
  );
}

#[tokio::test]
async fn zero_depth_budget_expands_to_nothing() {
  let fake = FakeUpstream::default()
    .with_tickets("alice", vec![issue("FW-1", "alice", Some("bob"), None)]);
  let service = service(fake);
  service.populate("alice").await.unwrap();

  let visited = Mutex::new(HashSet::new());
  let links = service.expand("alice", 0, &visited).await;
  assert!(links.is_empty());
}

#[tokio::test]
async fn seed_fetch_failure_surfaces_a_structured_error() {
  let service = service(FakeUpstream::default().failing_for("alice"));

  match service.collaboration_graph("alice").await {
    GraphResponse::Error { error } => {
      assert!(error.contains("500"), "missing status: {error}");
      assert!(error.contains("assignee = \"alice\""), "missing query: {error}");
    }
    GraphResponse::Graph(_) => panic!("expected an error response"),
  }
}

#[tokio::test]
async fn non_seed_population_failures_do_not_abort_the_crawl() {
  let fake = FakeUpstream::default()
    .with_tickets("alice", vec![issue("FW-1", "alice", Some("bob"), None)])
    .failing_for("bob");
  let service = service(fake);

  // bob's fetch fails (twice, with the retry) but alice's links survive.
  let graph = graph(service.collaboration_graph("alice").await);
  assert_eq!(graph.edges.len(), 1);
  assert!(graph.nodes.iter().any(|n| n.id == "bob"));
}

#[tokio::test]
async fn transitive_collaborators_appear_at_depth_two() {
  let fake = FakeUpstream::default()
    .with_tickets("alice", vec![issue("FW-1", "alice", Some("bob"), None)])
    .with_tickets("bob", vec![issue("FW-2", "bob", Some("erin"), None)]);
  let service = service(fake);

  let graph = graph(service.collaboration_graph("alice").await);
  assert!(graph.nodes.iter().any(|n| n.id == "erin"));
  assert!(
    graph
      .edges
      .iter()
      .any(|e| e.source == "erin" && e.target == "bob")
  );
}

#[tokio::test]
async fn populated_seeds_are_not_refetched_within_a_service() {
  let fake = FakeUpstream::default()
    .with_tickets("alice", vec![issue("FW-1", "alice", Some("bob"), None)]);
  let calls = Arc::clone(&fake.search_calls);
  let service = service(fake);

  graph(service.collaboration_graph("alice").await);
  let after_first = calls.load(Ordering::SeqCst);

  // A second crawl reuses the populated set end to end.
  graph(service.collaboration_graph("alice").await);
  assert_eq!(calls.load(Ordering::SeqCst), after_first);
}

#[tokio::test]
async fn profile_enrichment_reaches_the_assembled_nodes() {
  let page = r#"
    <ul class="item-details">
      <li><dl><dt>Office:</dt><dd>Beijing</dd></dl></li>
    </ul>"#;
  let mut fake = FakeUpstream::default()
    .with_tickets("alice", vec![issue("FW-1", "alice", Some("bob"), None)]);
  fake.profiles.insert("alice".into(), page.into());
  fake.profiles.insert(
    "bob".into(),
    page.replace("Beijing", "New York"),
  );
  let service = service(fake);

  let graph = graph(service.collaboration_graph("alice").await);
  // Differing offices turn the edge into the cross-site alert color.
  assert_eq!(graph.edges[0].color, "rgb(220, 0, 0)");
}
