//! Graph assembly: raw users + raw links in, styled presentation graph out.
//!
//! Raw links arrive duplicated across recursion branches. Assembly dedups
//! them per ticket, groups per directed pair, and derives the visual
//! attributes (edge color and width, node size and highlight) the front
//! end renders directly.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use weft_core::{
  query::{LinkRow, TicketRef},
  user::UserRecord,
};

/// Default edge shade for links not touching the focus.
const SECONDARY_COLOR: &str = "rgb(220, 220, 220)";
/// Stronger shade when either endpoint is the focus.
const PRIMARY_COLOR: &str = "rgba(100, 100, 100, 0.9)";
/// Cross-site collaboration signal: both offices known and differing.
const ALERT_COLOR: &str = "rgb(220, 0, 0)";

/// Edge width is the ticket count of its group, capped here.
const MAX_EDGE_WIDTH: usize = 8;
/// Focus nodes are always rendered at the maximum size.
const MAX_NODE_SIZE: u32 = 64;
const MIN_NODE_SIZE: u32 = 32;

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
  pub id:          String,
  pub label:       String,
  /// Same-origin proxy path, never the upstream avatar URL.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar:      Option<String>,
  pub size:        u32,
  /// Set when the node collaborates directly with the focus.
  pub highlighted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
  pub source:      String,
  pub target:      String,
  /// Every ticket this pair collaborated on.
  pub tickets:     Vec<TicketRef>,
  pub color:       String,
  pub width:       u32,
  /// Set when either endpoint is the focus.
  pub highlighted: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PresentationGraph {
  pub nodes: Vec<GraphNode>,
  pub edges: Vec<GraphEdge>,
}

/// Rewrite an upstream avatar URL onto the same-origin proxy path. Only
/// the query parameters survive; host, path, and any embedded auth context
/// are dropped.
fn proxy_avatar_url(upstream: &str) -> String {
  let params = upstream.split_once('?').map(|(_, q)| q).unwrap_or_default();
  format!("/api/useravatar?{params}")
}

fn office_of<'a>(users: &'a [UserRecord], name: &str) -> Option<&'a str> {
  users.iter().find(|u| u.name == name).and_then(UserRecord::office)
}

/// Assemble the presentation graph for `focus`.
pub fn assemble(
  focus: &str,
  users: &[UserRecord],
  links: Vec<LinkRow>,
) -> PresentationGraph {
  if users.is_empty() || links.is_empty() {
    return PresentationGraph::default();
  }

  // Users sharing at least one link with the focus.
  let primary: HashSet<&str> = users
    .iter()
    .filter(|user| {
      links.iter().any(|link| {
        let ends = [link.source.as_str(), link.target.as_str()];
        ends.contains(&user.name.as_str()) && ends.contains(&focus)
      })
    })
    .map(|user| user.name.as_str())
    .collect();

  // Dedup on (source, target, ticket key), then group by directed pair,
  // preserving first-appearance order.
  let mut seen: HashSet<(String, String, String)> = HashSet::new();
  let mut group_index: HashMap<(String, String), usize> = HashMap::new();
  let mut groups: Vec<((String, String), Vec<LinkRow>)> = Vec::new();
  for link in links {
    let ticket_key = link
      .ticket
      .as_ref()
      .map(|t| t.key.clone())
      .unwrap_or_default();
    if !seen.insert((link.source.clone(), link.target.clone(), ticket_key)) {
      continue;
    }
    let pair = (link.source.clone(), link.target.clone());
    match group_index.get(&pair) {
      Some(&at) => groups[at].1.push(link),
      None => {
        group_index.insert(pair.clone(), groups.len());
        groups.push((pair, vec![link]));
      }
    }
  }

  let edges: Vec<GraphEdge> = groups
    .into_iter()
    .map(|((source, target), rows)| {
      let primary_link = source == focus || target == focus;
      let mut color =
        if primary_link { PRIMARY_COLOR } else { SECONDARY_COLOR };
      if let (Some(a), Some(b)) =
        (office_of(users, &source), office_of(users, &target))
        && a != b
      {
        color = ALERT_COLOR;
      }
      GraphEdge {
        source,
        target,
        color: color.to_string(),
        width: rows.len().min(MAX_EDGE_WIDTH) as u32,
        tickets: rows.into_iter().filter_map(|row| row.ticket).collect(),
        highlighted: primary_link,
      }
    })
    .collect();

  let nodes: Vec<GraphNode> = users
    .iter()
    .filter_map(|user| {
      let degree = edges
        .iter()
        .filter(|e| e.source == user.name || e.target == user.name)
        .count() as u32;
      // Isolated users never render, the focus included.
      if degree == 0 {
        return None;
      }
      let size = if user.name == focus {
        MAX_NODE_SIZE
      } else {
        (degree * 10).clamp(MIN_NODE_SIZE, MAX_NODE_SIZE)
      };
      Some(GraphNode {
        id:          user.name.clone(),
        label:       user.label().to_string(),
        avatar:      user.avatar_urls.get("48x48").map(|u| proxy_avatar_url(u)),
        size,
        highlighted: primary.contains(user.name.as_str()),
      })
    })
    .collect();

  PresentationGraph { nodes, edges }
}
