//! HTTP routes: the graph endpoint and the avatar proxy.

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Query, RawQuery, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
  routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::sessions::SessionRegistry;

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState {
  pub sessions: Arc<SessionRegistry>,
  /// Client used to pass avatar requests through to the upstream.
  pub http:     reqwest::Client,
  pub jira:     weft_jira::JiraConfig,
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/api/graph", get(collaboration_graph))
    .route("/api/useravatar", get(user_avatar))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[derive(Debug, Deserialize)]
struct GraphParams {
  user:    String,
  #[serde(default)]
  session: Option<String>,
}

/// `GET /api/graph?user=<seed>[&session=<id>]`
///
/// Always answers 200 with either `{nodes, edges}` or `{error}` — the
/// engine never lets a failure escape as an exception, and the front end
/// distinguishes by shape.
async fn collaboration_graph(
  State(state): State<AppState>,
  Query(params): Query<GraphParams>,
) -> Response {
  let session = params.session.as_deref().unwrap_or("default");
  let service = match state.sessions.service(session).await {
    Ok(service) => service,
    Err(err) => {
      return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        .into_response();
    }
  };
  Json(service.collaboration_graph(&params.user).await).into_response()
}

/// `GET /api/useravatar?<query>`
///
/// Forwards the query string to the upstream avatar endpoint with the
/// server-side authorization attached, so the browser never needs (or
/// sees) upstream credentials.
async fn user_avatar(
  State(state): State<AppState>,
  RawQuery(query): RawQuery,
) -> Response {
  let url = format!(
    "{}/secure/useravatar?{}",
    state.jira.base_url.trim_end_matches('/'),
    query.unwrap_or_default()
  );
  let upstream = state
    .http
    .get(&url)
    .basic_auth(&state.jira.username, Some(&state.jira.password))
    .send()
    .await;

  match upstream {
    Ok(resp) => {
      let status = StatusCode::from_u16(resp.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
      let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
      match resp.bytes().await {
        Ok(body) => {
          (status, [(header::CONTENT_TYPE, content_type)], body)
            .into_response()
        }
        Err(err) => {
          (StatusCode::BAD_GATEWAY, err.to_string()).into_response()
        }
      }
    }
    Err(err) => (StatusCode::BAD_GATEWAY, err.to_string()).into_response(),
  }
}
