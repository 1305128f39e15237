//! Async HTTP client for the Jira REST search and profile pages.

use std::{future::Future, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Client, header};
use serde_json::json;

use crate::{
  error::{Error, Result},
  types::SearchBody,
};

/// Per-request upstream timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Page size for the search endpoint. One page is enough: results are
/// ordered by update recency and the crawl only wants fresh activity.
const MAX_RESULTS: u32 = 100;

/// Field projection sent with every search, to keep payloads small.
const SEARCH_FIELDS: &[&str] = &[
  "key",
  "subtasks",
  "issuelinks",
  "reporter",
  "description",
  "assignee",
  "status",
  "creator",
  "project",
  "issuetype",
  "summary",
  "created",
];

/// Connection settings for the upstream tracker.
#[derive(Debug, Clone)]
pub struct JiraConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// The seam between the fetch layer and the network. Implemented by
/// [`JiraClient`] in production and by counting fakes in tests.
pub trait Upstream: Send + Sync {
  /// `POST /rest/api/2/search` with the fixed field projection.
  fn search(
    &self,
    jql: &str,
  ) -> impl Future<Output = Result<SearchBody>> + Send;

  /// Fetch the raw profile page for a user name.
  fn profile_page(
    &self,
    name: &str,
  ) -> impl Future<Output = Result<String>> + Send;
}

/// Async HTTP client for the Jira API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct JiraClient {
  client:   Client,
  base_url: String,
  /// Precomputed `Basic` header, also lent to the avatar proxy so browser
  /// clients never see the credentials.
  authorization: String,
}

impl JiraClient {
  pub fn new(config: JiraConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| Error::Client(e.to_string()))?;
    let credentials =
      BASE64.encode(format!("{}:{}", config.username, config.password));
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      authorization: format!("Basic {credentials}"),
    })
  }

  pub fn authorization_header(&self) -> &str { &self.authorization }

  pub fn base_url(&self) -> &str { &self.base_url }

  fn url(&self, path: &str) -> String { format!("{}{path}", self.base_url) }
}

impl Upstream for JiraClient {
  async fn search(&self, jql: &str) -> Result<SearchBody> {
    let resp = self
      .client
      .post(self.url("/rest/api/2/search"))
      .header(header::AUTHORIZATION, &self.authorization)
      .json(&json!({
        "jql": jql,
        "startAt": 0,
        "maxResults": MAX_RESULTS,
        "fields": SEARCH_FIELDS,
      }))
      .send()
      .await
      .map_err(|e| Error::transport(jql, e))?;

    let status = resp.status();
    if !status.is_success() {
      let message = resp.text().await.unwrap_or_default();
      return Err(Error::Upstream {
        status: status.as_u16(),
        query: jql.to_string(),
        message,
      });
    }
    resp.json().await.map_err(|e| Error::transport(jql, e))
  }

  async fn profile_page(&self, name: &str) -> Result<String> {
    let resp = self
      .client
      .get(self.url("/secure/ViewProfile.jspa"))
      .query(&[("name", name)])
      .header(header::AUTHORIZATION, &self.authorization)
      .send()
      .await
      .map_err(|e| Error::transport(name, e))?;

    let status = resp.status();
    if !status.is_success() {
      let message = resp.text().await.unwrap_or_default();
      return Err(Error::Upstream {
        status: status.as_u16(),
        query: name.to_string(),
        message,
      });
    }
    resp.text().await.map_err(|e| Error::transport(name, e))
  }
}
