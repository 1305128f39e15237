//! Error types for the upstream boundary.
//!
//! The enum is `Clone` on purpose: a failed coalesced fetch is observed by
//! every waiter sharing the in-flight future, so the error travels by value
//! (status and body text, not a live source chain).

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
  /// The upstream answered with a non-success status.
  #[error("upstream returned {status} for {query:?}: {message}")]
  Upstream {
    status:  u16,
    query:   String,
    message: String,
  },

  /// The request never produced a response (connect, TLS, timeout).
  #[error("transport failure for {query:?}: {message}")]
  Transport { query: String, message: String },

  /// The HTTP client itself could not be constructed.
  #[error("failed to build HTTP client: {0}")]
  Client(String),
}

impl Error {
  pub(crate) fn transport(query: &str, err: reqwest::Error) -> Self {
    Self::Transport {
      query:   query.to_string(),
      message: err.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
