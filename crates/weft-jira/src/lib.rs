//! Jira upstream boundary for Weft.
//!
//! Everything that touches the ticket tracker lives here: the REST search
//! and profile-page client, the coalescing TTL cache in front of it, the
//! heuristic profile field extractor, and the mapper that turns one raw
//! issue into a batch of [`weft_core::Fact`]s.

pub mod cache;
pub mod client;
pub mod error;
pub mod ingest;
pub mod profile;
pub mod types;

pub use cache::JiraFetcher;
pub use client::{JiraClient, JiraConfig, Upstream};
pub use error::{Error, Result};
