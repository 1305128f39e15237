//! Core entity model and in-memory store for the Weft collaboration graph.
//!
//! This crate is deliberately free of HTTP and async-runtime dependencies.
//! It holds the user/issue records, the fact types that mutate them, the
//! append-only [`EntityStore`], and the link-pattern query evaluator. All
//! other crates depend on it; it depends on nothing proprietary.

pub mod fact;
pub mod issue;
pub mod query;
pub mod store;
pub mod user;

pub use fact::{Fact, RelationKind};
pub use store::EntityStore;
