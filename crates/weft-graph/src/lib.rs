//! The collaboration graph engine.
//!
//! Ties the pieces together: the crawl engine recursively populates the
//! entity store from ticket data, the link query derives collaboration
//! edges, and the assembler turns users and raw links into the styled
//! presentation graph handed to the visualization front end.

pub mod assemble;
pub mod config;
pub mod crawl;
pub mod query;
pub mod service;

pub use assemble::PresentationGraph;
pub use config::CrawlConfig;
pub use service::{GraphResponse, GraphService};

#[cfg(test)]
mod tests;
