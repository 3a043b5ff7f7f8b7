//! # research-stream
//!
//! Streaming topic research: generate search terms for a topic, search the
//! web for each term, summarize the documents found, and report progress
//! incrementally as a growing tree of results.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Research, SearchBranch, Paper, snapshots)
//! - [`research`]: The concurrent aggregation engine (tree, stream merging,
//!   orchestrator, snapshot sequencing)
//! - [`producers`]: Producer contracts plus concrete and mock implementations
//! - [`llm`]: Chat completion client, prompt building, response parsing
//! - [`utils`]: HTTP client and PDF text extraction
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal rendering for the CLI sink

pub mod config;
pub mod llm;
pub mod models;
pub mod producers;
pub mod research;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{Paper, Research, ResearchSnapshot, SearchBranch, SnapshotEvent};
pub use research::{
    merge_expand, sequence_snapshots, ResearchError, ResearchOptions, ResearchTree, Researcher,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
