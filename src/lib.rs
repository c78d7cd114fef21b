//! sgctl library
//!
//! Exposes the auth, search and formatting modules for the CLI binary
//! and for the end-to-end tests.

pub mod auth;
pub mod config;
pub mod format;
pub mod search;

// Re-export the types a caller needs to run a search end to end
pub use search::{search_graph, SearchConfig, SearchError, SearchStream};
