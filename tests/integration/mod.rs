//! Integration test suite for pagesmith
//!
//! End-to-end tests over in-memory and on-disk sites.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **composition**: include, layout, slot and head behavior of whole pages
//! - **graph_properties**: idempotence and consistency of recorded edges
//! - **incremental**: rebuilds after edits, creations and deletions on disk
//! - **security**: hostile references never escape the source root
//! - **cli**: the `pagesmith` command driven through its library entry point

mod cli;
mod composition;
mod graph_properties;
mod incremental;
mod security;
