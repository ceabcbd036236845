//! Shared helper utilities for integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! common helpers live here and each suite includes them with `mod support;`.

pub mod cluster;

pub use cluster::{TestDatabase, handle_cluster_setup_failure, provision_database};
