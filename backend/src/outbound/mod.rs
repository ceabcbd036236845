//! Outbound adapters implementing domain ports for storage.
//!
//! - **persistence**: PostgreSQL-backed stores using Diesel ORM
//! - **memory**: a single-process store with the same semantics
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
