//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the outbox, mapping and
//! membership ports backed by PostgreSQL via the Diesel ORM, with async
//! support through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Validation lives in the domain.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Shared transactions**: `enqueue_on`, `save_member_on` and
//!   `delete_member_on` run on a caller-supplied connection so they compose
//!   inside one `AsyncConnection::transaction`.
//! - **Strongly typed errors**: Database errors are mapped to the port error
//!   of the adapter that raised them.
//!
//! # Example
//!
//! ```ignore
//! use hybrid_cloud::outbound::persistence::{DbPool, DieselOutboxStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/hybrid")).await?;
//! let outbox = DieselOutboxStore::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_organization_mapping_repository;
mod diesel_organization_member_repository;
mod diesel_outbox_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_organization_mapping_repository::DieselOrganizationMappingRepository;
pub use diesel_organization_member_repository::{
    DieselOrganizationMemberRepository, delete_member_on, save_member_on,
};
pub use diesel_outbox_store::{DieselOutboxStore, enqueue_on};
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
