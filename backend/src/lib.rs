//! Hybrid-cloud consistency core.
//!
//! Keeps organization and membership state consistent between the control
//! silo and region silos: membership mutations emit transactional outbox
//! records, organization slugs are reserved through an idempotent mapping
//! service, and each process resolves its services once at startup based on
//! the silo it runs in.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod services;
pub mod telemetry;

pub use config::HybridCloudSettings;
pub use services::{PersistenceBackend, SiloServices, StartupError};
