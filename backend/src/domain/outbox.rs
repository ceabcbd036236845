//! Transactional outbox records.
//!
//! Every mutation that another silo must learn about writes an outbox record
//! in the same transaction as the mutation itself. A relay later drains the
//! records shard by shard, in ascending id order, and deletes them once the
//! other silo has acknowledged delivery.

mod category;
mod record;
mod scope;

pub use category::OutboxCategory;
pub use record::{NewOutboxRecord, OutboxPayload, OutboxRecord};
pub use scope::{OutboxScope, ShardKey};

/// Error returned when a stored outbox discriminator is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown outbox {kind} `{input}`")]
pub struct ParseOutboxValueError {
    /// Which discriminator failed to parse (`scope` or `category`).
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}
