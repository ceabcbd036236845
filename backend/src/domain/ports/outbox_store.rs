//! Port abstraction for the transactional outbox.
//!
//! Writers enqueue records as part of their own transactions (adapters expose
//! composable helpers for that); the relay uses [`OutboxStore::drain`] and
//! [`OutboxStore::acknowledge`] to forward and retire records shard by shard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewOutboxRecord, OutboxRecord, OutboxRecordId, ShardKey};

use super::define_port_error;

define_port_error! {
    /// Errors raised by outbox store adapters.
    pub enum OutboxStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "outbox store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "outbox store query failed: {message}",
    }
}

impl OutboxStoreError {
    /// Only connection failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Port for enqueueing and draining outbox records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Insert a record in its own transaction.
    async fn enqueue(&self, record: NewOutboxRecord) -> Result<OutboxRecord, OutboxStoreError>;

    /// Records of `shard` scheduled at or before `before`, ascending by id.
    ///
    /// Draining never deletes; see [`OutboxStore::acknowledge`].
    async fn drain(
        &self,
        shard: ShardKey,
        before: DateTime<Utc>,
    ) -> Result<Vec<OutboxRecord>, OutboxStoreError>;

    /// Delete delivered records of `shard`.
    ///
    /// Ids that no longer exist are ignored. Returns the number of rows
    /// removed.
    async fn acknowledge(
        &self,
        shard: ShardKey,
        ids: &[OutboxRecordId],
    ) -> Result<u64, OutboxStoreError>;

    /// Distinct shards with records due at or before `before`, ordered by
    /// their lowest pending id.
    async fn shards_with_pending(
        &self,
        before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ShardKey>, OutboxStoreError>;
}
