//! `OutboxStore` over the in-memory state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemoryStore;
use crate::domain::ports::{OutboxStore, OutboxStoreError};
use crate::domain::{NewOutboxRecord, OutboxRecord, OutboxRecordId, ShardKey};

#[async_trait]
impl OutboxStore for InMemoryStore {
    async fn enqueue(&self, record: NewOutboxRecord) -> Result<OutboxRecord, OutboxStoreError> {
        let now = self.clock.utc();
        Ok(self.lock().enqueue(&record, now))
    }

    async fn drain(
        &self,
        shard: ShardKey,
        before: DateTime<Utc>,
    ) -> Result<Vec<OutboxRecord>, OutboxStoreError> {
        let state = self.lock();
        Ok(state
            .outbox
            .values()
            .filter(|record| record.shard == shard && record.scheduled_for <= before)
            .cloned()
            .collect())
    }

    async fn acknowledge(
        &self,
        shard: ShardKey,
        ids: &[OutboxRecordId],
    ) -> Result<u64, OutboxStoreError> {
        let mut state = self.lock();
        let mut removed = 0;
        for id in ids {
            if state.outbox.get(id).is_some_and(|record| record.shard == shard) {
                state.outbox.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn shards_with_pending(
        &self,
        before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ShardKey>, OutboxStoreError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let state = self.lock();
        let mut shards: Vec<ShardKey> = Vec::new();
        // Records iterate in id order, so first sightings follow MIN(id).
        for record in state.outbox.values() {
            if shards.len() >= limit {
                break;
            }
            if record.scheduled_for <= before && !shards.contains(&record.shard) {
                shards.push(record.shard);
            }
        }
        Ok(shards)
    }
}
