//! Outbox record values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{OutboxCategory, ShardKey};
use crate::domain::OutboxRecordId;

/// Opaque JSON object carried by an outbox record.
pub type OutboxPayload = Map<String, Value>;

/// A persisted outbox record.
///
/// Records are immutable once written; the relay deletes them after the
/// receiving silo confirms delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: OutboxRecordId,
    pub shard: ShardKey,
    pub category: OutboxCategory,
    /// Identifier of the row that changed.
    pub object_identifier: i64,
    pub payload: OutboxPayload,
    /// Earliest time the relay may deliver the record.
    pub scheduled_for: DateTime<Utc>,
}

/// An outbox record waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboxRecord {
    pub shard: ShardKey,
    pub category: OutboxCategory,
    pub object_identifier: i64,
    pub payload: OutboxPayload,
    /// `None` schedules the record for the store's current time.
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl NewOutboxRecord {
    /// Create a record scheduled for immediate delivery.
    pub fn new(
        shard: ShardKey,
        category: OutboxCategory,
        object_identifier: i64,
        payload: OutboxPayload,
    ) -> Self {
        Self {
            shard,
            category,
            object_identifier,
            payload,
            scheduled_for: None,
        }
    }

    /// Delay delivery until `scheduled_for`.
    pub fn scheduled_for(mut self, scheduled_for: DateTime<Utc>) -> Self {
        self.scheduled_for = Some(scheduled_for);
        self
    }

    /// Materialise the record once the store has assigned an id and time.
    pub fn into_record(self, id: OutboxRecordId, now: DateTime<Utc>) -> OutboxRecord {
        OutboxRecord {
            id,
            shard: self.shard,
            category: self.category,
            object_identifier: self.object_identifier,
            payload: self.payload,
            scheduled_for: self.scheduled_for.unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrganizationId, OutboxScope};
    use chrono::TimeZone;
    use rstest::rstest;

    fn instant(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn unscheduled_record_takes_store_time() {
        let shard = ShardKey::organization(OrganizationId::new(3));
        let record = NewOutboxRecord::new(shard, OutboxCategory::OrganizationUpdate, 3, Map::new())
            .into_record(OutboxRecordId::new(1), instant(5));
        assert_eq!(record.scheduled_for, instant(5));
        assert_eq!(record.shard.scope, OutboxScope::OrganizationScope);
    }

    #[rstest]
    fn explicit_schedule_is_kept() {
        let shard = ShardKey::organization(OrganizationId::new(3));
        let record = NewOutboxRecord::new(shard, OutboxCategory::OrganizationUpdate, 3, Map::new())
            .scheduled_for(instant(9))
            .into_record(OutboxRecordId::new(1), instant(5));
        assert_eq!(record.scheduled_for, instant(9));
    }
}
