//! PostgreSQL-backed `OutboxStore` implementation using Diesel ORM.
//!
//! Besides the port, this module exposes [`enqueue_on`], which writes a
//! record on a caller-supplied connection so that it joins the caller's
//! transaction: if that transaction rolls back, the record is gone too.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Timestamptz};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::Value;

use crate::domain::ports::{OutboxStore, OutboxStoreError};
use crate::domain::{
    NewOutboxRecord, OutboxCategory, OutboxRecord, OutboxRecordId, OutboxScope, ShardKey,
};

use super::diesel_error_mapping::{invalid_row, map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewOutboxRow, OutboxRow, PendingShardRow};
use super::pool::{DbPool, PoolError};
use super::schema::outbox_records;

const PENDING_SHARDS_SQL: &str = "\
    SELECT shard_scope, shard_identifier \
    FROM outbox_records \
    WHERE scheduled_for <= $1 \
    GROUP BY shard_scope, shard_identifier \
    ORDER BY MIN(id) \
    LIMIT $2";

/// Diesel-backed implementation of the `OutboxStore` port.
#[derive(Clone)]
pub struct DieselOutboxStore {
    pool: DbPool,
}

impl DieselOutboxStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OutboxStoreError {
    map_basic_pool_error(error, OutboxStoreError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OutboxStoreError {
    map_basic_diesel_error(error, OutboxStoreError::query, OutboxStoreError::connection)
}

/// Convert a stored row into a domain record.
pub(crate) fn row_to_record(row: OutboxRow) -> Result<OutboxRecord, diesel::result::Error> {
    let scope: OutboxScope = row
        .shard_scope
        .parse()
        .map_err(|err| invalid_row(format!("outbox record {}: {err}", row.id)))?;
    let category: OutboxCategory = row
        .category
        .parse()
        .map_err(|err| invalid_row(format!("outbox record {}: {err}", row.id)))?;
    let Value::Object(payload) = row.payload else {
        return Err(invalid_row(format!(
            "outbox record {}: payload is not a JSON object",
            row.id
        )));
    };
    Ok(OutboxRecord {
        id: OutboxRecordId::new(row.id),
        shard: ShardKey::new(scope, row.shard_identifier),
        category,
        object_identifier: row.object_identifier,
        payload,
        scheduled_for: row.scheduled_for,
    })
}

/// Insert `record` on `conn`, inside whatever transaction `conn` is in.
///
/// # Errors
///
/// Returns the Diesel error unchanged so callers can use it inside
/// `AsyncConnection::transaction`.
pub async fn enqueue_on(
    conn: &mut AsyncPgConnection,
    record: &NewOutboxRecord,
) -> QueryResult<OutboxRecord> {
    let row = NewOutboxRow {
        shard_scope: record.shard.scope.as_str(),
        shard_identifier: record.shard.identifier,
        category: record.category.as_str(),
        object_identifier: record.object_identifier,
        payload: Value::Object(record.payload.clone()),
        scheduled_for: record.scheduled_for,
    };
    let stored: OutboxRow = diesel::insert_into(outbox_records::table)
        .values(&row)
        .returning(OutboxRow::as_returning())
        .get_result(conn)
        .await?;
    row_to_record(stored)
}

#[async_trait]
impl OutboxStore for DieselOutboxStore {
    async fn enqueue(&self, record: NewOutboxRecord) -> Result<OutboxRecord, OutboxStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        enqueue_on(&mut conn, &record)
            .await
            .map_err(map_diesel_error)
    }

    async fn drain(
        &self,
        shard: ShardKey,
        before: DateTime<Utc>,
    ) -> Result<Vec<OutboxRecord>, OutboxStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<OutboxRow> = outbox_records::table
            .filter(outbox_records::shard_scope.eq(shard.scope.as_str()))
            .filter(outbox_records::shard_identifier.eq(shard.identifier))
            .filter(outbox_records::scheduled_for.le(before))
            .order_by(outbox_records::id.asc())
            .select(OutboxRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| row_to_record(row).map_err(map_diesel_error))
            .collect()
    }

    async fn acknowledge(
        &self,
        shard: ShardKey,
        ids: &[OutboxRecordId],
    ) -> Result<u64, OutboxStoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            outbox_records::table
                .filter(outbox_records::shard_scope.eq(shard.scope.as_str()))
                .filter(outbox_records::shard_identifier.eq(shard.identifier))
                .filter(outbox_records::id.eq_any(raw_ids)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        u64::try_from(deleted).map_err(|_| OutboxStoreError::query("deleted row count overflow"))
    }

    async fn shards_with_pending(
        &self,
        before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ShardKey>, OutboxStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PendingShardRow> = diesel::sql_query(PENDING_SHARDS_SQL)
            .bind::<Timestamptz, _>(before)
            .bind::<BigInt, _>(i64::from(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| {
                let scope: OutboxScope = row
                    .shard_scope
                    .parse()
                    .map_err(|err| OutboxStoreError::query(format!("pending shard: {err}")))?;
                Ok(ShardKey::new(scope, row.shard_identifier))
            })
            .collect()
    }
}
