//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Bool;

use super::schema::{organization_mappings, organization_members, outbox_records};

// ---------------------------------------------------------------------------
// Outbox models
// ---------------------------------------------------------------------------

/// Row struct for reading from the outbox_records table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = outbox_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OutboxRow {
    pub id: i64,
    pub shard_scope: String,
    pub shard_identifier: i64,
    pub category: String,
    pub object_identifier: i64,
    pub payload: serde_json::Value,
    pub scheduled_for: DateTime<Utc>,
}

/// Insertable struct for enqueueing outbox records.
///
/// `scheduled_for: None` inserts the column default (`now()`).
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = outbox_records)]
pub(crate) struct NewOutboxRow<'a> {
    pub shard_scope: &'a str,
    pub shard_identifier: i64,
    pub category: &'a str,
    pub object_identifier: i64,
    pub payload: serde_json::Value,
    pub scheduled_for: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Organization mapping models
// ---------------------------------------------------------------------------

/// Row struct for reading from the organization_mappings table.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = organization_mappings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrganizationMappingRow {
    #[expect(dead_code, reason = "surrogate key; mappings are addressed by organization")]
    pub id: i64,
    pub organization_id: i64,
    pub slug: String,
    pub name: String,
    pub region_name: String,
    pub date_created: DateTime<Utc>,
    pub verified: bool,
    pub customer_id: Option<String>,
    pub idempotency_key: String,
    pub status: String,
}

/// Result of the slug-reserving upsert: the row plus whether it was new.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ReservedMappingRow {
    #[diesel(embed)]
    pub mapping: OrganizationMappingRow,
    #[diesel(sql_type = Bool)]
    pub inserted: bool,
}

/// Insertable struct for organization-keyed upserts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = organization_mappings)]
pub(crate) struct NewOrganizationMappingRow<'a> {
    pub organization_id: i64,
    pub slug: &'a str,
    pub name: &'a str,
    pub region_name: &'a str,
    pub customer_id: Option<&'a str>,
    pub status: &'a str,
}

/// Changeset for partial mapping updates.
///
/// Outer `None` skips a column; `Some(None)` writes NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = organization_mappings)]
pub(crate) struct MappingPatchChangeset<'a> {
    pub name: Option<&'a str>,
    pub customer_id: Option<Option<&'a str>>,
}

// ---------------------------------------------------------------------------
// Organization member models
// ---------------------------------------------------------------------------

/// Row struct for reading from the organization_members table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = organization_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrganizationMemberRow {
    pub id: i64,
    pub organization_id: i64,
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub role: String,
    pub flags: i64,
    pub invite_status: i16,
    pub token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub date_added: DateTime<Utc>,
    pub inviter_id: Option<i64>,
    pub has_global_access: bool,
    pub user_is_active: bool,
    pub user_email: Option<String>,
}

/// Column values written on member insert and update.
///
/// `treat_none_as_null` makes updates clear columns such as `email` when a
/// member switches identity.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = organization_members)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct OrganizationMemberValues<'a> {
    pub organization_id: i64,
    pub user_id: Option<i64>,
    pub email: Option<&'a str>,
    pub role: &'a str,
    pub flags: i64,
    pub invite_status: i16,
    pub token: Option<&'a str>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub date_added: DateTime<Utc>,
    pub inviter_id: Option<i64>,
    pub has_global_access: bool,
    pub user_is_active: bool,
    pub user_email: Option<&'a str>,
}

/// One shard with eligible outbox records, as returned by the pending-shard
/// scan.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct PendingShardRow {
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub shard_scope: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub shard_identifier: i64,
}
