//! PostgreSQL-backed `OrganizationMemberRepository` implementation.
//!
//! Member writes and their outbox records share one transaction. The
//! composable [`save_member_on`] and [`delete_member_on`] functions run on a
//! caller-supplied connection, so a caller that wraps them in a wider
//! transaction gets the same all-or-nothing behaviour for its own writes.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::AsyncConnection as _;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{
    MemberWrite, OrganizationMemberRepository, OrganizationMemberRepositoryError,
};
use crate::domain::{
    InviteStatus, MemberDraft, MemberFlags, MemberId, OrganizationId, OrganizationMember,
    OutboxRecord, UserId,
};

use super::diesel_error_mapping::{
    invalid_row, map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::diesel_outbox_store::enqueue_on;
use super::models::{OrganizationMemberRow, OrganizationMemberValues};
use super::pool::{DbPool, PoolError};
use super::schema::{organization_member_teams, organization_members, teams};

/// Diesel-backed implementation of the `OrganizationMemberRepository` port.
#[derive(Clone)]
pub struct DieselOrganizationMemberRepository {
    pool: DbPool,
}

impl DieselOrganizationMemberRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrganizationMemberRepositoryError {
    map_basic_pool_error(error, OrganizationMemberRepositoryError::connection)
}

fn map_diesel_error(error: DieselError) -> OrganizationMemberRepositoryError {
    map_basic_diesel_error(
        error,
        OrganizationMemberRepositoryError::query,
        OrganizationMemberRepositoryError::connection,
    )
}

/// Map errors from a member write, where a missing row and unique
/// violations carry domain meaning.
fn map_write_error(error: DieselError, member_id: Option<MemberId>) -> OrganizationMemberRepositoryError {
    if let Some(constraint) = unique_violation(&error) {
        return OrganizationMemberRepositoryError::duplicate(constraint);
    }
    match (error, member_id) {
        (DieselError::NotFound, Some(member_id)) => {
            OrganizationMemberRepositoryError::not_found(member_id)
        }
        (other, _) => map_diesel_error(other),
    }
}

fn member_values(member: &OrganizationMember) -> OrganizationMemberValues<'_> {
    OrganizationMemberValues {
        organization_id: member.organization_id().get(),
        user_id: member.user_id().map(UserId::get),
        email: member.email(),
        role: member.role(),
        flags: member.flags().bits(),
        invite_status: member.invite_status().as_i16(),
        token: member.token(),
        token_expires_at: member.token_expires_at(),
        date_added: member.date_added(),
        inviter_id: member.inviter_id().map(UserId::get),
        has_global_access: member.has_global_access(),
        user_is_active: member.user_is_active(),
        user_email: member.user_email(),
    }
}

fn row_to_member(row: OrganizationMemberRow) -> Result<OrganizationMember, DieselError> {
    let invite_status = InviteStatus::try_from(row.invite_status)
        .map_err(|err| invalid_row(format!("organization member {}: {err}", row.id)))?;
    let draft = MemberDraft {
        organization_id: OrganizationId::new(row.organization_id),
        user_id: row.user_id.map(UserId::new),
        email: row.email,
        role: row.role,
        flags: MemberFlags::from_bits(row.flags),
        invite_status,
        token: row.token,
        token_expires_at: row.token_expires_at,
        inviter_id: row.inviter_id.map(UserId::new),
        has_global_access: row.has_global_access,
        user_is_active: row.user_is_active,
        user_email: row.user_email,
    };
    OrganizationMember::restore(MemberId::new(row.id), draft, row.date_added)
        .map_err(|err| invalid_row(format!("organization member {}: {err}", row.id)))
}

/// Insert or update `member` and enqueue its update record on `conn`.
///
/// Updating a member whose row no longer exists fails with
/// [`DieselError::NotFound`] before anything is enqueued.
///
/// # Errors
///
/// Returns the Diesel error unchanged so callers can use it inside
/// `AsyncConnection::transaction`.
pub async fn save_member_on(
    conn: &mut AsyncPgConnection,
    member: &OrganizationMember,
) -> QueryResult<MemberWrite> {
    let values = member_values(member);
    let id: i64 = match member.id() {
        None => {
            diesel::insert_into(organization_members::table)
                .values(&values)
                .returning(organization_members::id)
                .get_result(conn)
                .await?
        }
        Some(member_id) => {
            diesel::update(organization_members::table.find(member_id.get()))
                .set(&values)
                .returning(organization_members::id)
                .get_result(conn)
                .await?
        }
    };
    let member_id = MemberId::new(id);
    let outbox = enqueue_on(conn, &member.outbox_for_update(member_id)).await?;
    Ok(MemberWrite { member_id, outbox })
}

/// Enqueue the pre-delete record for `member`, then delete its row on
/// `conn`.
///
/// Fails with [`DieselError::NotFound`] when the member is unsaved or its
/// row is already gone; inside a transaction this discards the record.
///
/// # Errors
///
/// Returns the Diesel error unchanged so callers can use it inside
/// `AsyncConnection::transaction`.
pub async fn delete_member_on(
    conn: &mut AsyncPgConnection,
    member: &OrganizationMember,
) -> QueryResult<OutboxRecord> {
    let member_id = member.id().ok_or(DieselError::NotFound)?;
    let outbox = enqueue_on(conn, &member.outbox_for_update(member_id)).await?;
    let deleted = diesel::delete(organization_members::table.find(member_id.get()))
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(DieselError::NotFound);
    }
    Ok(outbox)
}

#[async_trait]
impl OrganizationMemberRepository for DieselOrganizationMemberRepository {
    async fn save(
        &self,
        member: &OrganizationMember,
    ) -> Result<MemberWrite, OrganizationMemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| async move { save_member_on(conn, member).await }.scope_boxed())
            .await
            .map_err(|err| map_write_error(err, member.id()))
    }

    async fn delete(
        &self,
        member: &OrganizationMember,
    ) -> Result<OutboxRecord, OrganizationMemberRepositoryError> {
        let Some(member_id) = member.id() else {
            return Err(OrganizationMemberRepositoryError::query(
                "cannot delete a member that was never saved",
            ));
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| async move { delete_member_on(conn, member).await }.scope_boxed())
            .await
            .map_err(|err| map_write_error(err, Some(member_id)))
    }

    async fn find_by_id(
        &self,
        member_id: MemberId,
    ) -> Result<Option<OrganizationMember>, OrganizationMemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OrganizationMemberRow> = organization_members::table
            .find(member_id.get())
            .select(OrganizationMemberRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_member)
            .transpose()
            .map_err(map_diesel_error)
    }

    async fn team_org_roles(
        &self,
        member_id: MemberId,
    ) -> Result<BTreeSet<String>, OrganizationMemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let roles: Vec<Option<String>> = organization_member_teams::table
            .inner_join(teams::table)
            .filter(organization_member_teams::organization_member_id.eq(member_id.get()))
            .filter(organization_member_teams::is_active.eq(true))
            .select(teams::org_role)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(roles.into_iter().flatten().collect())
    }

    async fn find_expired_invites(
        &self,
        threshold: DateTime<Utc>,
        excluded_organizations: &[OrganizationId],
    ) -> Result<Vec<OrganizationMember>, OrganizationMemberRepositoryError> {
        let mut query = organization_members::table
            .filter(organization_members::user_id.is_null())
            .filter(organization_members::token_expires_at.lt(threshold))
            .order_by(organization_members::id.asc())
            .select(OrganizationMemberRow::as_select())
            .into_boxed();
        if !excluded_organizations.is_empty() {
            let excluded: Vec<i64> = excluded_organizations.iter().map(|id| id.get()).collect();
            query = query.filter(organization_members::organization_id.ne_all(excluded));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<OrganizationMemberRow> =
            query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| row_to_member(row).map_err(map_diesel_error))
            .collect()
    }
}
