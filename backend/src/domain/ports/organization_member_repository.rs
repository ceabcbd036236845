//! Port abstraction for organization membership persistence.
//!
//! Every write through this port also writes the member's outbox record in
//! the same transaction; adapters never persist one without the other.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    MemberId, OrganizationId, OrganizationMember, OutboxRecord, SiloMode,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by organization member repository adapters.
    pub enum OrganizationMemberRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "organization member repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "organization member repository query failed: {message}",
        /// The member row does not exist.
        NotFound { member_id: MemberId } => "organization member {member_id} not found",
        /// The user or email is already a member of the organization.
        Duplicate { message: String } => "duplicate organization member: {message}",
        /// The call reached a silo that does not own membership data.
        NotSupportedInSilo { operation: String, current: SiloMode, authority: SiloMode } =>
            "{operation} is not implemented in the {current} silo; it belongs to the {authority} silo",
    }
}

/// Result of a member save: the row id and the outbox record written with it.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberWrite {
    pub member_id: MemberId,
    pub outbox: OutboxRecord,
}

/// Port for membership rows and their team-derived roles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationMemberRepository: Send + Sync {
    /// Insert (no id yet) or update the member and enqueue its
    /// `organization_member_update` record in one transaction.
    async fn save(
        &self,
        member: &OrganizationMember,
    ) -> Result<MemberWrite, OrganizationMemberRepositoryError>;

    /// Enqueue the member's record for its pre-delete state, then delete the
    /// row, in one transaction.
    async fn delete(
        &self,
        member: &OrganizationMember,
    ) -> Result<OutboxRecord, OrganizationMemberRepositoryError>;

    async fn find_by_id(
        &self,
        member_id: MemberId,
    ) -> Result<Option<OrganizationMember>, OrganizationMemberRepositoryError>;

    /// Organization roles granted through the member's active teams.
    async fn team_org_roles(
        &self,
        member_id: MemberId,
    ) -> Result<BTreeSet<String>, OrganizationMemberRepositoryError>;

    /// Pending invites whose token expired before `threshold`, outside the
    /// excluded organizations.
    async fn find_expired_invites(
        &self,
        threshold: DateTime<Utc>,
        excluded_organizations: &[OrganizationId],
    ) -> Result<Vec<OrganizationMember>, OrganizationMemberRepositoryError>;
}
