//! Membership repository for silos that do not hold membership rows.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::ports::{
    MemberWrite, OrganizationMemberRepository, OrganizationMemberRepositoryError,
};
use crate::domain::silo_delegation::StubbedService;
use crate::domain::{MemberId, OrganizationId, OrganizationMember, OutboxRecord, SiloMode};

/// Rejects every call with [`OrganizationMemberRepositoryError::NotSupportedInSilo`]
/// without touching any store.
#[derive(Debug, Clone, Copy)]
pub struct SiloStubOrganizationMemberRepository {
    current: SiloMode,
    authority: SiloMode,
}

impl SiloStubOrganizationMemberRepository {
    pub fn new(current: SiloMode, authority: SiloMode) -> Self {
        Self { current, authority }
    }

    fn reject(&self, operation: &str) -> OrganizationMemberRepositoryError {
        warn!(
            operation,
            current = %self.current,
            authority = %self.authority,
            "membership call reached a stubbed silo"
        );
        OrganizationMemberRepositoryError::not_supported_in_silo(
            operation,
            self.current,
            self.authority,
        )
    }
}

impl StubbedService for dyn OrganizationMemberRepository {
    fn stubbed(current: SiloMode, authority: SiloMode) -> Arc<Self> {
        Arc::new(SiloStubOrganizationMemberRepository::new(current, authority))
    }
}

#[async_trait]
impl OrganizationMemberRepository for SiloStubOrganizationMemberRepository {
    async fn save(
        &self,
        _member: &OrganizationMember,
    ) -> Result<MemberWrite, OrganizationMemberRepositoryError> {
        Err(self.reject("save"))
    }

    async fn delete(
        &self,
        _member: &OrganizationMember,
    ) -> Result<OutboxRecord, OrganizationMemberRepositoryError> {
        Err(self.reject("delete"))
    }

    async fn find_by_id(
        &self,
        _member_id: MemberId,
    ) -> Result<Option<OrganizationMember>, OrganizationMemberRepositoryError> {
        Err(self.reject("find_by_id"))
    }

    async fn team_org_roles(
        &self,
        _member_id: MemberId,
    ) -> Result<BTreeSet<String>, OrganizationMemberRepositoryError> {
        Err(self.reject("team_org_roles"))
    }

    async fn find_expired_invites(
        &self,
        _threshold: DateTime<Utc>,
        _excluded_organizations: &[OrganizationId],
    ) -> Result<Vec<OrganizationMember>, OrganizationMemberRepositoryError> {
        Err(self.reject("find_expired_invites"))
    }
}
