//! `OrganizationMemberRepository` over the in-memory state.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemoryStore;
use crate::domain::ports::{
    MemberWrite, OrganizationMemberRepository, OrganizationMemberRepositoryError,
};
use crate::domain::{MemberId, OrganizationId, OrganizationMember, OutboxRecord};

#[async_trait]
impl OrganizationMemberRepository for InMemoryStore {
    async fn save(
        &self,
        member: &OrganizationMember,
    ) -> Result<MemberWrite, OrganizationMemberRepositoryError> {
        self.transaction(|tx| tx.save_member(member))
    }

    async fn delete(
        &self,
        member: &OrganizationMember,
    ) -> Result<OutboxRecord, OrganizationMemberRepositoryError> {
        self.transaction(|tx| tx.delete_member(member))
    }

    async fn find_by_id(
        &self,
        member_id: MemberId,
    ) -> Result<Option<OrganizationMember>, OrganizationMemberRepositoryError> {
        Ok(self.lock().members.get(&member_id).cloned())
    }

    async fn team_org_roles(
        &self,
        member_id: MemberId,
    ) -> Result<BTreeSet<String>, OrganizationMemberRepositoryError> {
        let state = self.lock();
        let Some(member) = state.members.get(&member_id) else {
            return Ok(BTreeSet::new());
        };
        Ok(state
            .team_memberships
            .iter()
            .filter(|membership| membership.member_id == member_id && membership.is_active)
            .filter_map(|membership| state.teams.get(&membership.team_id))
            .filter(|team| team.organization_id == member.organization_id())
            .filter_map(|team| team.org_role.clone())
            .collect())
    }

    async fn find_expired_invites(
        &self,
        threshold: DateTime<Utc>,
        excluded_organizations: &[OrganizationId],
    ) -> Result<Vec<OrganizationMember>, OrganizationMemberRepositoryError> {
        let state = self.lock();
        Ok(state
            .members
            .values()
            .filter(|member| member.user_id().is_none())
            .filter(|member| {
                member
                    .token_expires_at()
                    .is_some_and(|expires_at| expires_at < threshold)
            })
            .filter(|member| !excluded_organizations.contains(&member.organization_id()))
            .cloned()
            .collect())
    }
}
