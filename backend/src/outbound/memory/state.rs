//! State held by the in-memory store and the transaction handle over it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::ports::{MemberWrite, OrganizationMemberRepositoryError};
use crate::domain::{
    MemberId, NewOutboxRecord, OrganizationId, OrganizationMapping, OrganizationMember,
    OutboxRecord, OutboxRecordId, TeamId,
};

#[derive(Debug, Clone)]
pub(super) struct TeamEntry {
    pub organization_id: OrganizationId,
    pub org_role: Option<String>,
}

#[derive(Debug, Clone)]
pub(super) struct TeamMembership {
    pub member_id: MemberId,
    pub team_id: TeamId,
    pub is_active: bool,
}

/// Tables of the in-memory store, keyed like their PostgreSQL counterparts.
#[derive(Debug, Clone, Default)]
pub(super) struct MemoryState {
    last_outbox_id: i64,
    last_member_id: i64,
    last_team_id: i64,
    pub outbox: BTreeMap<OutboxRecordId, OutboxRecord>,
    /// Keyed by organization; slug uniqueness is checked on write.
    pub mappings: BTreeMap<OrganizationId, OrganizationMapping>,
    pub members: BTreeMap<MemberId, OrganizationMember>,
    pub teams: BTreeMap<TeamId, TeamEntry>,
    pub team_memberships: Vec<TeamMembership>,
}

impl MemoryState {
    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    pub fn enqueue(&mut self, record: &NewOutboxRecord, now: DateTime<Utc>) -> OutboxRecord {
        self.last_outbox_id += 1;
        let id = OutboxRecordId::new(self.last_outbox_id);
        let stored = record.clone().into_record(id, now);
        self.outbox.insert(id, stored.clone());
        stored
    }

    pub fn mapping_by_slug(&self, slug: &str) -> Option<&OrganizationMapping> {
        self.mappings.values().find(|mapping| mapping.slug == slug)
    }

    /// Name of the member uniqueness rule `member` would break, if any.
    fn member_conflict(&self, member: &OrganizationMember) -> Option<&'static str> {
        let others = self
            .members
            .values()
            .filter(|other| other.id() != member.id());
        for other in others {
            if other.organization_id() != member.organization_id() {
                if member.token().is_some() && other.token() == member.token() {
                    return Some("organization_members_token_key");
                }
                continue;
            }
            if member.user_id().is_some() && other.user_id() == member.user_id() {
                return Some("organization_members_org_user_key");
            }
            if member.email().is_some() && other.email() == member.email() {
                return Some("organization_members_org_email_key");
            }
            if member.token().is_some() && other.token() == member.token() {
                return Some("organization_members_token_key");
            }
        }
        None
    }

    pub fn save_member(
        &mut self,
        member: &OrganizationMember,
        now: DateTime<Utc>,
    ) -> Result<MemberWrite, OrganizationMemberRepositoryError> {
        if let Some(constraint) = self.member_conflict(member) {
            return Err(OrganizationMemberRepositoryError::duplicate(constraint));
        }
        let member_id = match member.id() {
            Some(member_id) if self.members.contains_key(&member_id) => member_id,
            Some(member_id) => return Err(OrganizationMemberRepositoryError::not_found(member_id)),
            None => {
                self.last_member_id += 1;
                MemberId::new(self.last_member_id)
            }
        };
        let mut stored = member.clone();
        stored.assign_id(member_id);
        stored.invalidate_caches();
        self.members.insert(member_id, stored);

        let outbox = self.enqueue(&member.outbox_for_update(member_id), now);
        Ok(MemberWrite { member_id, outbox })
    }

    pub fn delete_member(
        &mut self,
        member: &OrganizationMember,
        now: DateTime<Utc>,
    ) -> Result<OutboxRecord, OrganizationMemberRepositoryError> {
        let member_id = member.id().ok_or_else(|| {
            OrganizationMemberRepositoryError::query("cannot delete a member that was never saved")
        })?;
        if self.members.remove(&member_id).is_none() {
            return Err(OrganizationMemberRepositoryError::not_found(member_id));
        }
        self.team_memberships
            .retain(|membership| membership.member_id != member_id);
        Ok(self.enqueue(&member.outbox_for_update(member_id), now))
    }

    pub fn add_team(&mut self, organization_id: OrganizationId, org_role: Option<&str>) -> TeamId {
        self.last_team_id += 1;
        let team_id = TeamId::new(self.last_team_id);
        self.teams.insert(
            team_id,
            TeamEntry {
                organization_id,
                org_role: org_role.map(str::to_owned),
            },
        );
        team_id
    }
}

/// Handle passed to [`super::InMemoryStore::transaction`] closures.
pub struct MemoryTransaction<'a> {
    state: &'a mut MemoryState,
    now: DateTime<Utc>,
}

impl<'a> MemoryTransaction<'a> {
    pub(super) fn new(state: &'a mut MemoryState, now: DateTime<Utc>) -> Self {
        Self { state, now }
    }

    /// Append an outbox record.
    pub fn enqueue(&mut self, record: &NewOutboxRecord) -> OutboxRecord {
        self.state.enqueue(record, self.now)
    }

    /// Insert or update `member` and enqueue its update record.
    ///
    /// # Errors
    ///
    /// Fails on uniqueness violations or when updating a missing member.
    pub fn save_member(
        &mut self,
        member: &OrganizationMember,
    ) -> Result<MemberWrite, OrganizationMemberRepositoryError> {
        self.state.save_member(member, self.now)
    }

    /// Enqueue the pre-delete record of `member` and remove it.
    ///
    /// # Errors
    ///
    /// Fails when the member is unsaved or already gone.
    pub fn delete_member(
        &mut self,
        member: &OrganizationMember,
    ) -> Result<OutboxRecord, OrganizationMemberRepositoryError> {
        self.state.delete_member(member, self.now)
    }

    /// Create a team that grants `org_role` to its active members.
    pub fn add_team(&mut self, organization_id: OrganizationId, org_role: Option<&str>) -> TeamId {
        self.state.add_team(organization_id, org_role)
    }

    /// Put a saved member on a team.
    ///
    /// # Errors
    ///
    /// Fails when the member does not exist.
    pub fn add_member_to_team(
        &mut self,
        member_id: MemberId,
        team_id: TeamId,
        is_active: bool,
    ) -> Result<(), OrganizationMemberRepositoryError> {
        if !self.state.members.contains_key(&member_id) {
            return Err(OrganizationMemberRepositoryError::not_found(member_id));
        }
        self.state.team_memberships.push(TeamMembership {
            member_id,
            team_id,
            is_active,
        });
        Ok(())
    }
}
