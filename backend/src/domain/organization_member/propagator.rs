//! Membership change propagation service.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info};

use super::{MemberDraft, MembershipError, OrganizationMember};
use crate::domain::ports::{OrganizationMemberRepository, OrganizationMemberRepositoryError};
use crate::domain::{OrganizationId, OutboxRecord};

/// Saves and deletes members so that each change emits exactly one outbox
/// record in the same transaction.
pub struct MembershipChangePropagator<R: ?Sized> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: ?Sized> Clone for MembershipChangePropagator<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R: ?Sized> MembershipChangePropagator<R> {
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

impl<R> MembershipChangePropagator<R>
where
    R: OrganizationMemberRepository + ?Sized,
{
    /// Validate a draft and persist it as a new member.
    ///
    /// Invalid drafts fail before the repository is touched.
    pub async fn create(
        &self,
        draft: MemberDraft,
    ) -> Result<(OrganizationMember, OutboxRecord), MembershipError> {
        let mut member = OrganizationMember::new(draft, self.clock.utc())?;
        let outbox = self.save(&mut member).await?;
        Ok((member, outbox))
    }

    /// Persist `member` together with its outbox record.
    ///
    /// A token without an expiry is given one. On success the member carries
    /// its id and expiry and its cached team roles are cleared; on failure it
    /// is left as it was.
    pub async fn save(&self, member: &mut OrganizationMember) -> Result<OutboxRecord, MembershipError> {
        member.validate()?;
        let mut pending = member.clone();
        if pending.token().is_some() && pending.token_expires_at().is_none() {
            pending.refresh_expires_at(self.clock.utc());
        }

        let write = self.repository.save(&pending).await?;
        pending.assign_id(write.member_id);
        pending.invalidate_caches();
        *member = pending;
        debug!(
            member_id = %write.member_id,
            organization_id = %member.organization_id(),
            outbox_id = %write.outbox.id,
            "organization member saved"
        );
        Ok(write.outbox)
    }

    /// Delete `member`, emitting a record for its pre-delete state.
    pub async fn delete(&self, member: &OrganizationMember) -> Result<OutboxRecord, MembershipError> {
        let member_id = member.id().ok_or(MembershipError::Unsaved)?;
        let outbox = self.repository.delete(member).await?;
        debug!(
            %member_id,
            organization_id = %member.organization_id(),
            outbox_id = %outbox.id,
            "organization member deleted"
        );
        Ok(outbox)
    }

    /// Reload `member` from storage and clear its caches.
    pub async fn refresh(&self, member: &mut OrganizationMember) -> Result<(), MembershipError> {
        let member_id = member.id().ok_or(MembershipError::Unsaved)?;
        let fresh = self
            .repository
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| OrganizationMemberRepositoryError::not_found(member_id))?;
        *member = fresh;
        member.invalidate_caches();
        Ok(())
    }

    /// Organization roles granted through teams, memoised on the member.
    pub async fn org_roles_from_teams(
        &self,
        member: &mut OrganizationMember,
    ) -> Result<BTreeSet<String>, MembershipError> {
        if let Some(cached) = member.cached_org_roles_from_teams() {
            return Ok(cached.clone());
        }
        let Some(member_id) = member.id() else {
            return Ok(BTreeSet::new());
        };
        let roles = self.repository.team_org_roles(member_id).await?;
        member.cache_org_roles_from_teams(roles.clone());
        Ok(roles)
    }

    /// Team-derived roles plus the member's own role.
    pub async fn all_org_roles(
        &self,
        member: &mut OrganizationMember,
    ) -> Result<BTreeSet<String>, MembershipError> {
        let mut roles = self.org_roles_from_teams(member).await?;
        roles.insert(member.role().to_owned());
        Ok(roles)
    }

    /// Delete pending invites whose token expired before `threshold`.
    ///
    /// Members of `excluded_organizations` are kept. Each removal goes
    /// through [`Self::delete`] so it emits its outbox record; invites that
    /// vanished concurrently are skipped. Returns the number deleted.
    pub async fn delete_expired_invites(
        &self,
        threshold: DateTime<Utc>,
        excluded_organizations: &[OrganizationId],
    ) -> Result<usize, MembershipError> {
        let expired = self
            .repository
            .find_expired_invites(threshold, excluded_organizations)
            .await?;

        let mut deleted = 0;
        for member in &expired {
            match self.delete(member).await {
                Ok(_) => deleted += 1,
                Err(MembershipError::Repository(OrganizationMemberRepositoryError::NotFound {
                    member_id,
                })) => debug!(%member_id, "expired invite already removed"),
                Err(error) => return Err(error),
            }
        }
        info!(deleted, %threshold, "deleted expired invites");
        Ok(deleted)
    }
}
