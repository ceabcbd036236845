//! The organization member entity.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{InviteStatus, MemberFlags, MembershipError};
use crate::domain::{
    MemberId, NewOutboxRecord, OrganizationId, OutboxCategory, ShardKey, UserId,
};

/// Days an invite token stays valid.
pub const INVITE_DAYS_VALID: i64 = 30;

/// Generate a fresh 64-character hexadecimal invite token.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Who a membership belongs to: an accepted user or a pending invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberIdentity {
    User { user_id: UserId },
    Invite { email: String },
}

impl MemberIdentity {
    /// Build an identity from the nullable column pair.
    ///
    /// Exactly one of `user_id` and `email` must be present.
    pub fn from_parts(
        user_id: Option<UserId>,
        email: Option<String>,
    ) -> Result<Self, MembershipError> {
        match (user_id, email) {
            (Some(user_id), None) => Ok(Self::User { user_id }),
            (None, Some(email)) if email.trim().is_empty() => Err(
                MembershipError::invariant_violation("a pending invite needs a non-empty email"),
            ),
            (None, Some(email)) => Ok(Self::Invite { email }),
            (Some(_), Some(_)) => Err(MembershipError::invariant_violation(
                "exactly one of user_id and email may be set, found both",
            )),
            (None, None) => Err(MembershipError::invariant_violation(
                "exactly one of user_id and email must be set, found neither",
            )),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User { user_id } => Some(*user_id),
            Self::Invite { .. } => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Self::User { .. } => None,
            Self::Invite { email } => Some(email.as_str()),
        }
    }
}

/// Unvalidated member fields, as supplied by a caller or read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDraft {
    pub organization_id: OrganizationId,
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub role: String,
    pub flags: MemberFlags,
    pub invite_status: InviteStatus,
    pub token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub inviter_id: Option<UserId>,
    pub has_global_access: bool,
    pub user_is_active: bool,
    /// Email of the linked user, replicated from the user record.
    pub user_email: Option<String>,
}

impl MemberDraft {
    /// Draft with the default `member` role and no identity yet.
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            user_id: None,
            email: None,
            role: "member".to_owned(),
            flags: MemberFlags::empty(),
            invite_status: InviteStatus::Approved,
            token: None,
            token_expires_at: None,
            inviter_id: None,
            has_global_access: true,
            user_is_active: true,
            user_email: None,
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// A membership of a user (or a pending invite) in an organization.
///
/// The identity invariant is enforced at construction: a member is either
/// linked to a user or addressed by email, never both and never neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationMember {
    id: Option<MemberId>,
    organization_id: OrganizationId,
    identity: MemberIdentity,
    role: String,
    flags: MemberFlags,
    invite_status: InviteStatus,
    token: Option<String>,
    token_expires_at: Option<DateTime<Utc>>,
    date_added: DateTime<Utc>,
    inviter_id: Option<UserId>,
    has_global_access: bool,
    user_is_active: bool,
    user_email: Option<String>,
    org_roles_from_teams: Option<BTreeSet<String>>,
}

impl OrganizationMember {
    /// Validate a draft into an unsaved member.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use hybrid_cloud::domain::{MemberDraft, OrganizationId, OrganizationMember, UserId};
    ///
    /// let draft = MemberDraft::new(OrganizationId::new(1))
    ///     .with_user(UserId::new(5))
    ///     .with_email("a@b.com");
    /// assert!(OrganizationMember::new(draft, Utc::now()).is_err());
    /// ```
    pub fn new(draft: MemberDraft, date_added: DateTime<Utc>) -> Result<Self, MembershipError> {
        Self::build(None, draft, date_added)
    }

    /// Rebuild a persisted member, re-checking the identity invariant.
    pub fn restore(
        id: MemberId,
        draft: MemberDraft,
        date_added: DateTime<Utc>,
    ) -> Result<Self, MembershipError> {
        Self::build(Some(id), draft, date_added)
    }

    fn build(
        id: Option<MemberId>,
        draft: MemberDraft,
        date_added: DateTime<Utc>,
    ) -> Result<Self, MembershipError> {
        let identity = MemberIdentity::from_parts(draft.user_id, draft.email)?;
        let member = Self {
            id,
            organization_id: draft.organization_id,
            identity,
            role: draft.role,
            flags: draft.flags,
            invite_status: draft.invite_status,
            token: draft.token,
            token_expires_at: draft.token_expires_at,
            date_added,
            inviter_id: draft.inviter_id,
            has_global_access: draft.has_global_access,
            user_is_active: draft.user_is_active,
            user_email: draft.user_email,
            org_roles_from_teams: None,
        };
        member.validate()?;
        Ok(member)
    }

    /// Check the structural rules a member must satisfy before any write.
    pub fn validate(&self) -> Result<(), MembershipError> {
        if self.email().is_some_and(|email| email.trim().is_empty()) {
            return Err(MembershipError::invariant_violation(
                "a pending invite needs a non-empty email",
            ));
        }
        if self.role.trim().is_empty() {
            return Err(MembershipError::invariant_violation("role must not be empty"));
        }
        Ok(())
    }

    pub fn id(&self) -> Option<MemberId> {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn identity(&self) -> &MemberIdentity {
        &self.identity
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity.user_id()
    }

    pub fn email(&self) -> Option<&str> {
        self.identity.email()
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    pub fn invite_status(&self) -> InviteStatus {
        self.invite_status
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.token_expires_at
    }

    pub fn date_added(&self) -> DateTime<Utc> {
        self.date_added
    }

    pub fn inviter_id(&self) -> Option<UserId> {
        self.inviter_id
    }

    pub fn has_global_access(&self) -> bool {
        self.has_global_access
    }

    pub fn user_is_active(&self) -> bool {
        self.user_is_active
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        self.role = role.into();
    }

    pub fn set_flag(&mut self, flag: MemberFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    pub fn set_has_global_access(&mut self, has_global_access: bool) {
        self.has_global_access = has_global_access;
    }

    /// A member without a linked user is a pending invite.
    pub fn is_pending(&self) -> bool {
        matches!(self.identity, MemberIdentity::Invite { .. })
    }

    /// `true` when the token has an expiry at or before `now`.
    pub fn token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn invite_approved(&self) -> bool {
        self.invite_status == InviteStatus::Approved
    }

    pub fn requested_to_be_invited(&self) -> bool {
        self.invite_status == InviteStatus::RequestedToBeInvited
    }

    pub fn requested_to_join(&self) -> bool {
        self.invite_status == InviteStatus::RequestedToJoin
    }

    pub fn approve_invite(&mut self) {
        self.invite_status = InviteStatus::Approved;
    }

    /// Link the membership to a user, consuming the invite.
    pub fn set_user(&mut self, user_id: UserId) {
        self.identity = MemberIdentity::User { user_id };
        self.token = None;
        self.token_expires_at = None;
    }

    /// Detach the user, turning the membership back into an invite addressed
    /// to the user's replicated email with a fresh token.
    ///
    /// The token expiry is left unset; saving the member assigns one.
    pub fn remove_user(&mut self) -> Result<(), MembershipError> {
        if self.is_pending() {
            return Err(MembershipError::invariant_violation(
                "cannot remove the user of a pending invite",
            ));
        }
        let email = self
            .user_email
            .clone()
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| {
                MembershipError::invariant_violation("member has no replicated user email")
            })?;
        self.identity = MemberIdentity::Invite { email };
        self.token = Some(generate_token());
        self.token_expires_at = None;
        Ok(())
    }

    /// Issue a new token valid for [`INVITE_DAYS_VALID`] days from `now`.
    pub fn regenerate_token(&mut self, now: DateTime<Utc>) {
        self.token = Some(generate_token());
        self.refresh_expires_at(now);
    }

    /// Extend the token for [`INVITE_DAYS_VALID`] days from `now`.
    pub fn refresh_expires_at(&mut self, now: DateTime<Utc>) {
        self.token_expires_at = Some(now + Duration::days(INVITE_DAYS_VALID));
    }

    /// Outbox record announcing the current state of this member.
    pub fn outbox_for_update(&self, member_id: MemberId) -> NewOutboxRecord {
        let mut payload = Map::new();
        payload.insert(
            "user_id".to_owned(),
            self.user_id()
                .map_or(Value::Null, |user_id| Value::from(user_id.get())),
        );
        NewOutboxRecord::new(
            ShardKey::organization(self.organization_id),
            OutboxCategory::OrganizationMemberUpdate,
            member_id.get(),
            payload,
        )
    }

    /// Team-derived roles, when already loaded.
    pub fn cached_org_roles_from_teams(&self) -> Option<&BTreeSet<String>> {
        self.org_roles_from_teams.as_ref()
    }

    /// Drop memoised values derived from other rows.
    pub fn invalidate_caches(&mut self) {
        self.org_roles_from_teams = None;
    }

    pub(crate) fn cache_org_roles_from_teams(&mut self, roles: BTreeSet<String>) {
        self.org_roles_from_teams = Some(roles);
    }

    pub(crate) fn assign_id(&mut self, id: MemberId) {
        self.id = Some(id);
    }

    /// Split back into draft fields, e.g. for persistence.
    pub fn to_draft(&self) -> MemberDraft {
        MemberDraft {
            organization_id: self.organization_id,
            user_id: self.user_id(),
            email: self.email().map(str::to_owned),
            role: self.role.clone(),
            flags: self.flags,
            invite_status: self.invite_status,
            token: self.token.clone(),
            token_expires_at: self.token_expires_at,
            inviter_id: self.inviter_id,
            has_global_access: self.has_global_access,
            user_is_active: self.user_is_active,
            user_email: self.user_email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn accepted(now: DateTime<Utc>) -> OrganizationMember {
        let mut draft = MemberDraft::new(OrganizationId::new(1)).with_user(UserId::new(5));
        draft.user_email = Some("five@example.com".to_owned());
        OrganizationMember::new(draft, now).expect("valid member")
    }

    #[rstest]
    fn rejects_both_user_and_email(now: DateTime<Utc>) {
        let draft = MemberDraft::new(OrganizationId::new(1))
            .with_user(UserId::new(5))
            .with_email("a@b.com");
        let err = OrganizationMember::new(draft, now).expect_err("both identities set");
        assert!(matches!(err, MembershipError::InvariantViolation { .. }));
    }

    #[rstest]
    fn rejects_missing_identity(now: DateTime<Utc>) {
        let err = OrganizationMember::new(MemberDraft::new(OrganizationId::new(1)), now)
            .expect_err("no identity");
        assert!(matches!(err, MembershipError::InvariantViolation { .. }));
    }

    #[rstest]
    fn rejects_blank_role(now: DateTime<Utc>) {
        let draft = MemberDraft::new(OrganizationId::new(1))
            .with_email("a@b.com")
            .with_role(" ");
        assert!(OrganizationMember::new(draft, now).is_err());
    }

    #[rstest]
    fn set_user_consumes_invite(now: DateTime<Utc>) {
        let draft = MemberDraft::new(OrganizationId::new(1))
            .with_email("a@b.com")
            .with_token("abc");
        let mut member = OrganizationMember::new(draft, now).expect("valid invite");
        member.refresh_expires_at(now);

        member.set_user(UserId::new(8));

        assert_eq!(member.user_id(), Some(UserId::new(8)));
        assert_eq!(member.email(), None);
        assert_eq!(member.token(), None);
        assert_eq!(member.token_expires_at(), None);
        assert!(!member.is_pending());
    }

    #[rstest]
    fn remove_user_restores_replicated_email(now: DateTime<Utc>) {
        let mut member = accepted(now);

        member.remove_user().expect("user removed");

        assert!(member.is_pending());
        assert_eq!(member.email(), Some("five@example.com"));
        assert_eq!(member.token().map(str::len), Some(64));
        assert_eq!(member.token_expires_at(), None);
    }

    #[rstest]
    fn remove_user_requires_linked_user(now: DateTime<Utc>) {
        let draft = MemberDraft::new(OrganizationId::new(1)).with_email("a@b.com");
        let mut member = OrganizationMember::new(draft, now).expect("valid invite");
        assert!(member.remove_user().is_err());
    }

    #[rstest]
    fn regenerate_token_sets_thirty_day_expiry(now: DateTime<Utc>) {
        let mut member = accepted(now);
        member.regenerate_token(now);

        let token = member.token().expect("token issued");
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(member.token_expires_at(), Some(now + Duration::days(30)));
        assert!(!member.token_expired(now));
        assert!(member.token_expired(now + Duration::days(30)));
    }

    #[rstest]
    fn invite_status_predicates(now: DateTime<Utc>) {
        let mut draft = MemberDraft::new(OrganizationId::new(1)).with_email("a@b.com");
        draft.invite_status = InviteStatus::RequestedToJoin;
        let mut member = OrganizationMember::new(draft, now).expect("valid invite");
        assert!(member.requested_to_join());
        assert!(!member.invite_approved());

        member.approve_invite();

        assert!(member.invite_approved());
    }

    #[rstest]
    fn outbox_record_carries_current_user(now: DateTime<Utc>) {
        let member = accepted(now);
        let record = member.outbox_for_update(MemberId::new(11));

        assert_eq!(record.category, OutboxCategory::OrganizationMemberUpdate);
        assert_eq!(record.shard, ShardKey::organization(OrganizationId::new(1)));
        assert_eq!(record.object_identifier, 11);
        assert_eq!(record.payload.get("user_id"), Some(&Value::from(5)));
    }

    #[rstest]
    fn outbox_record_for_invite_has_null_user(now: DateTime<Utc>) {
        let draft = MemberDraft::new(OrganizationId::new(1)).with_email("a@b.com");
        let member = OrganizationMember::new(draft, now).expect("valid invite");
        let record = member.outbox_for_update(MemberId::new(2));
        assert_eq!(record.payload.get("user_id"), Some(&Value::Null));
    }
}
