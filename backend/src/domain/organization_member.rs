//! Organization membership and its change propagation.
//!
//! Every save or delete of an [`OrganizationMember`] goes through the
//! [`MembershipChangePropagator`], which makes the repository write the row
//! and an `organization_member_update` outbox record atomically.

mod error;
mod flags;
mod invite_status;
mod member;
mod propagator;
mod stub;

pub use error::MembershipError;
pub use flags::MemberFlags;
pub use invite_status::{InviteStatus, UnknownInviteStatus};
pub use member::{
    INVITE_DAYS_VALID, MemberDraft, MemberIdentity, OrganizationMember, generate_token,
};
pub use propagator::MembershipChangePropagator;
pub use stub::SiloStubOrganizationMemberRepository;
