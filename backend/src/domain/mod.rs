//! Domain primitives, services and ports.
//!
//! Purpose: define the strongly typed values of the consistency core (outbox
//! records, slug mappings, memberships), the services that enforce their
//! invariants, and the ports adapters implement. Nothing here knows which
//! store or silo it runs against.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - OutboxRecord / NewOutboxRecord: cross-silo change notifications.
//! - OrganizationMapping and its service implementations.
//! - OrganizationMember and the MembershipChangePropagator.
//! - SiloMode / SiloDelegation: startup-time service resolution.

pub mod error;
pub mod ids;
pub mod organization_mapping;
pub mod organization_member;
pub mod outbox;
pub mod patch;
pub mod ports;
pub mod silo;
pub mod silo_delegation;
pub mod slug;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{MemberId, OrganizationId, OutboxRecordId, TeamId, UserId};
pub use self::organization_mapping::{
    CreateMappingRequest, MAX_CUSTOMER_ID_LENGTH, MAX_IDEMPOTENCY_KEY_LENGTH,
    MAX_MAPPING_NAME_LENGTH, MAX_REGION_NAME_LENGTH, MappingCreateOutcome, MappingPatch,
    MappingUpsert, OrganizationMapping, OrganizationMappingServiceImpl, OrganizationStatus,
    ParseOrganizationStatusError, SiloStubOrganizationMappingService,
};
pub use self::organization_member::{
    INVITE_DAYS_VALID, InviteStatus, MemberDraft, MemberFlags, MemberIdentity,
    MembershipChangePropagator, MembershipError, OrganizationMember,
    SiloStubOrganizationMemberRepository, UnknownInviteStatus, generate_token,
};
pub use self::outbox::{
    NewOutboxRecord, OutboxCategory, OutboxPayload, OutboxRecord, OutboxScope,
    ParseOutboxValueError, ShardKey,
};
pub use self::patch::Patch;
pub use self::silo::{ParseSiloModeError, SiloMode};
pub use self::silo_delegation::{Delegate, SiloDelegation, StubbedService};
pub use self::slug::{MAX_SLUG_LENGTH, SlugValidationError, is_valid_slug, validate_slug};

/// Convenient result alias for callers mapping service errors.
pub type DomainResult<T> = Result<T, Error>;
