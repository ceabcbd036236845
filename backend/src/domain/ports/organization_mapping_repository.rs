//! Port abstraction for organization mapping persistence.

use async_trait::async_trait;

use crate::domain::{
    CreateMappingRequest, MappingCreateOutcome, MappingPatch, MappingUpsert, OrganizationId,
    OrganizationMapping,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by organization mapping repository adapters.
    pub enum OrganizationMappingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "organization mapping repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "organization mapping repository query failed: {message}",
        /// Another organization holds the slug.
        SlugTaken { slug: String } => "organization slug `{slug}` is already taken",
        /// The organization already holds a different slug.
        OrganizationAlreadyMapped { organization_id: OrganizationId } =>
            "organization {organization_id} already has a mapping",
    }
}

/// Port for reading and writing slug mappings.
///
/// Adapters enforce slug uniqueness with the store's own constraints so that
/// concurrent writers are serialised by the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationMappingRepository: Send + Sync {
    /// Reserve `request.slug` for `request.organization_id`.
    ///
    /// When the slug is already reserved, the existing row is re-pointed only
    /// if its recorded idempotency key equals the supplied one, or it already
    /// belongs to the same organization. The returned mapping is unverified.
    async fn create(
        &self,
        request: &CreateMappingRequest,
    ) -> Result<MappingCreateOutcome, OrganizationMappingRepositoryError>;

    /// Insert or overwrite the mapping of `organization_id`.
    async fn upsert(
        &self,
        organization_id: OrganizationId,
        update: &MappingUpsert,
    ) -> Result<OrganizationMapping, OrganizationMappingRepositoryError>;

    /// Apply a non-empty patch; returns `false` when no mapping exists.
    async fn update(&self, patch: &MappingPatch) -> Result<bool, OrganizationMappingRepositoryError>;

    /// Mark the mapping verified when its slug equals `slug`.
    ///
    /// Returns `true` when a row was marked.
    async fn mark_verified(
        &self,
        organization_id: OrganizationId,
        slug: &str,
    ) -> Result<bool, OrganizationMappingRepositoryError>;

    /// Delete the mapping; returns `false` when none existed.
    async fn delete(
        &self,
        organization_id: OrganizationId,
    ) -> Result<bool, OrganizationMappingRepositoryError>;

    /// Mapping owned by `organization_id`, if any.
    async fn find_by_organization_id(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingRepositoryError>;

    /// Mapping holding `slug`, if any.
    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingRepositoryError>;
}
