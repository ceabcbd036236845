//! Driving port for the organization mapping service.
//!
//! Callers depend on `dyn OrganizationMappingService`; which implementation
//! sits behind it (database-backed or a silo stub) is decided once at
//! startup.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{
    CreateMappingRequest, Error, MappingPatch, MappingUpsert, OrganizationId,
    OrganizationMapping, SiloMode,
};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the organization mapping service.
    pub enum OrganizationMappingError {
        /// Another organization holds the slug. Never retried.
        SlugTaken { slug: String } => "organization slug `{slug}` is already taken",
        /// The organization already holds a different slug.
        OrganizationAlreadyMapped { organization_id: OrganizationId } =>
            "organization {organization_id} already has a mapping",
        /// The request failed validation.
        InvalidRequest { message: String } => "invalid organization mapping request: {message}",
        /// The call reached a silo that does not own mappings.
        NotSupportedInSilo { operation: String, current: SiloMode, authority: SiloMode } =>
            "{operation} is not implemented in the {current} silo; it belongs to the {authority} silo",
        /// The backing store could not be reached.
        Connection { message: String } => "organization mapping store unavailable: {message}",
        /// The backing store rejected a query.
        Query { message: String } => "organization mapping store error: {message}",
    }
}

impl OrganizationMappingError {
    /// Only connection failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

impl From<OrganizationMappingError> for Error {
    fn from(value: OrganizationMappingError) -> Self {
        let message = value.to_string();
        match value {
            OrganizationMappingError::SlugTaken { slug } => Error::conflict(message)
                .with_details(json!({ "code": "slug_taken", "slug": slug })),
            OrganizationMappingError::OrganizationAlreadyMapped { organization_id } => {
                Error::conflict(message).with_details(json!({
                    "code": "organization_already_mapped",
                    "organizationId": organization_id,
                }))
            }
            OrganizationMappingError::InvalidRequest { .. } => Error::invalid_request(message),
            OrganizationMappingError::NotSupportedInSilo {
                operation,
                current,
                authority,
            } => Error::misconfigured(message).with_details(json!({
                "code": "not_supported_in_silo",
                "operation": operation,
                "current": current,
                "authority": authority,
            })),
            OrganizationMappingError::Connection { .. } => Error::service_unavailable(message),
            OrganizationMappingError::Query { .. } => Error::internal(message),
        }
    }
}

/// Idempotent operations on slug mappings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationMappingService: Send + Sync {
    /// Reserve a slug for an organization, re-pointing an existing mapping
    /// when the idempotency keys match.
    async fn create(
        &self,
        request: CreateMappingRequest,
    ) -> Result<OrganizationMapping, OrganizationMappingError>;

    /// Insert or overwrite the mapping of `organization_id`.
    async fn upsert(
        &self,
        organization_id: OrganizationId,
        update: MappingUpsert,
    ) -> Result<OrganizationMapping, OrganizationMappingError>;

    /// Apply a partial update; empty patches and missing mappings are no-ops.
    async fn update(&self, patch: MappingPatch) -> Result<(), OrganizationMappingError>;

    /// Mark the mapping verified when its slug equals `slug`.
    ///
    /// A mismatch leaves the row untouched, including an earlier
    /// verification.
    async fn verify_mappings(
        &self,
        organization_id: OrganizationId,
        slug: &str,
    ) -> Result<(), OrganizationMappingError>;

    /// Remove the mapping. Deleting a missing mapping succeeds.
    async fn delete(&self, organization_id: OrganizationId) -> Result<(), OrganizationMappingError>;

    /// Mapping of `organization_id`, if any.
    async fn get(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingError>;
}
