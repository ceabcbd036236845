//! Mapping service for silos that do not own slug mappings.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::ports::{OrganizationMappingError, OrganizationMappingService};
use crate::domain::silo_delegation::StubbedService;
use crate::domain::{
    CreateMappingRequest, MappingPatch, MappingUpsert, OrganizationId, OrganizationMapping,
    SiloMode,
};

/// Rejects every call with [`OrganizationMappingError::NotSupportedInSilo`]
/// without touching any store.
#[derive(Debug, Clone, Copy)]
pub struct SiloStubOrganizationMappingService {
    current: SiloMode,
    authority: SiloMode,
}

impl SiloStubOrganizationMappingService {
    pub fn new(current: SiloMode, authority: SiloMode) -> Self {
        Self { current, authority }
    }

    fn reject(&self, operation: &str) -> OrganizationMappingError {
        warn!(
            operation,
            current = %self.current,
            authority = %self.authority,
            "organization mapping call reached a stubbed silo"
        );
        OrganizationMappingError::not_supported_in_silo(operation, self.current, self.authority)
    }
}

impl StubbedService for dyn OrganizationMappingService {
    fn stubbed(current: SiloMode, authority: SiloMode) -> Arc<Self> {
        Arc::new(SiloStubOrganizationMappingService::new(current, authority))
    }
}

#[async_trait]
impl OrganizationMappingService for SiloStubOrganizationMappingService {
    async fn create(
        &self,
        _request: CreateMappingRequest,
    ) -> Result<OrganizationMapping, OrganizationMappingError> {
        Err(self.reject("create"))
    }

    async fn upsert(
        &self,
        _organization_id: OrganizationId,
        _update: MappingUpsert,
    ) -> Result<OrganizationMapping, OrganizationMappingError> {
        Err(self.reject("upsert"))
    }

    async fn update(&self, _patch: MappingPatch) -> Result<(), OrganizationMappingError> {
        Err(self.reject("update"))
    }

    async fn verify_mappings(
        &self,
        _organization_id: OrganizationId,
        _slug: &str,
    ) -> Result<(), OrganizationMappingError> {
        Err(self.reject("verify_mappings"))
    }

    async fn delete(&self, _organization_id: OrganizationId) -> Result<(), OrganizationMappingError> {
        Err(self.reject("delete"))
    }

    async fn get(
        &self,
        _organization_id: OrganizationId,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingError> {
        Err(self.reject("get"))
    }
}
