//! Database-backed organization mapping service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::domain::ports::{
    OrganizationMappingError, OrganizationMappingRepository, OrganizationMappingRepositoryError,
    OrganizationMappingService,
};
use crate::domain::{
    CreateMappingRequest, MAX_CUSTOMER_ID_LENGTH, MAX_IDEMPOTENCY_KEY_LENGTH,
    MAX_MAPPING_NAME_LENGTH, MAX_REGION_NAME_LENGTH, MappingCreateOutcome, MappingPatch,
    MappingUpsert, OrganizationId, OrganizationMapping, Patch, validate_slug,
};

/// Implements [`OrganizationMappingService`] on top of a mapping repository.
///
/// Requests with a blank region take the silo's default region when one is
/// configured.
pub struct OrganizationMappingServiceImpl<R: ?Sized> {
    repository: Arc<R>,
    default_region: Option<String>,
}

impl<R: ?Sized> Clone for OrganizationMappingServiceImpl<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            default_region: self.default_region.clone(),
        }
    }
}

impl<R: ?Sized> OrganizationMappingServiceImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            default_region: None,
        }
    }

    /// Fill blank `region_name`s with `region`.
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    fn fill_region(&self, region_name: &mut String) {
        match &self.default_region {
            Some(default) if region_name.trim().is_empty() => region_name.clone_from(default),
            _ => {}
        }
    }
}

fn map_repository_error(error: OrganizationMappingRepositoryError) -> OrganizationMappingError {
    match error {
        OrganizationMappingRepositoryError::Connection { message } => {
            OrganizationMappingError::connection(message)
        }
        OrganizationMappingRepositoryError::Query { message } => {
            OrganizationMappingError::query(message)
        }
        OrganizationMappingRepositoryError::SlugTaken { slug } => {
            warn!(%slug, "organization slug already taken");
            OrganizationMappingError::slug_taken(slug)
        }
        OrganizationMappingRepositoryError::OrganizationAlreadyMapped { organization_id } => {
            warn!(%organization_id, "organization already holds another slug");
            OrganizationMappingError::organization_already_mapped(organization_id)
        }
    }
}

fn check_slug(slug: &str) -> Result<(), OrganizationMappingError> {
    validate_slug(slug)
        .map_err(|err| OrganizationMappingError::invalid_request(format!("slug: {err}")))
}

fn require_text(field: &str, value: &str, max: usize) -> Result<(), OrganizationMappingError> {
    if value.trim().is_empty() {
        return Err(OrganizationMappingError::invalid_request(format!(
            "{field} must not be empty"
        )));
    }
    check_length(field, value, max)
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), OrganizationMappingError> {
    if value.chars().count() > max {
        return Err(OrganizationMappingError::invalid_request(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn check_customer_id(customer_id: Option<&str>) -> Result<(), OrganizationMappingError> {
    customer_id.map_or(Ok(()), |value| {
        check_length("customer_id", value, MAX_CUSTOMER_ID_LENGTH)
    })
}

fn validate_create(request: &CreateMappingRequest) -> Result<(), OrganizationMappingError> {
    check_slug(&request.slug)?;
    require_text("name", &request.name, MAX_MAPPING_NAME_LENGTH)?;
    require_text("region_name", &request.region_name, MAX_REGION_NAME_LENGTH)?;
    check_length(
        "idempotency_key",
        &request.idempotency_key,
        MAX_IDEMPOTENCY_KEY_LENGTH,
    )?;
    check_customer_id(request.customer_id.as_deref())
}

fn validate_upsert(update: &MappingUpsert) -> Result<(), OrganizationMappingError> {
    check_slug(&update.slug)?;
    require_text("name", &update.name, MAX_MAPPING_NAME_LENGTH)?;
    require_text("region_name", &update.region_name, MAX_REGION_NAME_LENGTH)?;
    check_customer_id(update.customer_id.as_deref())
}

fn validate_patch(patch: &MappingPatch) -> Result<(), OrganizationMappingError> {
    match patch.name.as_ref() {
        Patch::Null => {
            return Err(OrganizationMappingError::invalid_request(
                "name cannot be cleared",
            ));
        }
        Patch::Value(name) => require_text("name", name, MAX_MAPPING_NAME_LENGTH)?,
        Patch::Unset => {}
    }
    match patch.customer_id.as_ref() {
        Patch::Value(customer_id) => check_customer_id(Some(customer_id.as_str())),
        Patch::Null | Patch::Unset => Ok(()),
    }
}

#[async_trait]
impl<R> OrganizationMappingService for OrganizationMappingServiceImpl<R>
where
    R: OrganizationMappingRepository + ?Sized,
{
    #[instrument(
        skip(self, request),
        fields(organization_id = %request.organization_id, slug = %request.slug)
    )]
    async fn create(
        &self,
        mut request: CreateMappingRequest,
    ) -> Result<OrganizationMapping, OrganizationMappingError> {
        self.fill_region(&mut request.region_name);
        validate_create(&request)?;

        let outcome = self
            .repository
            .create(&request)
            .await
            .map_err(map_repository_error)?;
        match outcome {
            MappingCreateOutcome::Created(mapping) => {
                info!(user_id = ?request.user_id, "organization mapping created");
                Ok(mapping)
            }
            MappingCreateOutcome::Repointed(mapping) => {
                info!(user_id = ?request.user_id, "organization mapping re-pointed");
                Ok(mapping)
            }
        }
    }

    #[instrument(skip(self, update), fields(slug = %update.slug))]
    async fn upsert(
        &self,
        organization_id: OrganizationId,
        mut update: MappingUpsert,
    ) -> Result<OrganizationMapping, OrganizationMappingError> {
        self.fill_region(&mut update.region_name);
        validate_upsert(&update)?;
        self.repository
            .upsert(organization_id, &update)
            .await
            .map_err(map_repository_error)
    }

    async fn update(&self, patch: MappingPatch) -> Result<(), OrganizationMappingError> {
        if patch.is_empty() {
            return Ok(());
        }
        validate_patch(&patch)?;

        let updated = self
            .repository
            .update(&patch)
            .await
            .map_err(map_repository_error)?;
        if !updated {
            debug!(organization_id = %patch.organization_id, "no organization mapping to update");
        }
        Ok(())
    }

    async fn verify_mappings(
        &self,
        organization_id: OrganizationId,
        slug: &str,
    ) -> Result<(), OrganizationMappingError> {
        let verified = self
            .repository
            .mark_verified(organization_id, slug)
            .await
            .map_err(map_repository_error)?;
        if !verified {
            debug!(%organization_id, slug, "mapping slug did not match; left unchanged");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, organization_id: OrganizationId) -> Result<(), OrganizationMappingError> {
        let deleted = self
            .repository
            .delete(organization_id)
            .await
            .map_err(map_repository_error)?;
        if deleted {
            info!("organization mapping deleted");
        } else {
            debug!("no organization mapping to delete");
        }
        Ok(())
    }

    async fn get(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingError> {
        self.repository
            .find_by_organization_id(organization_id)
            .await
            .map_err(map_repository_error)
    }
}
