//! `OrganizationMappingRepository` over the in-memory state.
//!
//! Mirrors the PostgreSQL adapter: a held slug is re-pointed only when the
//! caller's idempotency key matches or the organization already owns it, and
//! an organization never holds two slugs.

use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::ports::{OrganizationMappingRepository, OrganizationMappingRepositoryError};
use crate::domain::{
    CreateMappingRequest, MappingCreateOutcome, MappingPatch, MappingUpsert, OrganizationId,
    OrganizationMapping, OrganizationStatus, Patch,
};

#[async_trait]
impl OrganizationMappingRepository for InMemoryStore {
    async fn create(
        &self,
        request: &CreateMappingRequest,
    ) -> Result<MappingCreateOutcome, OrganizationMappingRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock();

        let held_by = state.mapping_by_slug(&request.slug).cloned();
        let org_holds_other_slug = state
            .mappings
            .get(&request.organization_id)
            .is_some_and(|mapping| mapping.slug != request.slug);

        let Some(existing) = held_by else {
            if org_holds_other_slug {
                return Err(OrganizationMappingRepositoryError::organization_already_mapped(
                    request.organization_id,
                ));
            }
            let mapping = OrganizationMapping {
                organization_id: request.organization_id,
                slug: request.slug.clone(),
                name: request.name.clone(),
                region_name: request.region_name.clone(),
                date_created: now,
                verified: false,
                customer_id: request.customer_id.clone(),
                idempotency_key: request.idempotency_key.clone(),
                status: OrganizationStatus::Active,
            };
            state.mappings.insert(request.organization_id, mapping.clone());
            return Ok(MappingCreateOutcome::Created(mapping));
        };

        let owns_slug = existing.idempotency_key == request.idempotency_key
            || existing.organization_id == request.organization_id;
        if !owns_slug {
            return Err(OrganizationMappingRepositoryError::slug_taken(
                request.slug.clone(),
            ));
        }
        if org_holds_other_slug {
            return Err(OrganizationMappingRepositoryError::organization_already_mapped(
                request.organization_id,
            ));
        }

        state.mappings.remove(&existing.organization_id);
        let mapping = OrganizationMapping {
            organization_id: request.organization_id,
            name: request.name.clone(),
            region_name: request.region_name.clone(),
            customer_id: request.customer_id.clone(),
            verified: false,
            ..existing
        };
        state.mappings.insert(request.organization_id, mapping.clone());
        Ok(MappingCreateOutcome::Repointed(mapping))
    }

    async fn upsert(
        &self,
        organization_id: OrganizationId,
        update: &MappingUpsert,
    ) -> Result<OrganizationMapping, OrganizationMappingRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock();

        if state
            .mapping_by_slug(&update.slug)
            .is_some_and(|holder| holder.organization_id != organization_id)
        {
            return Err(OrganizationMappingRepositoryError::slug_taken(
                update.slug.clone(),
            ));
        }

        let mapping = match state.mappings.get(&organization_id) {
            Some(existing) => OrganizationMapping {
                slug: update.slug.clone(),
                name: update.name.clone(),
                status: update.status,
                customer_id: update.customer_id.clone(),
                ..existing.clone()
            },
            None => OrganizationMapping {
                organization_id,
                slug: update.slug.clone(),
                name: update.name.clone(),
                region_name: update.region_name.clone(),
                date_created: now,
                verified: false,
                customer_id: update.customer_id.clone(),
                idempotency_key: String::new(),
                status: update.status,
            },
        };
        state.mappings.insert(organization_id, mapping.clone());
        Ok(mapping)
    }

    async fn update(&self, patch: &MappingPatch) -> Result<bool, OrganizationMappingRepositoryError> {
        let mut state = self.lock();
        let Some(mapping) = state.mappings.get_mut(&patch.organization_id) else {
            return Ok(false);
        };

        let mut changed = false;
        if let Patch::Value(name) = &patch.name {
            mapping.name.clone_from(name);
            changed = true;
        }
        if let Some(customer_id) = patch.customer_id.clone().into_option() {
            mapping.customer_id = customer_id;
            changed = true;
        }
        Ok(changed)
    }

    async fn mark_verified(
        &self,
        organization_id: OrganizationId,
        slug: &str,
    ) -> Result<bool, OrganizationMappingRepositoryError> {
        let mut state = self.lock();
        match state.mappings.get_mut(&organization_id) {
            Some(mapping) if mapping.slug == slug => {
                mapping.verified = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(
        &self,
        organization_id: OrganizationId,
    ) -> Result<bool, OrganizationMappingRepositoryError> {
        Ok(self.lock().mappings.remove(&organization_id).is_some())
    }

    async fn find_by_organization_id(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingRepositoryError> {
        Ok(self.lock().mappings.get(&organization_id).cloned())
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingRepositoryError> {
        Ok(self.lock().mapping_by_slug(slug).cloned())
    }
}
