//! PostgreSQL-backed `OrganizationMappingRepository` implementation.
//!
//! Slug uniqueness is enforced by the `organization_mappings_slug_key`
//! constraint. `create` reserves a slug with a single conditional upsert,
//! so concurrent reservations of the same slug are serialised by the row
//! lock taken on conflict.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text, Varchar};
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{OrganizationMappingRepository, OrganizationMappingRepositoryError};
use crate::domain::{
    CreateMappingRequest, MappingCreateOutcome, MappingPatch, MappingUpsert, OrganizationId,
    OrganizationMapping, OrganizationStatus,
};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error, unique_violation};
use super::models::{
    MappingPatchChangeset, NewOrganizationMappingRow, OrganizationMappingRow, ReservedMappingRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::organization_mappings;

const ORGANIZATION_ID_CONSTRAINT: &str = "organization_mappings_organization_id_key";

/// Insert the mapping, or re-point the row holding the slug when the caller
/// proves ownership through the idempotency key or the organization id.
/// A conflicting row that fails both checks yields no row at all.
const RESERVE_SLUG_SQL: &str = "\
    INSERT INTO organization_mappings \
        (organization_id, slug, name, region_name, customer_id, idempotency_key) \
    VALUES ($1, $2, $3, $4, $5, $6) \
    ON CONFLICT (slug) DO UPDATE SET \
        organization_id = EXCLUDED.organization_id, \
        name = EXCLUDED.name, \
        region_name = EXCLUDED.region_name, \
        customer_id = EXCLUDED.customer_id, \
        verified = false \
    WHERE organization_mappings.idempotency_key = EXCLUDED.idempotency_key \
       OR organization_mappings.organization_id = EXCLUDED.organization_id \
    RETURNING *, (xmax = 0) AS inserted";

/// Diesel-backed implementation of the `OrganizationMappingRepository` port.
#[derive(Clone)]
pub struct DieselOrganizationMappingRepository {
    pool: DbPool,
}

impl DieselOrganizationMappingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrganizationMappingRepositoryError {
    map_basic_pool_error(error, OrganizationMappingRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrganizationMappingRepositoryError {
    map_basic_diesel_error(
        error,
        OrganizationMappingRepositoryError::query,
        OrganizationMappingRepositoryError::connection,
    )
}

/// Classify a unique violation raised while writing `slug` for
/// `organization_id`.
fn map_write_error(
    error: diesel::result::Error,
    organization_id: OrganizationId,
    slug: &str,
) -> OrganizationMappingRepositoryError {
    match unique_violation(&error) {
        Some(ORGANIZATION_ID_CONSTRAINT) => {
            OrganizationMappingRepositoryError::organization_already_mapped(organization_id)
        }
        Some(_) => OrganizationMappingRepositoryError::slug_taken(slug),
        None => map_diesel_error(error),
    }
}

fn row_to_mapping(
    row: OrganizationMappingRow,
) -> Result<OrganizationMapping, OrganizationMappingRepositoryError> {
    let status: OrganizationStatus = row.status.parse().map_err(|err| {
        OrganizationMappingRepositoryError::query(format!(
            "mapping for organization {}: {err}",
            row.organization_id
        ))
    })?;
    Ok(OrganizationMapping {
        organization_id: OrganizationId::new(row.organization_id),
        slug: row.slug,
        name: row.name,
        region_name: row.region_name,
        date_created: row.date_created,
        verified: row.verified,
        customer_id: row.customer_id,
        idempotency_key: row.idempotency_key,
        status,
    })
}

#[async_trait]
impl OrganizationMappingRepository for DieselOrganizationMappingRepository {
    async fn create(
        &self,
        request: &CreateMappingRequest,
    ) -> Result<MappingCreateOutcome, OrganizationMappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let reserved: Option<ReservedMappingRow> = diesel::sql_query(RESERVE_SLUG_SQL)
            .bind::<BigInt, _>(request.organization_id.get())
            .bind::<Varchar, _>(request.slug.as_str())
            .bind::<Varchar, _>(request.name.as_str())
            .bind::<Varchar, _>(request.region_name.as_str())
            .bind::<Nullable<Text>, _>(request.customer_id.as_deref())
            .bind::<Varchar, _>(request.idempotency_key.as_str())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, request.organization_id, &request.slug))?;

        let Some(reserved) = reserved else {
            debug!(slug = %request.slug, "slug held by a different organization");
            return Err(OrganizationMappingRepositoryError::slug_taken(
                request.slug.clone(),
            ));
        };
        let mapping = row_to_mapping(reserved.mapping)?;
        Ok(if reserved.inserted {
            MappingCreateOutcome::Created(mapping)
        } else {
            MappingCreateOutcome::Repointed(mapping)
        })
    }

    async fn upsert(
        &self,
        organization_id: OrganizationId,
        update: &MappingUpsert,
    ) -> Result<OrganizationMapping, OrganizationMappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewOrganizationMappingRow {
            organization_id: organization_id.get(),
            slug: update.slug.as_str(),
            name: update.name.as_str(),
            region_name: update.region_name.as_str(),
            customer_id: update.customer_id.as_deref(),
            status: update.status.as_str(),
        };
        let stored: OrganizationMappingRow = diesel::insert_into(organization_mappings::table)
            .values(&row)
            .on_conflict(organization_mappings::organization_id)
            .do_update()
            .set((
                organization_mappings::slug.eq(excluded(organization_mappings::slug)),
                organization_mappings::name.eq(excluded(organization_mappings::name)),
                organization_mappings::status.eq(excluded(organization_mappings::status)),
                organization_mappings::customer_id.eq(excluded(organization_mappings::customer_id)),
            ))
            .returning(OrganizationMappingRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_write_error(err, organization_id, &update.slug))?;
        row_to_mapping(stored)
    }

    async fn update(&self, patch: &MappingPatch) -> Result<bool, OrganizationMappingRepositoryError> {
        let changeset = MappingPatchChangeset {
            name: patch.name.as_ref().into_option().flatten().map(String::as_str),
            customer_id: patch
                .customer_id
                .as_ref()
                .into_option()
                .map(|value| value.map(String::as_str)),
        };
        if changeset.name.is_none() && changeset.customer_id.is_none() {
            return Ok(false);
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            organization_mappings::table
                .filter(organization_mappings::organization_id.eq(patch.organization_id.get())),
        )
        .set(&changeset)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn mark_verified(
        &self,
        organization_id: OrganizationId,
        slug: &str,
    ) -> Result<bool, OrganizationMappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            organization_mappings::table
                .filter(organization_mappings::organization_id.eq(organization_id.get()))
                .filter(organization_mappings::slug.eq(slug)),
        )
        .set(organization_mappings::verified.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete(
        &self,
        organization_id: OrganizationId,
    ) -> Result<bool, OrganizationMappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            organization_mappings::table
                .filter(organization_mappings::organization_id.eq(organization_id.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn find_by_organization_id(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OrganizationMappingRow> = organization_mappings::table
            .filter(organization_mappings::organization_id.eq(organization_id.get()))
            .select(OrganizationMappingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_mapping).transpose()
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<OrganizationMapping>, OrganizationMappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OrganizationMappingRow> = organization_mappings::table
            .filter(organization_mappings::slug.eq(slug))
            .select(OrganizationMappingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_mapping).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    struct Violation(&'static str);

    impl diesel::result::DatabaseErrorInformation for Violation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("organization_mappings")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn violation(constraint: &'static str) -> DieselError {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, Box::new(Violation(constraint)))
    }

    #[rstest]
    fn organization_constraint_maps_to_already_mapped() {
        let err = map_write_error(
            violation(ORGANIZATION_ID_CONSTRAINT),
            OrganizationId::new(3),
            "acme",
        );
        assert_eq!(
            err,
            OrganizationMappingRepositoryError::organization_already_mapped(OrganizationId::new(3))
        );
    }

    #[rstest]
    fn slug_constraint_maps_to_slug_taken() {
        let err = map_write_error(
            violation("organization_mappings_slug_key"),
            OrganizationId::new(3),
            "acme",
        );
        assert_eq!(err, OrganizationMappingRepositoryError::slug_taken("acme"));
    }

    #[rstest]
    fn unknown_status_is_a_query_error() {
        let row = OrganizationMappingRow {
            id: 1,
            organization_id: 2,
            slug: "acme".to_owned(),
            name: "Acme".to_owned(),
            region_name: "us".to_owned(),
            date_created: Utc::now(),
            verified: false,
            customer_id: None,
            idempotency_key: String::new(),
            status: "archived".to_owned(),
        };
        assert!(matches!(
            row_to_mapping(row),
            Err(OrganizationMappingRepositoryError::Query { .. })
        ));
    }
}
