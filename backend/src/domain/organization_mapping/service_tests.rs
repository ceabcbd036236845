//! Tests for the organization mapping service and its silo stub.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockOrganizationMappingRepository, OrganizationMappingError,
    OrganizationMappingRepositoryError, OrganizationMappingService,
};
use crate::domain::{Delegate, OrganizationId, Patch, SiloDelegation, SiloMode};

fn mapping(organization_id: i64, slug: &str) -> OrganizationMapping {
    OrganizationMapping {
        organization_id: OrganizationId::new(organization_id),
        slug: slug.to_owned(),
        name: "Acme".to_owned(),
        region_name: "us".to_owned(),
        date_created: Utc
            .with_ymd_and_hms(2026, 2, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp"),
        verified: false,
        customer_id: None,
        idempotency_key: String::new(),
        status: OrganizationStatus::Active,
    }
}

#[fixture]
fn repository() -> MockOrganizationMappingRepository {
    MockOrganizationMappingRepository::new()
}

fn service(
    repository: MockOrganizationMappingRepository,
) -> OrganizationMappingServiceImpl<MockOrganizationMappingRepository> {
    OrganizationMappingServiceImpl::new(Arc::new(repository))
}

#[rstest]
#[tokio::test]
async fn create_returns_new_mapping(mut repository: MockOrganizationMappingRepository) {
    repository
        .expect_create()
        .withf(|request| request.slug == "acme" && request.idempotency_key.is_empty())
        .times(1)
        .returning(|_| Ok(MappingCreateOutcome::Created(mapping(1, "acme"))));

    let created = service(repository)
        .create(CreateMappingRequest::new(OrganizationId::new(1), "acme", "Acme", "us"))
        .await
        .expect("mapping created");

    assert_eq!(created.slug, "acme");
    assert!(!created.verified);
}

#[rstest]
#[case("", "Acme", "us")]
#[case("Not A Slug", "Acme", "us")]
#[case("acme", " ", "us")]
#[case("acme", "Acme", "")]
#[tokio::test]
async fn create_rejects_invalid_requests_without_writing(
    mut repository: MockOrganizationMappingRepository,
    #[case] slug: &str,
    #[case] name: &str,
    #[case] region: &str,
) {
    repository.expect_create().never();

    let err = service(repository)
        .create(CreateMappingRequest::new(OrganizationId::new(1), slug, name, region))
        .await
        .expect_err("invalid request");

    assert!(matches!(err, OrganizationMappingError::InvalidRequest { .. }));
}

#[rstest]
#[tokio::test]
async fn slug_conflict_is_distinct_and_not_retryable(
    mut repository: MockOrganizationMappingRepository,
) {
    repository
        .expect_create()
        .returning(|request| Err(OrganizationMappingRepositoryError::slug_taken(request.slug.clone())));

    let err = service(repository)
        .create(
            CreateMappingRequest::new(OrganizationId::new(2), "acme", "Acme", "us")
                .with_idempotency_key("other"),
        )
        .await
        .expect_err("slug taken");

    assert_eq!(err, OrganizationMappingError::slug_taken("acme"));
    assert!(!err.is_retryable());
}

#[rstest]
#[tokio::test]
async fn connection_failures_surface_as_retryable(
    mut repository: MockOrganizationMappingRepository,
) {
    repository
        .expect_delete()
        .returning(|_| Err(OrganizationMappingRepositoryError::connection("pool exhausted")));

    let err = service(repository)
        .delete(OrganizationId::new(1))
        .await
        .expect_err("connection failure");

    assert!(err.is_retryable());
}

#[rstest]
#[tokio::test]
async fn deleting_missing_mapping_succeeds(mut repository: MockOrganizationMappingRepository) {
    repository
        .expect_delete()
        .withf(|id| *id == OrganizationId::new(999))
        .times(1)
        .returning(|_| Ok(false));

    service(repository)
        .delete(OrganizationId::new(999))
        .await
        .expect("idempotent delete");
}

#[rstest]
#[tokio::test]
async fn empty_patch_is_a_no_op(mut repository: MockOrganizationMappingRepository) {
    repository.expect_update().never();

    service(repository)
        .update(MappingPatch::new(OrganizationId::new(1)))
        .await
        .expect("no-op");
}

#[rstest]
#[tokio::test]
async fn clearing_name_is_rejected(mut repository: MockOrganizationMappingRepository) {
    repository.expect_update().never();

    let err = service(repository)
        .update(MappingPatch::new(OrganizationId::new(1)).with_name(Patch::Null))
        .await
        .expect_err("name is required");

    assert!(matches!(err, OrganizationMappingError::InvalidRequest { .. }));
}

#[rstest]
#[tokio::test]
async fn patch_for_missing_mapping_is_a_no_op(mut repository: MockOrganizationMappingRepository) {
    repository
        .expect_update()
        .withf(|patch| patch.customer_id == Patch::Null && !patch.name.is_set())
        .times(1)
        .returning(|_| Ok(false));

    service(repository)
        .update(MappingPatch::new(OrganizationId::new(5)).with_customer_id(Patch::Null))
        .await
        .expect("missing mapping ignored");
}

#[rstest]
#[tokio::test]
async fn verify_mismatch_returns_normally(mut repository: MockOrganizationMappingRepository) {
    repository
        .expect_mark_verified()
        .withf(|id, slug| *id == OrganizationId::new(1) && slug == "wrong-slug")
        .times(1)
        .returning(|_, _| Ok(false));

    service(repository)
        .verify_mappings(OrganizationId::new(1), "wrong-slug")
        .await
        .expect("mismatch is not an error");
}

#[rstest]
#[tokio::test]
async fn upsert_validates_slug(mut repository: MockOrganizationMappingRepository) {
    repository.expect_upsert().never();
    let update = MappingUpsert {
        slug: "Bad Slug".to_owned(),
        name: "Acme".to_owned(),
        region_name: "us".to_owned(),
        status: OrganizationStatus::Active,
        customer_id: None,
    };

    let err = service(repository)
        .upsert(OrganizationId::new(1), update)
        .await
        .expect_err("invalid slug");

    assert!(matches!(err, OrganizationMappingError::InvalidRequest { .. }));
}

#[rstest]
#[tokio::test]
async fn region_silo_stubs_every_call_without_building_the_repository() {
    let delegation: SiloDelegation<dyn OrganizationMappingService> = SiloDelegation::new(
        Delegate::local(|| panic!("monolith implementation must not be built")),
        Delegate::stubbed(SiloMode::Control),
        Delegate::local(|| panic!("control implementation must not be built")),
    );
    let service = delegation.resolve(SiloMode::Region);

    let err = service
        .create(CreateMappingRequest::new(OrganizationId::new(1), "acme", "Acme", "us"))
        .await
        .expect_err("stubbed");
    assert_eq!(
        err,
        OrganizationMappingError::not_supported_in_silo("create", SiloMode::Region, SiloMode::Control)
    );
    assert!(service.delete(OrganizationId::new(1)).await.is_err());
    assert!(service.verify_mappings(OrganizationId::new(1), "acme").await.is_err());
    assert!(service.get(OrganizationId::new(1)).await.is_err());
}

#[rstest]
#[tokio::test]
async fn control_silo_uses_local_implementation(mut repository: MockOrganizationMappingRepository) {
    repository
        .expect_find_by_organization_id()
        .returning(|id| Ok(Some(mapping(id.get(), "acme"))));
    let repository = Arc::new(repository);
    let delegation: SiloDelegation<dyn OrganizationMappingService> = SiloDelegation::new(
        Delegate::stubbed(SiloMode::Control),
        Delegate::stubbed(SiloMode::Control),
        Delegate::local(move || {
            Arc::new(OrganizationMappingServiceImpl::new(repository))
                as Arc<dyn OrganizationMappingService>
        }),
    );

    let found = delegation
        .resolve(SiloMode::Control)
        .get(OrganizationId::new(3))
        .await
        .expect("lookup succeeds");

    assert_eq!(found.map(|m| m.organization_id), Some(OrganizationId::new(3)));
}

fn long(length: usize) -> String {
    "x".repeat(length)
}

fn upsert_request() -> MappingUpsert {
    MappingUpsert {
        slug: "acme".to_owned(),
        name: "Acme".to_owned(),
        region_name: "us".to_owned(),
        status: OrganizationStatus::Active,
        customer_id: None,
    }
}

#[rstest]
#[case::name(CreateMappingRequest::new(OrganizationId::new(1), "acme", long(MAX_MAPPING_NAME_LENGTH + 1), "us"))]
#[case::region(CreateMappingRequest::new(OrganizationId::new(1), "acme", "Acme", long(MAX_REGION_NAME_LENGTH + 1)))]
#[case::idempotency_key(
    CreateMappingRequest::new(OrganizationId::new(1), "acme", "Acme", "us")
        .with_idempotency_key(long(MAX_IDEMPOTENCY_KEY_LENGTH + 1))
)]
#[case::customer_id(
    CreateMappingRequest::new(OrganizationId::new(1), "acme", "Acme", "us")
        .with_customer_id(long(MAX_CUSTOMER_ID_LENGTH + 1))
)]
#[tokio::test]
async fn create_rejects_values_longer_than_their_columns(
    mut repository: MockOrganizationMappingRepository,
    #[case] request: CreateMappingRequest,
) {
    repository.expect_create().never();

    let err = service(repository)
        .create(request)
        .await
        .expect_err("value too long");

    assert!(matches!(err, OrganizationMappingError::InvalidRequest { .. }));
}

#[rstest]
#[tokio::test]
async fn create_accepts_values_at_their_column_limits(
    mut repository: MockOrganizationMappingRepository,
) {
    repository
        .expect_create()
        .times(1)
        .returning(|_| Ok(MappingCreateOutcome::Created(mapping(1, "acme"))));
    let request = CreateMappingRequest::new(
        OrganizationId::new(1),
        "acme",
        long(MAX_MAPPING_NAME_LENGTH),
        long(MAX_REGION_NAME_LENGTH),
    )
    .with_idempotency_key(long(MAX_IDEMPOTENCY_KEY_LENGTH))
    .with_customer_id(long(MAX_CUSTOMER_ID_LENGTH));

    service(repository)
        .create(request)
        .await
        .expect("limits are inclusive");
}

#[rstest]
#[case::name(MappingUpsert { name: long(MAX_MAPPING_NAME_LENGTH + 1), ..upsert_request() })]
#[case::region(MappingUpsert { region_name: long(MAX_REGION_NAME_LENGTH + 1), ..upsert_request() })]
#[case::customer_id(MappingUpsert {
    customer_id: Some(long(MAX_CUSTOMER_ID_LENGTH + 1)),
    ..upsert_request()
})]
#[tokio::test]
async fn upsert_rejects_values_longer_than_their_columns(
    mut repository: MockOrganizationMappingRepository,
    #[case] update: MappingUpsert,
) {
    repository.expect_upsert().never();

    let err = service(repository)
        .upsert(OrganizationId::new(1), update)
        .await
        .expect_err("value too long");

    assert!(matches!(err, OrganizationMappingError::InvalidRequest { .. }));
}

#[rstest]
#[case::name(MappingPatch::new(OrganizationId::new(1)).with_name(Patch::Value(long(MAX_MAPPING_NAME_LENGTH + 1))))]
#[case::customer_id(
    MappingPatch::new(OrganizationId::new(1))
        .with_customer_id(Patch::Value(long(MAX_CUSTOMER_ID_LENGTH + 1)))
)]
#[tokio::test]
async fn patch_rejects_values_longer_than_their_columns(
    mut repository: MockOrganizationMappingRepository,
    #[case] patch: MappingPatch,
) {
    repository.expect_update().never();

    let err = service(repository)
        .update(patch)
        .await
        .expect_err("value too long");

    assert!(matches!(err, OrganizationMappingError::InvalidRequest { .. }));
}

#[rstest]
#[tokio::test]
async fn blank_region_takes_the_configured_default(
    mut repository: MockOrganizationMappingRepository,
) {
    repository
        .expect_create()
        .withf(|request| request.region_name == "eu")
        .times(1)
        .returning(|_| Ok(MappingCreateOutcome::Created(mapping(1, "acme"))));

    service(repository)
        .with_default_region("eu")
        .create(CreateMappingRequest::new(OrganizationId::new(1), "acme", "Acme", ""))
        .await
        .expect("default region applied");
}

#[rstest]
#[tokio::test]
async fn explicit_region_wins_over_the_default(mut repository: MockOrganizationMappingRepository) {
    repository
        .expect_upsert()
        .withf(|_, update| update.region_name == "us")
        .times(1)
        .returning(|_, _| Ok(mapping(1, "acme")));

    service(repository)
        .with_default_region("eu")
        .upsert(OrganizationId::new(1), upsert_request())
        .await
        .expect("explicit region kept");
}
