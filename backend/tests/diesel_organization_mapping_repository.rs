//! Integration tests for the Diesel-backed organization mapping repository,
//! driven through `OrganizationMappingServiceImpl`.

use std::sync::Arc;

use hybrid_cloud::domain::ports::{
    OrganizationMappingError, OrganizationMappingRepository, OrganizationMappingService,
};
use hybrid_cloud::domain::{
    CreateMappingRequest, MappingPatch, MappingUpsert, OrganizationId,
    OrganizationMappingServiceImpl, OrganizationStatus, Patch,
};
use hybrid_cloud::outbound::persistence::DieselOrganizationMappingRepository;
use rstest::{fixture, rstest};

mod support;

use support::{TestDatabase, handle_cluster_setup_failure, provision_database};

struct MappingContext {
    db: TestDatabase,
    repository: Arc<DieselOrganizationMappingRepository>,
    service: OrganizationMappingServiceImpl<DieselOrganizationMappingRepository>,
}

#[fixture]
fn context() -> Option<MappingContext> {
    match provision_database() {
        Ok(db) => {
            let repository = Arc::new(DieselOrganizationMappingRepository::new(db.pool.clone()));
            let service = OrganizationMappingServiceImpl::new(Arc::clone(&repository));
            Some(MappingContext {
                db,
                repository,
                service,
            })
        }
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn acme(organization_id: i64) -> CreateMappingRequest {
    CreateMappingRequest::new(OrganizationId::new(organization_id), "acme", "Acme", "us")
}

#[rstest]
fn created_mapping_is_verified_and_never_cleared(context: Option<MappingContext>) {
    let Some(ctx) = context else {
        return;
    };
    let org = OrganizationId::new(1);

    ctx.db.runtime.block_on(async {
        let created = ctx.service.create(acme(1)).await.expect("create");
        assert!(!created.verified);
        assert_eq!(created.region_name, "us");
        assert_eq!(created.status, OrganizationStatus::Active);

        ctx.service.verify_mappings(org, "acme").await.expect("verify");
        let verified = ctx.service.get(org).await.expect("get").expect("mapping");
        assert!(verified.verified);

        ctx.service
            .verify_mappings(org, "wrong-slug")
            .await
            .expect("mismatched verify is not an error");
        let unchanged = ctx.service.get(org).await.expect("get").expect("mapping");
        assert!(unchanged.verified);
    });
}

#[rstest]
#[case("", "", true)]
#[case("key-1", "key-1", true)]
#[case("key-1", "key-2", false)]
#[case("", "key-2", false)]
fn reserved_slug_requires_matching_key(
    context: Option<MappingContext>,
    #[case] first_key: &str,
    #[case] second_key: &str,
    #[case] repoints: bool,
) {
    let Some(ctx) = context else {
        return;
    };

    ctx.db.runtime.block_on(async {
        ctx.service
            .create(acme(1).with_idempotency_key(first_key))
            .await
            .expect("first reservation");

        let result = ctx
            .service
            .create(acme(2).with_idempotency_key(second_key))
            .await;

        let holder = ctx
            .repository
            .find_by_slug("acme")
            .await
            .expect("lookup")
            .expect("slug reserved");
        if repoints {
            let mapping = result.expect("repointed");
            assert_eq!(mapping.organization_id, OrganizationId::new(2));
            assert_eq!(holder.organization_id, OrganizationId::new(2));
            assert_eq!(holder.idempotency_key, first_key);
        } else {
            let err = result.expect_err("slug is taken");
            assert_eq!(err, OrganizationMappingError::slug_taken("acme"));
            assert!(!err.is_retryable());
            assert_eq!(holder.organization_id, OrganizationId::new(1));
        }
    });
}

#[rstest]
fn replay_by_the_same_organization_succeeds(context: Option<MappingContext>) {
    let Some(ctx) = context else {
        return;
    };

    ctx.db.runtime.block_on(async {
        ctx.service
            .create(acme(1).with_idempotency_key("key-1"))
            .await
            .expect("first reservation");
        let replay = ctx
            .service
            .create(acme(1).with_idempotency_key("key-2"))
            .await
            .expect("same organization may replay");
        assert_eq!(replay.organization_id, OrganizationId::new(1));
    });
}

#[rstest]
fn second_slug_for_an_organization_is_rejected(context: Option<MappingContext>) {
    let Some(ctx) = context else {
        return;
    };

    ctx.db.runtime.block_on(async {
        ctx.service.create(acme(1)).await.expect("reserve");
        let err = ctx
            .service
            .create(CreateMappingRequest::new(
                OrganizationId::new(1),
                "acme-two",
                "Acme",
                "us",
            ))
            .await
            .expect_err("organization already mapped");
        assert_eq!(
            err,
            OrganizationMappingError::organization_already_mapped(OrganizationId::new(1))
        );
    });
}

#[rstest]
fn deleting_an_unknown_mapping_succeeds(context: Option<MappingContext>) {
    let Some(ctx) = context else {
        return;
    };

    ctx.db.runtime.block_on(async {
        ctx.service
            .delete(OrganizationId::new(999))
            .await
            .expect("idempotent delete");
        ctx.service.create(acme(1)).await.expect("reserve");
        ctx.service
            .delete(OrganizationId::new(1))
            .await
            .expect("delete");
        assert_eq!(ctx.repository.find_by_slug("acme").await, Ok(None));
    });
}

#[rstest]
fn upsert_and_patch_rewrite_fields(context: Option<MappingContext>) {
    let Some(ctx) = context else {
        return;
    };
    let org = OrganizationId::new(5);

    ctx.db.runtime.block_on(async {
        let inserted = ctx
            .service
            .upsert(
                org,
                MappingUpsert {
                    slug: "globex".to_owned(),
                    name: "Globex".to_owned(),
                    region_name: "de".to_owned(),
                    status: OrganizationStatus::Active,
                    customer_id: Some("cus_1".to_owned()),
                },
            )
            .await
            .expect("insert");
        assert_eq!(inserted.region_name, "de");

        let overwritten = ctx
            .service
            .upsert(
                org,
                MappingUpsert {
                    slug: "globex-corp".to_owned(),
                    name: "Globex Corp".to_owned(),
                    region_name: "us".to_owned(),
                    status: OrganizationStatus::PendingDeletion,
                    customer_id: Some("cus_1".to_owned()),
                },
            )
            .await
            .expect("overwrite");
        assert_eq!(overwritten.slug, "globex-corp");
        assert_eq!(overwritten.region_name, "de");
        assert_eq!(overwritten.status, OrganizationStatus::PendingDeletion);

        ctx.service
            .update(MappingPatch::new(org).with_customer_id(Patch::Null))
            .await
            .expect("patch");
        let patched = ctx.service.get(org).await.expect("get").expect("mapping");
        assert_eq!(patched.customer_id, None);
        assert_eq!(patched.name, "Globex Corp");
    });
}
