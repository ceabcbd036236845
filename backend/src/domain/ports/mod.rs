//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod organization_mapping_repository;
mod organization_mapping_service;
mod organization_member_repository;
mod outbox_store;

#[cfg(test)]
pub use organization_mapping_repository::MockOrganizationMappingRepository;
pub use organization_mapping_repository::{
    OrganizationMappingRepository, OrganizationMappingRepositoryError,
};
#[cfg(test)]
pub use organization_mapping_service::MockOrganizationMappingService;
pub use organization_mapping_service::{OrganizationMappingError, OrganizationMappingService};
#[cfg(test)]
pub use organization_member_repository::MockOrganizationMemberRepository;
pub use organization_member_repository::{
    MemberWrite, OrganizationMemberRepository, OrganizationMemberRepositoryError,
};
#[cfg(test)]
pub use outbox_store::MockOutboxStore;
pub use outbox_store::{OutboxStore, OutboxStoreError};
