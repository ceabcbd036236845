//! Organization slug mappings.
//!
//! A mapping reserves a globally unique slug for an organization living in
//! some region silo. The control silo is authoritative for mappings; region
//! silos reach them through the silo-aware service resolution in
//! [`crate::domain::silo_delegation`].

mod mapping;
mod service;
mod stub;

pub use mapping::{
    CreateMappingRequest, MAX_CUSTOMER_ID_LENGTH, MAX_IDEMPOTENCY_KEY_LENGTH,
    MAX_MAPPING_NAME_LENGTH, MAX_REGION_NAME_LENGTH, MappingCreateOutcome, MappingPatch,
    MappingUpsert, OrganizationMapping, OrganizationStatus, ParseOrganizationStatusError,
};
pub use service::OrganizationMappingServiceImpl;
pub use stub::SiloStubOrganizationMappingService;

#[cfg(test)]
mod service_tests;
