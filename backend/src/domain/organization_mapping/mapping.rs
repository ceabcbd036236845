//! Mapping entity and request values.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{OrganizationId, Patch, UserId};

/// Longest organization name a mapping stores, in characters.
pub const MAX_MAPPING_NAME_LENGTH: usize = 64;
/// Longest region name a mapping stores, in characters.
pub const MAX_REGION_NAME_LENGTH: usize = 48;
/// Longest idempotency key a mapping records, in characters.
pub const MAX_IDEMPOTENCY_KEY_LENGTH: usize = 48;
/// Longest customer id a mapping stores, in characters.
pub const MAX_CUSTOMER_ID_LENGTH: usize = 255;

/// Lifecycle status of the organization a mapping points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    #[default]
    Active,
    PendingDeletion,
    DeletionInProgress,
}

impl OrganizationStatus {
    /// All status variants.
    pub const ALL: [OrganizationStatus; 3] = [
        OrganizationStatus::Active,
        OrganizationStatus::PendingDeletion,
        OrganizationStatus::DeletionInProgress,
    ];

    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingDeletion => "pending_deletion",
            Self::DeletionInProgress => "deletion_in_progress",
        }
    }
}

impl fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored organization status is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown organization status `{input}`")]
pub struct ParseOrganizationStatusError {
    pub input: String,
}

impl FromStr for OrganizationStatus {
    type Err = ParseOrganizationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseOrganizationStatusError {
                input: s.to_owned(),
            })
    }
}

/// A slug reservation for one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMapping {
    pub organization_id: OrganizationId,
    pub slug: String,
    pub name: String,
    pub region_name: String,
    pub date_created: DateTime<Utc>,
    pub verified: bool,
    pub customer_id: Option<String>,
    /// Key supplied when the slug was first reserved; empty when none was.
    pub idempotency_key: String,
    pub status: OrganizationStatus,
}

/// Input of [`crate::domain::ports::OrganizationMappingService::create`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateMappingRequest {
    /// Acting user, recorded in logs only.
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub organization_id: OrganizationId,
    pub slug: String,
    pub name: String,
    pub region_name: String,
    #[serde(default)]
    pub idempotency_key: String,
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl CreateMappingRequest {
    /// Build a request without an acting user, idempotency key or customer.
    pub fn new(
        organization_id: OrganizationId,
        slug: impl Into<String>,
        name: impl Into<String>,
        region_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: None,
            organization_id,
            slug: slug.into(),
            name: name.into(),
            region_name: region_name.into(),
            idempotency_key: String::new(),
            customer_id: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = key.into();
        self
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// How a create call was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingCreateOutcome {
    /// No mapping held the slug; a new one was inserted.
    Created(OrganizationMapping),
    /// An existing mapping for the slug was re-pointed or replayed.
    Repointed(OrganizationMapping),
}

impl MappingCreateOutcome {
    pub fn into_mapping(self) -> OrganizationMapping {
        match self {
            Self::Created(mapping) | Self::Repointed(mapping) => mapping,
        }
    }
}

/// Full overwrite of a mapping keyed by organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MappingUpsert {
    pub slug: String,
    pub name: String,
    /// Only applied when the mapping is inserted.
    pub region_name: String,
    #[serde(default)]
    pub status: OrganizationStatus,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Partial update of a mapping keyed by organization.
///
/// # Examples
/// ```
/// use hybrid_cloud::domain::{MappingPatch, OrganizationId, Patch};
///
/// let patch = MappingPatch::new(OrganizationId::new(1)).with_customer_id(Patch::Null);
/// assert!(!patch.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MappingPatch {
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub customer_id: Patch<String>,
}

impl MappingPatch {
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            name: Patch::Unset,
            customer_id: Patch::Unset,
        }
    }

    pub fn with_name(mut self, name: Patch<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_customer_id(mut self, customer_id: Patch<String>) -> Self {
        self.customer_id = customer_id;
        self
    }

    /// Returns `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        !self.name.is_set() && !self.customer_id.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn patch_deserialises_absent_and_null_fields() {
        let patch: MappingPatch =
            serde_json::from_value(json!({"organization_id": 4, "customer_id": null}))
                .expect("valid patch");
        assert_eq!(patch.name, Patch::Unset);
        assert_eq!(patch.customer_id, Patch::Null);
        assert!(!patch.is_empty());
    }

    #[rstest]
    fn empty_patch_is_detected() {
        assert!(MappingPatch::new(OrganizationId::new(1)).is_empty());
    }

    #[rstest]
    fn create_request_defaults_to_empty_key() {
        let request: CreateMappingRequest = serde_json::from_value(json!({
            "organization_id": 1,
            "slug": "acme",
            "name": "Acme",
            "region_name": "us",
        }))
        .expect("valid request");
        assert_eq!(request.idempotency_key, "");
        assert_eq!(request.user_id, None);
    }

    #[rstest]
    fn status_round_trips_database_strings() {
        for status in OrganizationStatus::ALL {
            assert_eq!(status.as_str().parse::<OrganizationStatus>(), Ok(status));
        }
    }
}
