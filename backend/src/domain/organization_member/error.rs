//! Errors raised by membership operations.

use serde_json::json;

use crate::domain::Error;
use crate::domain::ports::OrganizationMemberRepositoryError;

/// Failure of a membership operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    /// The member breaks a structural rule. Programming error; never retried.
    #[error("organization member invariant violated: {message}")]
    InvariantViolation { message: String },
    /// The operation needs a persisted member.
    #[error("organization member has not been saved")]
    Unsaved,
    #[error(transparent)]
    Repository(#[from] OrganizationMemberRepositoryError),
}

impl MembershipError {
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Only connection failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Repository(OrganizationMemberRepositoryError::Connection { .. })
        )
    }
}

impl From<MembershipError> for Error {
    fn from(value: MembershipError) -> Self {
        let message = value.to_string();
        match value {
            MembershipError::InvariantViolation { .. } => {
                Error::internal(message).with_details(json!({ "code": "invariant_violation" }))
            }
            MembershipError::Unsaved => Error::internal(message),
            MembershipError::Repository(error) => match error {
                OrganizationMemberRepositoryError::NotFound { member_id } => Error::not_found(message)
                    .with_details(json!({ "memberId": member_id })),
                OrganizationMemberRepositoryError::Duplicate { .. } => {
                    Error::conflict(message).with_details(json!({ "code": "duplicate_member" }))
                }
                OrganizationMemberRepositoryError::NotSupportedInSilo {
                    operation,
                    current,
                    authority,
                } => Error::misconfigured(message).with_details(json!({
                    "code": "not_supported_in_silo",
                    "operation": operation,
                    "current": current,
                    "authority": authority,
                })),
                OrganizationMemberRepositoryError::Connection { .. } => {
                    Error::service_unavailable(message)
                }
                OrganizationMemberRepositoryError::Query { .. } => Error::internal(message),
            },
        }
    }
}
