//! Approval state of an invitation.

use serde::{Deserialize, Serialize};

/// Where an invite sits in the approval workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// The invite is approved (or the member joined directly).
    #[default]
    Approved,
    /// A member asked an owner to invite someone.
    RequestedToBeInvited,
    /// Someone asked to join the organization.
    RequestedToJoin,
}

/// Stored invite status that does not match a known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown invite status {0}")]
pub struct UnknownInviteStatus(pub i16);

impl InviteStatus {
    /// Returns the database representation.
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Approved => 0,
            Self::RequestedToBeInvited => 1,
            Self::RequestedToJoin => 2,
        }
    }
}

impl TryFrom<i16> for InviteStatus {
    type Error = UnknownInviteStatus;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Approved),
            1 => Ok(Self::RequestedToBeInvited),
            2 => Ok(Self::RequestedToJoin),
            other => Err(UnknownInviteStatus(other)),
        }
    }
}
