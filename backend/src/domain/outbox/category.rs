//! Outbox record categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseOutboxValueError;

/// What kind of change an outbox record announces.
///
/// # Example
///
/// ```
/// # use hybrid_cloud::domain::OutboxCategory;
/// assert_eq!(
///     OutboxCategory::OrganizationMemberUpdate.as_str(),
///     "organization_member_update"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxCategory {
    /// A user account changed.
    UserUpdate,
    /// An organization changed.
    OrganizationUpdate,
    /// An organization membership was created, changed or removed.
    OrganizationMemberUpdate,
}

impl OutboxCategory {
    /// All category variants.
    pub const ALL: [OutboxCategory; 3] = [
        OutboxCategory::UserUpdate,
        OutboxCategory::OrganizationUpdate,
        OutboxCategory::OrganizationMemberUpdate,
    ];

    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserUpdate => "user_update",
            Self::OrganizationUpdate => "organization_update",
            Self::OrganizationMemberUpdate => "organization_member_update",
        }
    }
}

impl fmt::Display for OutboxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboxCategory {
    type Err = ParseOutboxValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseOutboxValueError {
                kind: "category",
                input: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_every_variant() {
        for category in OutboxCategory::ALL {
            assert_eq!(category.as_str().parse::<OutboxCategory>(), Ok(category));
        }
    }

    #[rstest]
    fn rejects_unknown_category() {
        let err = "team_update".parse::<OutboxCategory>().expect_err("unknown");
        assert_eq!(err.kind, "category");
        assert_eq!(err.input, "team_update");
    }
}
