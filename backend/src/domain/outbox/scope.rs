//! Outbox shard scopes and shard keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseOutboxValueError;
use crate::domain::{OrganizationId, UserId};

/// Namespace of a shard identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxScope {
    /// Shards keyed by organization id.
    OrganizationScope,
    /// Shards keyed by user id.
    UserScope,
}

impl OutboxScope {
    /// All scope variants.
    pub const ALL: [OutboxScope; 2] = [OutboxScope::OrganizationScope, OutboxScope::UserScope];

    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrganizationScope => "organization_scope",
            Self::UserScope => "user_scope",
        }
    }
}

impl fmt::Display for OutboxScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboxScope {
    type Err = ParseOutboxValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| ParseOutboxValueError {
                kind: "scope",
                input: s.to_owned(),
            })
    }
}

/// The unit of ordering for outbox delivery.
///
/// Records sharing a shard key are delivered in ascending id order; records
/// of different shards carry no relative ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShardKey {
    pub scope: OutboxScope,
    pub identifier: i64,
}

impl ShardKey {
    pub fn new(scope: OutboxScope, identifier: i64) -> Self {
        Self { scope, identifier }
    }

    /// Shard for records about an organization or its members.
    pub fn organization(organization_id: OrganizationId) -> Self {
        Self::new(OutboxScope::OrganizationScope, organization_id.get())
    }

    /// Shard for records about a user account.
    pub fn user(user_id: UserId) -> Self {
        Self::new(OutboxScope::UserScope, user_id.get())
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn scope_parses_database_representation() {
        for scope in OutboxScope::ALL {
            assert_eq!(scope.as_str().parse::<OutboxScope>(), Ok(scope));
        }
        assert!("ORGANIZATION_SCOPE".parse::<OutboxScope>().is_err());
    }

    #[rstest]
    fn organization_shard_uses_organization_id() {
        let shard = ShardKey::organization(OrganizationId::new(9));
        assert_eq!(shard.to_string(), "organization_scope:9");
    }
}
