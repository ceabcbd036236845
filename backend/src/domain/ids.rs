//! Integer identifiers shared across the consistency core.
//!
//! Every persisted row is addressed by a 64-bit identifier. Wrapping them in
//! distinct newtypes keeps an organization id from being passed where a
//! member id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw identifier.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Access the raw identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of an organization; also the outbox shard identifier for
    /// organization-scoped records.
    OrganizationId
);
define_id!(
    /// Identifier of a user account.
    UserId
);
define_id!(
    /// Identifier of an organization membership row.
    MemberId
);
define_id!(
    /// Identifier of an outbox record; strictly increasing per insert.
    OutboxRecordId
);
define_id!(
    /// Identifier of a team inside an organization.
    TeamId
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn ids_serialise_as_bare_integers() {
        let value = serde_json::to_value(OrganizationId::new(42)).expect("serialise id");
        assert_eq!(value, serde_json::json!(42));
    }

    #[rstest]
    fn ids_order_by_raw_value() {
        assert!(OutboxRecordId::new(1) < OutboxRecordId::new(2));
        assert_eq!(MemberId::from(7).to_string(), "7");
    }
}
