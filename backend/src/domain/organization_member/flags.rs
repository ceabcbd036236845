//! Bit flags stored on a membership row.

use std::fmt;
use std::ops::BitOr;

/// Set of membership flags.
///
/// # Example
///
/// ```
/// # use hybrid_cloud::domain::MemberFlags;
/// let flags = MemberFlags::SSO_LINKED | MemberFlags::IDP_PROVISIONED;
/// assert!(flags.contains(MemberFlags::SSO_LINKED));
/// assert!(!flags.contains(MemberFlags::SSO_INVALID));
/// assert_eq!(flags.bits(), 0b1001);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MemberFlags(i64);

impl MemberFlags {
    pub const SSO_LINKED: Self = Self(1);
    pub const SSO_INVALID: Self = Self(1 << 1);
    pub const MEMBER_LIMIT_RESTRICTED: Self = Self(1 << 2);
    pub const IDP_PROVISIONED: Self = Self(1 << 3);
    pub const IDP_ROLE_RESTRICTED: Self = Self(1 << 4);

    const NAMED: [(Self, &'static str); 5] = [
        (Self::SSO_LINKED, "sso:linked"),
        (Self::SSO_INVALID, "sso:invalid"),
        (Self::MEMBER_LIMIT_RESTRICTED, "member-limit:restricted"),
        (Self::IDP_PROVISIONED, "idp:provisioned"),
        (Self::IDP_ROLE_RESTRICTED, "idp:role-restricted"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap stored bits; unknown bits are preserved.
    pub const fn from_bits(bits: i64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> i64 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Names of the known flags that are set.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl BitOr for MemberFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for MemberFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
