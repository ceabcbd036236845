//! Tri-state field updates.
//!
//! A partial update has to distinguish a field the caller did not mention
//! from one the caller explicitly cleared. `Option<T>` cannot express that,
//! so patches use [`Patch`].

use serde::{Deserialize, Deserializer};

/// A single field of a partial update.
///
/// Deserialising with `#[serde(default)]` on the containing struct maps a
/// missing key to [`Patch::Unset`], `null` to [`Patch::Null`] and any other
/// value to [`Patch::Value`].
///
/// # Examples
/// ```
/// use hybrid_cloud::domain::Patch;
///
/// let patch: Patch<String> = Patch::Value("Acme".to_owned());
/// assert!(patch.is_set());
/// assert!(!Patch::<String>::Unset.is_set());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the stored value untouched.
    Unset,
    /// Clear the stored value.
    Null,
    /// Replace the stored value.
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Patch<T> {
    /// Returns `true` unless the field is [`Patch::Unset`].
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// Borrow the contained value.
    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Self::Unset => Patch::Unset,
            Self::Null => Patch::Null,
            Self::Value(value) => Patch::Value(value),
        }
    }

    /// Collapse into the nested option shape used by changesets:
    /// `None` for unset, `Some(None)` for null.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Unset => None,
            Self::Null => Some(None),
            Self::Value(value) => Some(Some(value)),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}
