//! Organization slug validation.
//!
//! Slugs are trimmed, non-empty identifiers composed of lowercase ASCII
//! letters, digits, and hyphens, at most [`MAX_SLUG_LENGTH`] characters long.

/// Longest slug a mapping may reserve.
pub const MAX_SLUG_LENGTH: usize = 50;

/// Reasons a slug is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SlugValidationError {
    #[error("slug must not be empty")]
    Empty,
    #[error("slug must be at most {MAX_SLUG_LENGTH} characters")]
    TooLong,
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacters,
}

/// Return `true` when `value` is a valid organization slug.
pub fn is_valid_slug(value: &str) -> bool {
    validate_slug(value).is_ok()
}

/// Validate `value` as an organization slug.
pub fn validate_slug(value: &str) -> Result<(), SlugValidationError> {
    if !is_trimmed_non_empty(value) {
        return Err(SlugValidationError::Empty);
    }
    if value.chars().count() > MAX_SLUG_LENGTH {
        return Err(SlugValidationError::TooLong);
    }
    if !has_allowed_slug_chars(value) {
        return Err(SlugValidationError::InvalidCharacters);
    }
    Ok(())
}

fn is_trimmed_non_empty(value: &str) -> bool {
    !value.is_empty() && value.trim() == value
}

fn has_allowed_slug_chars(value: &str) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("acme")]
    #[case("acme-2")]
    #[case("a")]
    fn accepts_valid_slugs(#[case] slug: &str) {
        assert!(is_valid_slug(slug));
    }

    #[rstest]
    #[case("", SlugValidationError::Empty)]
    #[case(" acme", SlugValidationError::Empty)]
    #[case("Acme", SlugValidationError::InvalidCharacters)]
    #[case("acme_corp", SlugValidationError::InvalidCharacters)]
    fn rejects_invalid_slugs(#[case] slug: &str, #[case] expected: SlugValidationError) {
        assert_eq!(validate_slug(slug), Err(expected));
    }

    #[rstest]
    fn rejects_overlong_slugs() {
        let slug = "a".repeat(MAX_SLUG_LENGTH + 1);
        assert_eq!(validate_slug(&slug), Err(SlugValidationError::TooLong));
        assert!(is_valid_slug(&"a".repeat(MAX_SLUG_LENGTH)));
    }
}
