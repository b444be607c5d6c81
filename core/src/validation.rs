//! Client-side checks mirroring Etsy's listing field limits.
//!
//! Run before any network call so oversized payloads never reach the API.

use crate::models::ListingUpdate;
use thiserror::Error;

pub const MAX_TITLE_LENGTH: usize = 140;
pub const MAX_TAGS: usize = 13;
pub const MAX_TAG_LENGTH: usize = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title too long: {0} chars (max {max})", max = MAX_TITLE_LENGTH)]
    TitleTooLong(usize),
    #[error("Too many tags: {0} (max {max})", max = MAX_TAGS)]
    TooManyTags(usize),
    #[error("Tag too long: '{tag}' ({len} chars, max {max})", max = MAX_TAG_LENGTH)]
    TagTooLong { tag: String, len: usize },
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong(len));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::TooManyTags(tags.len()));
    }
    for tag in tags {
        let len = tag.chars().count();
        if len > MAX_TAG_LENGTH {
            return Err(ValidationError::TagTooLong {
                tag: tag.clone(),
                len,
            });
        }
    }
    Ok(())
}

pub fn validate_update(update: &ListingUpdate) -> Result<(), ValidationError> {
    if let Some(title) = &update.title {
        validate_title(title)?;
    }
    if let Some(tags) = &update.tags {
        validate_tags(tags)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("tag {i}")).collect()
    }

    #[test]
    fn test_title_limit() {
        assert!(validate_title(&"a".repeat(140)).is_ok());
        assert_eq!(
            validate_title(&"a".repeat(141)),
            Err(ValidationError::TitleTooLong(141))
        );
    }

    #[test]
    fn test_title_counts_chars_not_bytes() {
        assert!(validate_title(&"ż".repeat(140)).is_ok());
    }

    #[test]
    fn test_tag_count_limit() {
        assert!(validate_tags(&tags(13)).is_ok());
        assert_eq!(
            validate_tags(&tags(14)),
            Err(ValidationError::TooManyTags(14))
        );
    }

    #[test]
    fn test_tag_length_limit() {
        assert!(validate_tags(&["x".repeat(20)]).is_ok());
        let err = validate_tags(&["x".repeat(21)]).unwrap_err();
        assert!(matches!(err, ValidationError::TagTooLong { len: 21, .. }));
    }

    #[test]
    fn test_update_only_checks_supplied_fields() {
        let update = ListingUpdate {
            description: Some("d".repeat(5000)),
            ..Default::default()
        };
        assert!(validate_update(&update).is_ok());
    }
}
