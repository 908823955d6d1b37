//! Tag validation for track tags.
//!
//! Valid tags:
//! - Non-empty once surrounding whitespace is trimmed
//! - At most [`MAX_TAG_LEN`] characters after trimming
//! - No control characters and no commas (commas separate tags in inputs)
//!
//! Case and surrounding whitespace are *not* rejected: tags are stored as
//! typed and only normalized when counted.

pub const MAX_TAG_LEN: usize = 32;

/// Validates a single track tag.
///
/// # Examples
/// ```
/// use murmurapp::tags::validation::validate_tag;
///
/// assert!(validate_tag("asmr").is_ok());
/// assert!(validate_tag(" Female ").is_ok());
/// assert!(validate_tag("lo-fi beats").is_ok());
///
/// assert!(validate_tag("").is_err());
/// assert!(validate_tag("   ").is_err());
/// assert!(validate_tag("rain,storm").is_err());
/// ```
pub fn validate_tag(tag: &str) -> Result<(), TagValidationError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(TagValidationError::Empty);
    }

    let len = trimmed.chars().count();
    if len > MAX_TAG_LEN {
        return Err(TagValidationError::TooLong(len));
    }

    for ch in trimmed.chars() {
        if ch.is_control() || ch == ',' {
            return Err(TagValidationError::InvalidCharacter(ch));
        }
    }

    Ok(())
}

/// Validates every tag of a list, reporting the first failure with its tag.
pub fn validate_tags(tags: &[String]) -> Result<(), (String, TagValidationError)> {
    for tag in tags {
        validate_tag(tag).map_err(|e| (tag.clone(), e))?;
    }
    Ok(())
}

/// Error type for tag validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    /// Tag is empty or whitespace only
    Empty,
    /// Tag is longer than [`MAX_TAG_LEN`] characters
    TooLong(usize),
    /// Tag contains a control character or a comma
    InvalidCharacter(char),
}

impl std::fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValidationError::Empty => write!(f, "tag cannot be empty"),
            TagValidationError::TooLong(len) => {
                write!(
                    f,
                    "tag is {} characters long (maximum is {})",
                    len, MAX_TAG_LEN
                )
            }
            TagValidationError::InvalidCharacter(ch) => {
                write!(f, "tag contains invalid character {:?}", ch)
            }
        }
    }
}

impl std::error::Error for TagValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only_is_empty() {
        assert_eq!(validate_tag(" \t "), Err(TagValidationError::Empty));
    }

    #[test]
    fn test_length_counts_chars_after_trim() {
        let padded = format!("  {}  ", "a".repeat(MAX_TAG_LEN));
        assert!(validate_tag(&padded).is_ok());

        let long = "ä".repeat(MAX_TAG_LEN + 1);
        assert_eq!(
            validate_tag(&long),
            Err(TagValidationError::TooLong(MAX_TAG_LEN + 1))
        );
    }

    #[test]
    fn test_control_characters_rejected() {
        assert_eq!(
            validate_tag("rain\nstorm"),
            Err(TagValidationError::InvalidCharacter('\n'))
        );
    }

    #[test]
    fn test_validate_tags_reports_offending_tag() {
        let tags = vec!["ok".to_string(), "".to_string()];
        let (tag, err) = validate_tags(&tags).unwrap_err();
        assert_eq!(tag, "");
        assert_eq!(err, TagValidationError::Empty);
    }
}
