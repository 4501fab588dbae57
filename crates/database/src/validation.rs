//! Input validation for prompt history fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Too many items in a list.
    TooMany { field: String, max: usize, actual: usize },
    /// Value has the wrong shape or is not one of the allowed values.
    Invalid { field: String, message: String },
}

impl ValidationError {
    /// Create an `Invalid` error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Empty(field) => field,
            ValidationError::TooLong { field, .. } => field,
            ValidationError::TooMany { field, .. } => field,
            ValidationError::Invalid { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::TooMany { field, max, actual } => {
                write!(f, "{} has too many items ({}, max {})", field, actual, max)
            }
            ValidationError::Invalid { field, message } => write!(f, "{}: {}", field, message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for an original prompt, in characters.
pub const MAX_PROMPT_LENGTH: usize = 20_000;

/// Maximum number of tags on one entry.
pub const MAX_TAGS: usize = 50;

/// Maximum allowed length for a single tag, in characters.
pub const MAX_TAG_LENGTH: usize = 64;

/// Validate and trim an original prompt.
pub fn validate_original_prompt(prompt: &str) -> Result<String, ValidationError> {
    let prompt = prompt.trim();

    if prompt.is_empty() {
        return Err(ValidationError::Empty("original_prompt".to_string()));
    }

    let length = prompt.chars().count();
    if length > MAX_PROMPT_LENGTH {
        return Err(ValidationError::TooLong {
            field: "original_prompt".to_string(),
            max: MAX_PROMPT_LENGTH,
            actual: length,
        });
    }

    Ok(prompt.to_string())
}

/// Validate a tag list. Order is preserved and tags are trimmed.
pub fn validate_tags(tags: &[String]) -> Result<Vec<String>, ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::TooMany {
            field: "tags".to_string(),
            max: MAX_TAGS,
            actual: tags.len(),
        });
    }

    tags.iter()
        .map(|tag| {
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(ValidationError::invalid("tags", "tags cannot be empty"));
            }
            let length = tag.chars().count();
            if length > MAX_TAG_LENGTH {
                return Err(ValidationError::TooLong {
                    field: "tags".to_string(),
                    max: MAX_TAG_LENGTH,
                    actual: length,
                });
            }
            Ok(tag.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_original_prompt_trims() {
        assert_eq!(
            validate_original_prompt("  Write a haiku \n").unwrap(),
            "Write a haiku"
        );
    }

    #[test]
    fn test_validate_original_prompt_empty() {
        assert_eq!(
            validate_original_prompt("   \t"),
            Err(ValidationError::Empty("original_prompt".to_string()))
        );
    }

    #[test]
    fn test_validate_original_prompt_too_long() {
        let prompt = "a".repeat(MAX_PROMPT_LENGTH + 1);
        let err = validate_original_prompt(&prompt).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { .. }));
        assert_eq!(err.field(), "original_prompt");
    }

    #[test]
    fn test_validate_tags() {
        let tags = vec![" work ".to_string(), "ideas".to_string()];
        assert_eq!(validate_tags(&tags).unwrap(), vec!["work", "ideas"]);

        let tags = vec!["ok".to_string(), "  ".to_string()];
        assert_eq!(validate_tags(&tags).unwrap_err().field(), "tags");

        let tags = vec!["t".to_string(); MAX_TAGS + 1];
        assert!(matches!(
            validate_tags(&tags),
            Err(ValidationError::TooMany { .. })
        ));

        let tags = vec!["x".repeat(MAX_TAG_LENGTH + 1)];
        assert!(matches!(
            validate_tags(&tags),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_display() {
        let err = ValidationError::Empty("original_prompt".to_string());
        assert_eq!(err.to_string(), "original_prompt cannot be empty");
    }
}
