//! Validation helpers for `beans`.
//!
//! The store accepts any status, type or priority string; these routines
//! check values against the configured sets before a command writes
//! anything.

use beans_lib::{BeansError, LinkType, Record, ValidationError};

use crate::config::Config;

const MAX_TITLE_LENGTH: usize = 500;
const MAX_TAG_LENGTH: usize = 50;

/// Validates bean fields against a [`Config`].
pub struct RecordValidator<'a> {
    config: &'a Config,
}

impl<'a> RecordValidator<'a> {
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Validate a bean and return all validation errors found.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate(&self, record: &Record) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(err) = validate_title(&record.title) {
            errors.push(err);
        }
        if let Err(err) = self.check_status(&record.status) {
            errors.push(err);
        }
        if !record.record_type.is_empty() {
            if let Err(err) = self.check_type(&record.record_type) {
                errors.push(err);
            }
        }
        if !record.priority.is_empty() {
            if let Err(err) = self.check_priority(&record.priority) {
                errors.push(err);
            }
        }
        for tag in &record.tags {
            if let Err(err) = TagValidator::validate(tag) {
                errors.push(err);
            }
        }

        if let (Some(created), Some(updated)) = (record.created_at, record.updated_at) {
            if updated < created {
                errors.push(ValidationError::new(
                    "updated_at",
                    "cannot be before created_at",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Like [`validate`](Self::validate), folded into a `BeansError`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` or `ValidationErrors`.
    pub fn check(&self, record: &Record) -> beans_lib::Result<()> {
        self.validate(record)
            .map_err(BeansError::from_validation_errors)
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` if the status is not configured.
    pub fn check_status(&self, status: &str) -> Result<(), ValidationError> {
        check_member("status", status, &self.config.statuses)
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` if the type is not configured.
    pub fn check_type(&self, record_type: &str) -> Result<(), ValidationError> {
        check_member("type", record_type, &self.config.types)
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` if the priority is not configured.
    pub fn check_priority(&self, priority: &str) -> Result<(), ValidationError> {
        check_member("priority", priority, &self.config.priorities)
    }
}

/// An empty allowed set accepts anything.
fn check_member(field: &str, value: &str, allowed: &[String]) -> Result<(), ValidationError> {
    if allowed.is_empty() || allowed.iter().any(|a| a == value) {
        return Ok(());
    }
    Err(ValidationError::new(
        field,
        format!("invalid {field}: {value} (must be one of: {})", allowed.join(", ")),
    ))
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("title", "cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::new("title", "exceeds 500 characters"));
    }
    Ok(())
}

/// Validates a single tag value.
pub struct TagValidator;

impl TagValidator {
    /// Validate a tag for length and allowed characters.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the tag is invalid.
    pub fn validate(tag: &str) -> Result<(), ValidationError> {
        if tag.is_empty() {
            return Err(ValidationError::new("tag", "cannot be empty"));
        }

        if tag.len() > MAX_TAG_LENGTH {
            return Err(ValidationError::new("tag", "exceeds 50 characters"));
        }

        if !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::new(
                "tag",
                "invalid characters (only alphanumeric, hyphen, underscore allowed)",
            ));
        }

        Ok(())
    }
}

/// Parse a link type given on the command line. Only the built-in types
/// are accepted; custom types found in files are still loaded.
///
/// # Errors
///
/// Returns a `ValidationError` for an empty or unknown type.
pub fn parse_link_type(value: &str) -> Result<LinkType, ValidationError> {
    let link_type: LinkType = value
        .parse()
        .map_err(|_| ValidationError::new("link_type", "cannot be empty"))?;
    if !link_type.is_known() {
        return Err(ValidationError::new(
            "link_type",
            format!(
                "unknown link type: {link_type} (must be {})",
                LinkType::KNOWN.join(", ")
            ),
        ));
    }
    Ok(link_type)
}

/// Parse a `type:id` link argument.
///
/// # Errors
///
/// Returns a `ValidationError` if either side is missing.
pub fn parse_link_spec(spec: &str) -> Result<(LinkType, String), ValidationError> {
    let invalid = || {
        ValidationError::new(
            "link",
            format!("invalid link format: {spec:?} (expected type:id)"),
        )
    };

    let (link_type, target) = spec.split_once(':').ok_or_else(invalid)?;
    let target = target.trim();
    if target.is_empty() {
        return Err(invalid());
    }
    if link_type.trim().is_empty() {
        return Err(invalid());
    }
    let link_type = parse_link_type(link_type)?;
    Ok((link_type, target.to_string()))
}
