//! Error and warning types for `beans-lib`.
//!
//! Hard failures abort the requested operation and surface as `BeansError`.
//! Non-fatal conditions are collected as `Warning`s and returned next to a
//! successful value inside an `Outcome`.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for beans-lib operations.
#[derive(Error, Debug)]
pub enum BeansError {
    // === Record Errors ===
    /// Record with the specified ID was not found.
    #[error("Bean not found: {id}")]
    NotFound { id: String },

    /// No free identifier could be generated.
    #[error("Could not generate a free ID after {attempts} attempts")]
    IdSpaceExhausted { attempts: usize },

    /// The ID alphabet has no symbols to draw from.
    #[error("ID alphabet is empty")]
    EmptyAlphabet,

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {errors:?}")]
    ValidationErrors { errors: Vec<ValidationError> },

    // === Link Errors ===
    /// A record may not link to itself.
    #[error("Bean cannot link to itself: {id}")]
    SelfLink { id: String },

    /// A record already has a parent.
    #[error("Bean {id} already has parent {existing}")]
    DuplicateParent { id: String, existing: String },

    /// Adding the link would close a cycle over a hierarchical link type.
    #[error("Cycle detected in {link_type} links: {}", path.join(" -> "))]
    LinkCycle { link_type: String, path: Vec<String> },

    // === Codec Errors ===
    /// The file content could not be split into header and body.
    #[error("Malformed bean file: {reason}")]
    Decode { reason: String },

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Configuration Errors ===
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watcher error.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Coarse classification of a `BeansError`, used by callers that only need
/// to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    IoFailure,
}

impl BeansError {
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::IdSpaceExhausted { .. }
            | Self::EmptyAlphabet
            | Self::Validation { .. }
            | Self::ValidationErrors { .. }
            | Self::SelfLink { .. }
            | Self::DuplicateParent { .. }
            | Self::LinkCycle { .. } => ErrorKind::ValidationFailed,
            Self::Decode { .. }
            | Self::Yaml(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Watch(_) => ErrorKind::IoFailure,
        }
    }
}

/// A single field validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// A non-fatal condition reported alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A link points at an id that is not in the store.
    DanglingLink {
        source: String,
        link_type: String,
        target: String,
    },
    /// A file was skipped during a scan.
    UnreadableFile { path: PathBuf, reason: String },
    /// Two files resolved to the same id; only `kept` was loaded.
    DuplicateId {
        id: String,
        path: PathBuf,
        kept: PathBuf,
    },
    /// The filesystem watcher could not be started.
    WatchUnavailable { reason: String },
    /// A legacy filename was left alone during migration.
    RenameSkipped {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingLink {
                source,
                link_type,
                target,
            } => write!(f, "{source} {link_type} {target}: target does not exist"),
            Self::UnreadableFile { path, reason } => {
                write!(f, "skipped {}: {reason}", path.display())
            }
            Self::DuplicateId { id, path, kept } => write!(
                f,
                "duplicate id {id} in {} (kept {})",
                path.display(),
                kept.display()
            ),
            Self::WatchUnavailable { reason } => {
                write!(f, "live updates unavailable: {reason}")
            }
            Self::RenameSkipped { from, to, reason } => write!(
                f,
                "not renaming {} to {}: {reason}",
                from.display(),
                to.display()
            ),
        }
    }
}

/// A successful value plus the warnings collected while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub const fn with_warnings(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (T, Vec<Warning>) {
        (self.value, self.warnings)
    }
}

/// Result type using `BeansError`.
pub type Result<T> = std::result::Result<T, BeansError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            BeansError::NotFound { id: "x".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BeansError::LinkCycle {
                link_type: "blocks".into(),
                path: vec!["a".into(), "b".into(), "a".into()],
            }
            .kind(),
            ErrorKind::ValidationFailed
        );
        let io = std::io::Error::other("disk");
        assert_eq!(BeansError::from(io).kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_id_generation_failures_are_validation() {
        assert_eq!(
            BeansError::IdSpaceExhausted { attempts: 3 }.kind(),
            ErrorKind::ValidationFailed
        );
        assert_eq!(BeansError::EmptyAlphabet.kind(), ErrorKind::ValidationFailed);
    }

    #[test]
    fn test_cycle_message_lists_path() {
        let err = BeansError::LinkCycle {
            link_type: "blocks".into(),
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Cycle detected in blocks links: a -> b -> a");
    }

    #[test]
    fn test_single_validation_error_collapses() {
        let err = BeansError::from_validation_errors(vec![ValidationError::new("title", "empty")]);
        assert!(matches!(err, BeansError::Validation { .. }));
    }

    #[test]
    fn test_outcome_map_keeps_warnings() {
        let outcome = Outcome::with_warnings(
            2,
            vec![Warning::WatchUnavailable {
                reason: "nope".into(),
            }],
        );
        let mapped = outcome.map(|n| n * 2);
        assert_eq!(mapped.value, 4);
        assert_eq!(mapped.warnings.len(), 1);
        assert!(!mapped.is_clean());
    }
}
