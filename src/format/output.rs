use beans_lib::{BeansError, ErrorKind, IncomingLink, Record};
use serde::Serialize;

/// Bean with link counts for list views.
#[derive(Debug, Clone, Serialize)]
pub struct BeanWithCounts {
    #[serde(flatten)]
    pub record: Record,
    pub link_count: usize,
    pub incoming_count: usize,
}

/// Bean with its incoming links for the show view.
#[derive(Debug, Clone, Serialize)]
pub struct BeanDetails {
    #[serde(flatten)]
    pub record: Record,
    pub incoming: Vec<IncomingLink>,
}

/// Success envelope printed with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct Response<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bean: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beans: Option<Vec<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T: Serialize> Response<T> {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            bean: None,
            beans: None,
            count: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn bean(bean: T, message: impl Into<String>) -> Self {
        Self {
            bean: Some(bean),
            ..Self::message(message)
        }
    }

    #[must_use]
    pub fn beans(beans: Vec<T>) -> Self {
        Self {
            success: true,
            message: None,
            bean: None,
            count: Some(beans.len()),
            beans: Some(beans),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: &[beans_lib::Warning]) -> Self {
        self.warnings = warnings.iter().map(ToString::to_string).collect();
        self
    }

    /// Print as pretty JSON on stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn print(&self) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Failure envelope printed with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl ErrorResponse {
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            code: error_code(err),
        }
    }

    /// Print as pretty JSON on stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn print(&self) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Machine-readable code for an error.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(beans_err) = err.downcast_ref::<BeansError>() {
        return match beans_err.kind() {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ValidationFailed => "VALIDATION_ERROR",
            ErrorKind::IoFailure => "FILE_ERROR",
        };
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return "FILE_ERROR";
    }
    "VALIDATION_ERROR"
}
