//! Output formatting for `beans`.
//!
//! Supports both human-readable text output and machine-parseable JSON.
//!
//! # JSON Output Types
//!
//! - [`Response`] - `{success, message, bean(s), count}` envelope
//! - [`ErrorResponse`] - `{success: false, error, code}` envelope
//! - [`BeanWithCounts`] - Bean with link counts (list)
//! - [`BeanDetails`] - Bean with incoming links (show)

mod output;
mod text;

pub use output::{BeanDetails, BeanWithCounts, ErrorResponse, Response, error_code};
pub use text::{
    format_priority, format_record_line, format_status_icon, format_type_badge, truncate,
};
