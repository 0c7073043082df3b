//! `beans_rust` - file-based issue tracker
//!
//! This crate provides the `beans` CLI on top of [`beans_lib`], which owns
//! the markdown codec, the link graph and the in-memory store.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - `.beans.yml` loading and data directory resolution
//! - [`format`] - Output formatting (text, JSON)
//! - [`logging`] - tracing subscriber setup
//! - [`validation`] - Checks against the configured value sets

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod format;
pub mod logging;
pub mod validation;

pub use beans_lib::{BeansError, Result};

/// Run the CLI application.
///
/// # Errors
///
/// Returns an error if command execution fails.
pub fn run() -> anyhow::Result<()> {
    cli::run()
}
