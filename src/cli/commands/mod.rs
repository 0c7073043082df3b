//! Command implementations.
//!
//! Each command resolves configuration, opens the store, does its work and
//! prints either text or a JSON envelope.

pub mod archive;
pub mod create;
pub mod delete;
pub mod doctor;
pub mod init;
pub mod link;
pub mod list;
pub mod migrate;
pub mod show;
pub mod update;
pub mod version;
pub mod watch;

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use beans_lib::{BeansError, GraphStore, Warning};

use crate::config::{self, CliOverrides, ResolvedConfig};

/// Resolve configuration and load the store.
///
/// Load warnings are printed to stderr.
pub(crate) fn open_store(overrides: &CliOverrides) -> Result<(ResolvedConfig, GraphStore)> {
    let cwd = std::env::current_dir()?;
    let resolved = config::resolve(overrides, &cwd)?;

    if !resolved.beans_dir.is_dir() {
        return Err(BeansError::Config(format!(
            "no beans directory at {} (run `beans init`)",
            resolved.beans_dir.display()
        ))
        .into());
    }

    let (store, warnings) = GraphStore::open(&resolved.beans_dir)?.into_parts();
    print_warnings(&warnings);
    Ok((resolved, store))
}

pub(crate) fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

/// Body text from `--body` (or stdin for `-`) or `--body-file`.
pub(crate) fn read_body(body: Option<String>, body_file: Option<PathBuf>) -> Result<Option<String>> {
    match (body, body_file) {
        (Some(_), Some(_)) => bail!("cannot use both --body and --body-file"),
        (Some(body), None) if body == "-" => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(Some(text))
        }
        (Some(body), None) => Ok(Some(body)),
        (None, Some(path)) => Ok(Some(fs::read_to_string(path)?)),
        (None, None) => Ok(None),
    }
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
