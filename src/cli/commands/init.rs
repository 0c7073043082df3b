//! Init command implementation.

use std::fs;
use std::path::Path;

use anyhow::Result;
use beans_lib::Record;

use crate::cli::InitArgs;
use crate::config::{self, CONFIG_FILE_NAME, CliOverrides, Config};
use crate::format::Response;

/// Execute the init command.
///
/// Creates the beans directory and, when no config file is found, writes
/// a default `.beans.yml` in the working directory.
///
/// # Errors
///
/// Returns an error if the directory or config file cannot be created.
pub fn execute(args: &InitArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let resolved = config::resolve(overrides, &cwd)?;

    fs::create_dir_all(&resolved.beans_dir)?;

    if resolved.config_file.is_none() {
        let prefix = args
            .prefix
            .clone()
            .unwrap_or_else(|| default_prefix(&cwd));
        let mut config = Config::with_prefix(prefix);
        config.beans.path = resolved
            .beans_dir
            .strip_prefix(&cwd)
            .unwrap_or(&resolved.beans_dir)
            .to_string_lossy()
            .into_owned();
        let path = cwd.join(CONFIG_FILE_NAME);
        config.save(&path)?;
        tracing::info!(path = %path.display(), "Wrote config");
    }

    let message = format!("Initialized beans directory at {}", resolved.beans_dir.display());
    if json {
        Response::<Record>::message(message).print()?;
    } else {
        println!("{message}");
    }
    Ok(())
}

/// Directory name as an ID prefix, e.g. `my-app-`.
fn default_prefix(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|name| beans_lib::id::slugify(&name.to_string_lossy()))
        .unwrap_or_default();
    if name.is_empty() {
        String::new()
    } else {
        format!("{name}-")
    }
}
