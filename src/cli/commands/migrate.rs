//! Migrate command implementation.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use super::{open_store, print_warnings};
use crate::cli::MigrateArgs;
use crate::config::CliOverrides;

#[derive(Debug, Serialize)]
struct RenameView {
    id: String,
    from: PathBuf,
    to: PathBuf,
}

#[derive(Debug, Serialize)]
struct MigrateOutput {
    success: bool,
    dry_run: bool,
    count: usize,
    renames: Vec<RenameView>,
}

/// Execute the migrate command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or a rename fails.
pub fn execute(args: &MigrateArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let (_resolved, store) = open_store(overrides)?;
    let (renames, warnings) = store.migrate_filenames(args.dry_run)?.into_parts();
    print_warnings(&warnings);

    if json {
        let output = MigrateOutput {
            success: true,
            dry_run: args.dry_run,
            count: renames.len(),
            renames: renames
                .into_iter()
                .map(|r| RenameView {
                    id: r.id,
                    from: r.from,
                    to: r.to,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if renames.is_empty() {
        println!("No legacy filenames found.");
        return Ok(());
    }

    let verb = if args.dry_run { "Would rename" } else { "Renamed" };
    for rename in &renames {
        println!(
            "{verb} {} -> {}",
            rename.from.display(),
            rename.to.display()
        );
    }
    println!("\n{} file(s)", renames.len());
    Ok(())
}
