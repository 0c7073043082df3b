//! Delete command implementation.

use anyhow::Result;

use super::{confirm, open_store};
use crate::cli::DeleteArgs;
use crate::config::CliOverrides;
use crate::format::Response;

/// Execute the delete command.
///
/// Asks for confirmation unless `--force` or `--json` is given, listing the
/// beans that link to the one being deleted.
///
/// # Errors
///
/// Returns an error if the bean does not exist or a file operation fails.
pub fn execute(args: &DeleteArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let (_resolved, store) = open_store(overrides)?;
    let record = store.get(&args.id)?;
    let incoming = store.find_incoming(&record.id);

    if !args.force && !json {
        let prompt = if incoming.is_empty() {
            format!("Delete '{}' ({})?", record.title, record.path.display())
        } else {
            println!(
                "Warning: {} bean(s) link to '{}':",
                incoming.len(),
                record.title
            );
            for link in &incoming {
                let title = store
                    .get(&link.source)
                    .map(|source| source.title)
                    .unwrap_or_default();
                println!("  - {} ({title}) via {}", link.source, link.link_type);
            }
            "Delete anyway and remove references?".to_string()
        };
        if !confirm(&prompt)? {
            println!("Cancelled");
            return Ok(());
        }
    }

    let report = store.delete(&record.id)?;

    if json {
        Response::bean(report.record, "Bean deleted").print()?;
        return Ok(());
    }

    if report.removed_links > 0 {
        println!("Removed {} reference(s)", report.removed_links);
    }
    println!("Deleted {}", report.record.path.display());
    Ok(())
}
