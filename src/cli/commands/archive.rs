//! Archive command implementation.

use anyhow::Result;
use beans_lib::{BeansError, Record};

use super::{confirm, open_store};
use crate::cli::ArchiveArgs;
use crate::config::CliOverrides;
use crate::format::Response;
use crate::validation::RecordValidator;

/// Execute the archive command: delete every bean with the given status.
///
/// # Errors
///
/// Returns an error if the status is not configured or a deletion fails.
pub fn execute(args: &ArchiveArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let (resolved, store) = open_store(overrides)?;
    RecordValidator::new(&resolved.config)
        .check_status(&args.status)
        .map_err(|e| BeansError::from_validation_errors(vec![e]))?;

    let matching = store
        .all()
        .iter()
        .filter(|record| record.status == args.status)
        .count();

    if matching == 0 {
        let message = format!("No beans with status '{}'", args.status);
        if json {
            Response::<Record>::message(message).print()?;
        } else {
            println!("{message}");
        }
        return Ok(());
    }

    if !args.force && !json {
        let prompt = format!("Delete {matching} bean(s) with status '{}'?", args.status);
        if !confirm(&prompt)? {
            println!("Cancelled");
            return Ok(());
        }
    }

    let reports = store.delete_where(|record| record.status == args.status)?;
    let removed: Vec<Record> = reports.into_iter().map(|report| report.record).collect();

    if json {
        let mut response = Response::beans(removed);
        response.message = Some("Beans archived".to_string());
        response.print()?;
    } else {
        for record in &removed {
            println!("Deleted {}", record.path.display());
        }
        println!("\nArchived {} bean(s)", removed.len());
    }
    Ok(())
}
