//! Update command implementation.

use anyhow::Result;
use beans_lib::{BeansError, RecordUpdate, ValidationError};

use super::{open_store, read_body};
use crate::cli::UpdateArgs;
use crate::config::CliOverrides;
use crate::format::Response;
use crate::validation::{RecordValidator, TagValidator};

/// Execute the update command.
///
/// # Errors
///
/// Returns an error if no change is given, a value is not allowed by the
/// config, the bean does not exist, or the file cannot be written.
pub fn execute(args: UpdateArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let (resolved, store) = open_store(overrides)?;
    let validator = RecordValidator::new(&resolved.config);

    let update = RecordUpdate {
        title: args.title,
        status: args.status,
        record_type: args.type_,
        priority: args.priority,
        body: read_body(args.body, args.body_file)?,
        add_tags: args.add_tag,
        remove_tags: args.remove_tag,
    };

    if update.is_empty() {
        return Err(BeansError::validation("update", "no changes specified").into());
    }

    let mut errors: Vec<ValidationError> = Vec::new();
    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            errors.push(ValidationError::new("title", "cannot be empty"));
        }
    }
    if let Some(status) = &update.status {
        errors.extend(validator.check_status(status).err());
    }
    if let Some(record_type) = &update.record_type {
        errors.extend(validator.check_type(record_type).err());
    }
    if let Some(priority) = &update.priority {
        errors.extend(validator.check_priority(priority).err());
    }
    for tag in &update.add_tags {
        errors.extend(TagValidator::validate(tag).err());
    }
    if !errors.is_empty() {
        return Err(BeansError::from_validation_errors(errors).into());
    }

    let record = store.update(&args.id, &update)?;

    if json {
        Response::bean(record, "Bean updated").print()?;
    } else {
        println!("Updated {}: {}", record.id, record.title);
    }
    Ok(())
}
