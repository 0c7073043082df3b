//! Create command implementation.

use std::collections::BTreeSet;

use anyhow::Result;
use beans_lib::{BeansError, LinkType, Record};

use super::{open_store, print_warnings, read_body};
use crate::cli::CreateArgs;
use crate::config::CliOverrides;
use crate::format::Response;
use crate::validation::{RecordValidator, TagValidator, parse_link_spec};

/// Execute the create command.
///
/// # Errors
///
/// Returns an error if validation fails, the store cannot be opened, or the
/// bean cannot be written.
pub fn execute(args: CreateArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    // 1. Resolve title
    let title = args
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| BeansError::validation("title", "cannot be empty"))?;

    // 2. Open store
    let (resolved, store) = open_store(overrides)?;
    let config = &resolved.config;

    // 3. Build draft with configured defaults
    let mut draft = Record::new("", title);
    draft.status = args
        .status
        .unwrap_or_else(|| config.beans.default_status.clone());
    draft.record_type = args
        .type_
        .unwrap_or_else(|| config.beans.default_type.clone());
    draft.priority = args.priority.unwrap_or_default();
    draft.body = read_body(args.body, args.body_file)?.unwrap_or_default();
    draft.tags = args
        .tags
        .iter()
        .map(|tag| tag.trim().to_string())
        .collect::<BTreeSet<_>>();
    if let Some(dir) = args.path {
        draft.path = dir;
    }

    for tag in &draft.tags {
        TagValidator::validate(tag).map_err(|e| BeansError::from_validation_errors(vec![e]))?;
    }
    if let Some(parent) = args.parent {
        draft.links.add(LinkType::Parent, parent);
    }
    for spec in &args.links {
        let (link_type, target) =
            parse_link_spec(spec).map_err(|e| BeansError::from_validation_errors(vec![e]))?;
        draft.links.add(link_type, target);
    }

    // 4. Validate against config
    RecordValidator::new(config).check(&draft)?;

    // 5. Create
    let (record, warnings) = store.create(draft, &config.id_generator())?.into_parts();
    print_warnings(&warnings);

    // 6. Output
    if json {
        Response::bean(record, "Bean created")
            .with_warnings(&warnings)
            .print()?;
    } else {
        println!("Created {}: {}", record.id, record.title);
        println!("  {}", record.path.display());
    }

    Ok(())
}
