//! Link and unlink command implementations.

use anyhow::Result;
use beans_lib::{BeansError, LinkType};

use super::{open_store, print_warnings};
use crate::cli::LinkArgs;
use crate::config::CliOverrides;
use crate::format::Response;
use crate::validation::parse_link_type;

/// Execute the link command.
///
/// # Errors
///
/// Returns an error if the source bean does not exist, the link would
/// break a link rule (self-link, second parent, cycle), or the file cannot
/// be written. A missing target only produces a warning.
pub fn execute_link(args: &LinkArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let link_type = parse_link_type(&args.link_type)
        .map_err(|e| BeansError::from_validation_errors(vec![e]))?;
    let (_resolved, store) = open_store(overrides)?;

    let (record, warnings) = store
        .link(&args.id, link_type.clone(), &args.target)?
        .into_parts();
    print_warnings(&warnings);

    if json {
        Response::bean(record, "Link added")
            .with_warnings(&warnings)
            .print()?;
    } else {
        println!("{} {link_type} {}", record.id, args.target.trim());
    }
    Ok(())
}

/// Execute the unlink command. Removing a link that does not exist
/// succeeds without changes. Any type is accepted so custom links from
/// hand-edited files can be removed.
///
/// # Errors
///
/// Returns an error if the source bean does not exist or the file cannot be
/// written.
pub fn execute_unlink(args: &LinkArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let link_type: LinkType = args.link_type.parse()?;
    let (_resolved, store) = open_store(overrides)?;

    let record = store.unlink(&args.id, &link_type, &args.target)?;

    if json {
        Response::bean(record, "Link removed").print()?;
    } else {
        println!("Unlinked {} {link_type} {}", record.id, args.target.trim());
    }
    Ok(())
}
