//! Show command implementation.

use anyhow::Result;
use beans_lib::{BeansError, GraphStore, Record};

use super::open_store;
use crate::config::CliOverrides;
use crate::format::{BeanDetails, Response, format_status_icon, format_type_badge};

/// Execute the show command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or a bean is not found.
pub fn execute(ids: &[String], json: bool, overrides: &CliOverrides) -> Result<()> {
    if ids.is_empty() {
        return Err(BeansError::validation("ids", "no bean IDs provided").into());
    }

    let (_resolved, store) = open_store(overrides)?;

    let mut details = Vec::with_capacity(ids.len());
    for id in ids {
        let record = store.get(id)?;
        let incoming = store.find_incoming(id);
        details.push(BeanDetails { record, incoming });
    }

    if json {
        if details.len() == 1 {
            let bean = details.remove(0);
            Response::bean(bean, "Bean found").print()?;
        } else {
            Response::beans(details).print()?;
        }
        return Ok(());
    }

    for bean in &details {
        print_details(&store, bean);
        println!("----------------------------------------");
    }
    Ok(())
}

fn print_details(store: &GraphStore, bean: &BeanDetails) {
    let record = &bean.record;
    println!(
        "{} {} {}",
        format_status_icon(&record.status),
        record.id,
        record.title
    );
    println!("  status:   {}", record.status);
    if !record.record_type.is_empty() {
        println!("  type:     {}", format_type_badge(&record.record_type));
    }
    if !record.priority.is_empty() {
        println!("  priority: {}", record.priority);
    }
    if !record.tags.is_empty() {
        let tags: Vec<&str> = record.tags.iter().map(String::as_str).collect();
        println!("  tags:     {}", tags.join(", "));
    }
    println!("  path:     {}", record.path.display());
    if let Some(created) = record.created_at {
        println!("  created:  {}", created.format("%Y-%m-%d %H:%M"));
    }
    if let Some(updated) = record.updated_at {
        println!("  updated:  {}", updated.format("%Y-%m-%d %H:%M"));
    }

    if !record.links.is_empty() {
        println!("\nLinks:");
        for (link_type, target) in record.links.iter() {
            println!("  {link_type} -> {}", describe(store, target));
        }
    }
    if !bean.incoming.is_empty() {
        println!("\nLinked from:");
        for link in &bean.incoming {
            println!("  {} <- {}", link.link_type, describe(store, &link.source));
        }
    }

    if !record.body.is_empty() {
        println!("\n{}", record.body.trim_end());
    }
}

/// `id (title)`, or `id (missing)` for a dangling reference.
fn describe(store: &GraphStore, id: &str) -> String {
    store.get(id).map_or_else(
        |_| format!("{id} (missing)"),
        |Record { title, .. }| format!("{id} ({title})"),
    )
}
