//! List command implementation.
//!
//! Primary discovery interface; JSON output carries `BeanWithCounts`.

use anyhow::Result;
use beans_lib::{ListFilters, SortField};

use super::open_store;
use crate::cli::ListArgs;
use crate::config::CliOverrides;
use crate::format::{BeanWithCounts, Response, format_record_line};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the sort key is
/// unknown.
pub fn execute(args: &ListArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let filters = build_filters(args)?;
    let (_resolved, store) = open_store(overrides)?;

    let snapshot = store.all();
    let beans: Vec<BeanWithCounts> = snapshot
        .list(&filters)
        .into_iter()
        .map(|record| BeanWithCounts {
            link_count: record.links.len(),
            incoming_count: snapshot.find_incoming(&record.id).len(),
            record,
        })
        .collect();

    if json {
        Response::beans(beans).print()?;
    } else if beans.is_empty() {
        println!("No beans found.");
    } else {
        for bean in &beans {
            println!("{}", format_record_line(&bean.record));
        }
        println!("\n{} bean(s)", beans.len());
    }

    Ok(())
}

/// Convert CLI args to store filters.
fn build_filters(args: &ListArgs) -> Result<ListFilters> {
    let sort = match &args.sort {
        Some(key) => key.parse::<SortField>()?,
        None => SortField::default(),
    };

    Ok(ListFilters {
        statuses: non_empty(&args.status),
        types: non_empty(&args.type_),
        priorities: non_empty(&args.priority),
        tags: non_empty(&args.tags),
        title_contains: args.title_contains.clone(),
        limit: args.limit,
        sort,
        reverse: args.reverse,
    })
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filters_empty_args_match_everything() {
        let filters = build_filters(&ListArgs::default()).unwrap();
        assert!(filters.statuses.is_none());
        assert!(filters.tags.is_none());
        assert_eq!(filters.sort, SortField::Id);
    }

    #[test]
    fn test_build_filters_rejects_unknown_sort() {
        let args = ListArgs {
            sort: Some("colour".to_string()),
            ..Default::default()
        };
        assert!(build_filters(&args).is_err());
    }

    #[test]
    fn test_build_filters_keeps_repeatable_values() {
        let args = ListArgs {
            status: vec!["open".to_string(), "in-progress".to_string()],
            sort: Some("updated".to_string()),
            reverse: true,
            ..Default::default()
        };
        let filters = build_filters(&args).unwrap();
        assert_eq!(filters.statuses.unwrap().len(), 2);
        assert_eq!(filters.sort, SortField::UpdatedAt);
        assert!(filters.reverse);
    }
}
