//! Watch command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use beans_lib::{Synchronizer, WatchConfig};
use serde::Serialize;

use super::{open_store, print_warnings};
use crate::cli::WatchArgs;
use crate::config::CliOverrides;

#[derive(Debug, Serialize)]
struct ChangeLine {
    generation: u64,
    records: usize,
}

/// Execute the watch command: reload on every change to the beans
/// directory and print one line per reload until interrupted.
///
/// # Errors
///
/// Returns an error if the store cannot be opened.
pub fn execute(args: &WatchArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let (resolved, store) = open_store(overrides)?;
    let store = Arc::new(store);

    let config = WatchConfig {
        debounce: Duration::from_millis(args.debounce_ms),
        ..WatchConfig::default()
    };
    let mut sync = Synchronizer::with_config(Arc::clone(&store), config);
    let changes = sync.subscribe();

    let warnings = sync.start();
    if !warnings.is_empty() {
        print_warnings(&warnings);
        return Ok(());
    }

    if !json {
        println!(
            "Watching {} ({} beans), Ctrl-C to stop",
            resolved.beans_dir.display(),
            store.all().len()
        );
    }

    for change in changes {
        if json {
            let line = ChangeLine {
                generation: change.generation,
                records: change.records,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("Reloaded: {} beans", change.records);
        }
    }

    sync.stop();
    Ok(())
}
