//! `beans` - file-based issue tracker.
//!
//! Beans are markdown files with YAML front matter; links between them form
//! a graph that is validated on every write.

use beans_rust::run;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
