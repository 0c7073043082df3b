//! `beans-lib` - In-process graph store for markdown-backed issues.
//!
//! Each bean is one markdown file with a YAML header. The store loads a
//! directory of them into memory, keeps a reverse-link index, enforces the
//! link rules (no self-links, one parent, no `parent`/`blocks` cycles) and
//! can follow changes on disk.
//!
//! # Quick Start
//!
//! ```no_run
//! use beans_lib::{GraphStore, IdGenerator, LinkType, Record};
//!
//! // Load existing directory
//! let store = GraphStore::open(".beans").unwrap().value;
//!
//! // Create
//! let task = store
//!     .create(Record::new("", "Write docs"), &IdGenerator::with_defaults())
//!     .unwrap()
//!     .value;
//!
//! // Link
//! let epic = store.create(Record::new("", "Launch"), &IdGenerator::with_defaults()).unwrap().value;
//! store.link(&task.id, LinkType::Parent, &epic.id).unwrap();
//!
//! // Reverse lookup
//! assert_eq!(store.find_incoming(&epic.id).len(), 1);
//! ```

pub mod codec;
pub mod error;
pub mod id;
pub mod links;
pub mod model;
pub mod query;
pub mod store;
pub mod watch;

pub use error::{BeansError, ErrorKind, Outcome, Result, ValidationError, Warning};
pub use id::{IdConfig, IdGenerator};
pub use links::{Cycle, LinkGraph};
pub use model::{IncomingLink, LinkType, Links, Record};
pub use query::{ListFilters, RecordUpdate, SortField};
pub use store::{DeleteReport, GraphStore, Rename, Snapshot};
pub use watch::{StoreChanged, Synchronizer, WatchConfig};
