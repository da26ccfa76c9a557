//! refdb core: resource reference graph, event handling and persistence

pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod graph;
pub mod model;
pub mod persist;
pub mod scan;
pub mod unsaved;


#[cfg(test)]
pub mod test_utils;

pub use config::{MissingPolicy, PersistFormat, RefDbConfig, CONFIG_FILE, DATABASE_FILE};
pub use content::ContentPathModifier;
pub use database::ReferenceDatabase;
pub use error::{ContentError, RefDbError, Result};
pub use graph::ReferenceGraph;
pub use model::{is_path_located_in, normalize_separators, relocate, Edge, EntryKind, RenameReport, ResourceEvent, ResourceReferences};
pub use persist::{clear_database, read_edges, write_edges};
pub use scan::{relative_to, resource_files};
pub use unsaved::{NeverUnsaved, UnsavedResources, UnsavedTracker};
