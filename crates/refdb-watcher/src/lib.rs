//! refdb watcher: filesystem events in, serialized database updates out

pub mod service;
pub mod watcher;

pub use service::{EventSender, ReferenceService};
pub use watcher::{EventTranslator, FileWatcher};
