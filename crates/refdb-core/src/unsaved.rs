//! Tracking of resources with in-memory edits not yet flushed to disk

use crate::model::{is_path_located_in, relocate, EntryKind};
use dashmap::DashSet;

/// Answers whether a resource currently holds unsaved edits.
pub trait UnsavedTracker: Send + Sync {
    fn is_unsaved(&self, path: &str) -> bool;
}

/// Tracker for hosts without an editor: nothing is ever unsaved.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverUnsaved;

impl UnsavedTracker for NeverUnsaved {
    fn is_unsaved(&self, _path: &str) -> bool {
        false
    }
}

/// Set of unsaved resource paths. Thread-safe for concurrent access.
#[derive(Debug, Default)]
pub struct UnsavedResources {
    paths: DashSet<String>,
}

impl UnsavedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a resource as edited in memory.
    pub fn mark_unsaved(&self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    /// Clear the flag once the resource has been written to disk.
    pub fn mark_saved(&self, path: &str) -> bool {
        self.paths.remove(path).is_some()
    }

    /// Carry flags across a rename so a moved resource stays unsaved.
    pub fn rename(&self, old_path: &str, new_path: &str, kind: EntryKind) {
        match kind {
            EntryKind::Resource => {
                if self.paths.remove(old_path).is_some() {
                    self.paths.insert(new_path.to_string());
                }
            }
            EntryKind::Directory => {
                let moved: Vec<String> = self
                    .paths
                    .iter()
                    .filter(|p| is_path_located_in(p.key(), old_path))
                    .map(|p| p.key().clone())
                    .collect();
                for path in moved {
                    self.paths.remove(&path);
                    if let Some(relocated) = relocate(&path, old_path, new_path) {
                        self.paths.insert(relocated);
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl UnsavedTracker for UnsavedResources {
    fn is_unsaved(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}
