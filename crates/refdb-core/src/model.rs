//! Core data structures for the reference database

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A recorded reference: the resource at `source` embeds a content path naming `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Query result for [`crate::ReferenceDatabase::resource_references`].
///
/// Returned by value; re-query after the database changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReferences {
    pub path: String,
    pub references: Vec<String>,
}

/// Whether a rename moved a single resource or a whole directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Resource,
    Directory,
}

/// Change notifications consumed by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// A file or directory appeared.
    Created { path: String, is_directory: bool },
    /// Changed on disk by something outside the editor.
    Modified { path: String, is_directory: bool },
    /// Explicitly saved from inside the editor.
    Saved { path: String, is_directory: bool },
    /// A file or directory was removed.
    Deleted { path: String, is_directory: bool },
    /// A file or directory moved from `old_path` to `new_path`.
    Renamed {
        old_path: String,
        new_path: String,
        kind: EntryKind,
    },
}

impl ResourceEvent {
    pub fn created(path: impl Into<String>) -> Self {
        ResourceEvent::Created { path: path.into(), is_directory: false }
    }

    pub fn modified(path: impl Into<String>) -> Self {
        ResourceEvent::Modified { path: path.into(), is_directory: false }
    }

    pub fn saved(path: impl Into<String>) -> Self {
        ResourceEvent::Saved { path: path.into(), is_directory: false }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        ResourceEvent::Deleted { path: path.into(), is_directory: false }
    }

    pub fn renamed(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        ResourceEvent::Renamed {
            old_path: old_path.into(),
            new_path: new_path.into(),
            kind: EntryKind::Resource,
        }
    }

    /// The path the event is about (the new path for renames).
    pub fn path(&self) -> &str {
        match self {
            ResourceEvent::Created { path, .. }
            | ResourceEvent::Modified { path, .. }
            | ResourceEvent::Saved { path, .. }
            | ResourceEvent::Deleted { path, .. } => path,
            ResourceEvent::Renamed { new_path, .. } => new_path,
        }
    }
}

/// Outcome of a rename for every resource that referenced the old path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenameReport {
    /// Sources whose on-disk file was rewritten.
    pub rewritten: Vec<String>,
    /// Sources left alone on disk because they hold unsaved edits.
    pub skipped_unsaved: Vec<String>,
    /// Sources whose rewrite failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl RenameReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Check whether `path` lies inside `dir` (component-wise, `dir` itself excluded).
pub fn is_path_located_in(path: &str, dir: &str) -> bool {
    let path = Path::new(path);
    let dir = Path::new(dir);
    path != dir && path.starts_with(dir)
}

/// Map `path` from under `old_dir` to the same place under `new_dir`.
pub fn relocate(path: &str, old_dir: &str, new_dir: &str) -> Option<String> {
    let rest = Path::new(path).strip_prefix(old_dir).ok()?;
    if rest.as_os_str().is_empty() {
        return Some(new_dir.to_string());
    }
    Some(path_to_string(&Path::new(new_dir).join(rest)))
}

pub(crate) fn path_to_string(path: &Path) -> String {
    normalize_separators(&path.to_string_lossy())
}

/// Resource paths use `/` on every platform; files written on Windows may
/// store `\` instead.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolve a resource path against the project root.
pub fn resolve(root: &Path, path: &str) -> PathBuf {
    root.join(path)
}
