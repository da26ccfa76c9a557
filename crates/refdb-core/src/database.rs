//! The resource reference database
//!
//! Keeps the edge set in step with resource change events:
//!
//! - created: extracted references are added, duplicates ignored
//! - modified / saved: the resource's outbound edges are replaced wholesale
//! - deleted: every edge touching the resource is dropped
//! - renamed: referencing files are rewritten on disk (unless unsaved), then
//!   edges are retargeted and the resource's own edges rekeyed
//!
//! Events are expected one at a time. The database does no locking of its
//! own; a host delivering events from several threads must hold one lock
//! around each complete handler call.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{MissingPolicy, RefDbConfig};
use crate::content::ContentPathModifier;
use crate::error::{RefDbError, Result};
use crate::graph::ReferenceGraph;
use crate::model::{
    is_path_located_in, relocate, resolve, Edge, EntryKind, RenameReport, ResourceEvent,
    ResourceReferences,
};
use crate::persist;
use crate::scan;
use crate::unsaved::UnsavedTracker;

pub struct ReferenceDatabase {
    graph: ReferenceGraph,
    modifier: Box<dyn ContentPathModifier>,
    unsaved: Arc<dyn UnsavedTracker>,
    config: RefDbConfig,
}

impl std::fmt::Debug for ReferenceDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceDatabase")
            .field("graph", &self.graph)
            .field("root", &self.config.root)
            .finish()
    }
}

impl ReferenceDatabase {
    /// Create an empty database. Call [`initialize`](Self::initialize) to
    /// populate it from disk.
    pub fn new(
        modifier: Box<dyn ContentPathModifier>,
        unsaved: Arc<dyn UnsavedTracker>,
        config: RefDbConfig,
    ) -> Self {
        ReferenceDatabase {
            graph: ReferenceGraph::new(),
            modifier,
            unsaved,
            config,
        }
    }

    pub fn config(&self) -> &RefDbConfig {
        &self.config
    }

    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.len()
    }

    /// Populate the edge set.
    ///
    /// Loads the persisted snapshot when one exists; otherwise scans every
    /// resource file and persists the result. Does nothing when the data
    /// directory is missing.
    pub fn initialize(&mut self) -> Result<()> {
        let data_dir = self.config.data_dir_path();
        if !data_dir.is_dir() {
            debug!("Data directory {} not found, skipping initialization", data_dir.display());
            return Ok(());
        }

        let db_path = self.config.database_path();
        if db_path.exists() {
            let edges = persist::read_edges(&db_path, self.config.format)?;
            self.graph = ReferenceGraph::from_edges(edges);
            info!("Loaded {} references from {}", self.graph.len(), db_path.display());
            Ok(())
        } else {
            self.scan_and_save()
        }
    }

    /// Drop everything, rescan all resource files and persist.
    pub fn rebuild(&mut self) -> Result<()> {
        self.graph.clear();
        self.scan_and_save()
    }

    fn scan_and_save(&mut self) -> Result<()> {
        let files = scan::resource_files(&self.config)?;
        info!("Scanning {} resource files", files.len());
        for file in &files {
            self.on_created(file, false)?;
        }
        info!("Indexed {} references", self.graph.len());
        self.save()
    }

    /// Persist the current edge set to the configured database file.
    pub fn save(&self) -> Result<()> {
        let path = self.config.database_path();
        persist::write_edges(self.graph.edges(), &path, self.config.format)?;
        info!("Saved {} references to {}", self.graph.len(), path.display());
        Ok(())
    }

    /// Targets referenced by `path`, or `None` when it has no recorded references.
    pub fn resource_references(&self, path: &str) -> Option<ResourceReferences> {
        let references = self.graph.targets_of(path);
        if references.is_empty() {
            return None;
        }
        Some(ResourceReferences {
            path: path.to_string(),
            references,
        })
    }

    /// Resources that reference `path` directly.
    pub fn referencing_resources(&self, path: &str) -> Vec<String> {
        self.graph.sources_of(path)
    }

    /// Resources affected by a change to `path`, optionally following chains.
    pub fn dependents(&self, path: &str, transitive: bool) -> Vec<String> {
        self.graph.dependents(path, transitive)
    }

    /// Dispatch one change event. Renames return their report.
    pub fn handle(&mut self, event: &ResourceEvent) -> Result<Option<RenameReport>> {
        debug!("Handling {:?}", event);
        match event {
            ResourceEvent::Created { path, is_directory } => {
                self.on_created(path, *is_directory)?;
            }
            ResourceEvent::Modified { path, is_directory } => {
                self.on_modified(path, *is_directory)?;
            }
            ResourceEvent::Saved { path, is_directory } => {
                self.on_saved(path, *is_directory)?;
            }
            ResourceEvent::Deleted { path, is_directory } => {
                self.on_deleted(path, *is_directory)?;
            }
            ResourceEvent::Renamed { old_path, new_path, kind } => {
                return Ok(Some(self.on_renamed(old_path, new_path, *kind)?));
            }
        }
        Ok(None)
    }

    /// Add the references found in a new resource. Additive only, so
    /// duplicate notifications leave the edge set unchanged.
    pub fn on_created(&mut self, path: &str, is_directory: bool) -> Result<()> {
        if is_directory {
            return Ok(());
        }
        let targets = self.find_references(path)?;
        let added = targets
            .into_iter()
            .filter(|target| self.graph.insert(Edge::new(path, target.clone())))
            .count();
        debug!("{}: {} new references", path, added);
        Ok(())
    }

    /// Re-read a resource changed on disk and replace its outbound edges.
    pub fn on_modified(&mut self, path: &str, is_directory: bool) -> Result<()> {
        if is_directory {
            return Ok(());
        }
        self.update_references(path)
    }

    /// Same as [`on_modified`](Self::on_modified), for saves issued by the editor.
    pub fn on_saved(&mut self, path: &str, is_directory: bool) -> Result<()> {
        if is_directory {
            return Ok(());
        }
        self.update_references(path)
    }

    fn update_references(&mut self, path: &str) -> Result<()> {
        if self.config.missing_policy == MissingPolicy::Strict && !self.graph.has_source(path) {
            return Err(RefDbError::Untracked { path: path.to_string() });
        }
        // Extract first so a parse failure leaves the old edges in place.
        let targets = self.find_references(path)?;
        let removed = self.graph.remove_source(path);
        for target in targets {
            self.graph.insert(Edge::new(path, target));
        }
        debug!(
            "{}: replaced {} references with {}",
            path,
            removed,
            self.graph.targets_of(path).len()
        );
        Ok(())
    }

    /// Forget a resource as both source and target. Deleting a directory
    /// forgets every tracked resource inside it.
    pub fn on_deleted(&mut self, path: &str, is_directory: bool) -> Result<()> {
        let mut paths = vec![path.to_string()];
        if is_directory {
            paths.extend(self.graph.paths_within(path));
        }

        let mut removed = 0;
        for path in &paths {
            removed += self.graph.remove_source(path);
            removed += self.graph.remove_target(path);
        }

        if removed == 0 {
            if !is_directory && self.config.missing_policy == MissingPolicy::Strict {
                return Err(RefDbError::Untracked { path: path.to_string() });
            }
            debug!("{}: deleted but not tracked", path);
        } else {
            debug!("{}: removed {} references", path, removed);
        }
        Ok(())
    }

    /// Propagate a rename to referencing files and to the edge set.
    ///
    /// Rewrite failures are reported, not returned: the edge set is updated
    /// either way so it stays consistent with the rename.
    pub fn on_renamed(
        &mut self,
        old_path: &str,
        new_path: &str,
        kind: EntryKind,
    ) -> Result<RenameReport> {
        let mut report = RenameReport::default();
        if old_path == new_path {
            return Ok(report);
        }
        match kind {
            EntryKind::Resource => {
                self.rename_resource(old_path, new_path, (old_path, new_path, kind), &mut report);
            }
            EntryKind::Directory => {
                for leaf in self.graph.paths_within(old_path) {
                    let Some(new_leaf) = relocate(&leaf, old_path, new_path) else {
                        continue;
                    };
                    self.rename_resource(&leaf, &new_leaf, (old_path, new_path, kind), &mut report);
                }
            }
        }

        if !report.is_clean() {
            warn!(
                "Rename {} -> {}: {} referencing files could not be rewritten",
                old_path,
                new_path,
                report.failed.len()
            );
        }
        Ok(report)
    }

    fn rename_resource(
        &mut self,
        old_path: &str,
        new_path: &str,
        moved: (&str, &str, EntryKind),
        report: &mut RenameReport,
    ) {
        // The file now at `new_path` is the moved one; edges keyed there are stale.
        let stale = self.graph.remove_source(new_path);
        if stale > 0 {
            debug!("{}: dropped {} references of the overwritten resource", new_path, stale);
        }

        for source in self.graph.sources_of(old_path) {
            let moved_to = moved_location(&source, moved);
            let moved_from = moved_origin(&source, moved);
            let unsaved = [Some(source.as_str()), moved_to.as_deref(), moved_from.as_deref()]
                .into_iter()
                .flatten()
                .any(|p| self.unsaved.is_unsaved(p));
            if unsaved {
                debug!("{}: unsaved, leaving file as is", source);
                report.skipped_unsaved.push(source);
                continue;
            }
            let file = resolve(&self.config.root, moved_to.as_deref().unwrap_or(&source));
            match self.modifier.update_content_paths(new_path, old_path, &file) {
                Ok(count) => {
                    debug!("{}: rewrote {} content paths", source, count);
                    report.rewritten.push(source);
                }
                Err(e) => {
                    error!("Failed to rewrite {} after rename of {}: {}", source, old_path, e);
                    report.failed.push((source, e.to_string()));
                }
            }
        }

        let retargeted = self.graph.retarget(old_path, new_path);
        let rekeyed = self.graph.rekey_source(old_path, new_path);
        debug!(
            "{} -> {}: {} inbound, {} outbound references moved",
            old_path, new_path, retargeted, rekeyed
        );
    }

    fn find_references(&self, path: &str) -> Result<Vec<String>> {
        let file = resolve(&self.config.root, path);
        Ok(self.modifier.find_referenced_resources(&file)?)
    }
}

// A source that moved along with the rename lives at its new location.
fn moved_location(source: &str, (old, new, kind): (&str, &str, EntryKind)) -> Option<String> {
    match kind {
        EntryKind::Resource if source == old => Some(new.to_string()),
        EntryKind::Directory if is_path_located_in(source, old) => relocate(source, old, new),
        _ => None,
    }
}

// A source already rekeyed by an earlier leaf of the same directory rename
// is still flagged under its name before the rename.
fn moved_origin(source: &str, (old, new, kind): (&str, &str, EntryKind)) -> Option<String> {
    match kind {
        EntryKind::Directory if is_path_located_in(source, new) => relocate(source, new, old),
        _ => None,
    }
}
