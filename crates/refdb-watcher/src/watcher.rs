//! Filesystem watcher implementation

use anyhow::Result;
use globset::GlobSet;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use refdb_core::{relative_to, EntryKind, RefDbConfig, ResourceEvent};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Turns raw notify events into resource events with root-relative paths.
pub struct EventTranslator {
    root: PathBuf,
    config: RefDbConfig,
    ignored: GlobSet,
    database_file: PathBuf,
    /// Source half of a rename reported as two separate events.
    pending_from: Option<PathBuf>,
}

impl EventTranslator {
    pub fn new(config: RefDbConfig) -> Result<Self> {
        let root = std::fs::canonicalize(&config.root).unwrap_or_else(|_| config.root.clone());
        let ignored = config.ignore_set()?;
        let database_file = config.database_file.clone();
        Ok(Self {
            root,
            config,
            ignored,
            database_file,
            pending_from: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Translate one notify event. May yield nothing, one event, or (when a
    /// dangling rename source is flushed) two.
    pub fn translate(&mut self, event: notify::Event) -> Vec<ResourceEvent> {
        let mut out = Vec::new();

        let is_rename_to = matches!(event.kind, EventKind::Modify(ModifyKind::Name(RenameMode::To)));
        if !is_rename_to {
            // A rename source with no matching target moved out of the tree.
            if let Some(from) = self.pending_from.take() {
                out.extend(self.deleted(&from, None));
            }
        }

        match event.kind {
            EventKind::Create(kind) => {
                for path in &event.paths {
                    let is_directory = match kind {
                        CreateKind::Folder => true,
                        CreateKind::File => false,
                        _ => path.is_dir(),
                    };
                    out.extend(self.entry(path, is_directory, |path, is_directory| {
                        ResourceEvent::Created { path, is_directory }
                    }));
                }
            }
            EventKind::Modify(ModifyKind::Name(mode)) => self.rename(mode, &event.paths, &mut out),
            EventKind::Modify(ModifyKind::Metadata(_)) => {}
            EventKind::Modify(_) => {
                for path in &event.paths {
                    out.extend(self.entry(path, path.is_dir(), |path, is_directory| {
                        ResourceEvent::Modified { path, is_directory }
                    }));
                }
            }
            EventKind::Remove(kind) => {
                for path in &event.paths {
                    out.extend(self.deleted(path, Some(kind)));
                }
            }
            _ => {}
        }

        out
    }

    fn rename(&mut self, mode: RenameMode, paths: &[PathBuf], out: &mut Vec<ResourceEvent>) {
        match (mode, paths) {
            (RenameMode::Both, [from, to, ..]) => out.extend(self.renamed(from, to)),
            (RenameMode::From, [from, ..]) => self.pending_from = Some(from.clone()),
            (RenameMode::To, [to, ..]) => match self.pending_from.take() {
                Some(from) => out.extend(self.renamed(&from, to)),
                None => out.extend(self.entry(to, to.is_dir(), |path, is_directory| {
                    ResourceEvent::Created { path, is_directory }
                })),
            },
            // Platforms that cannot pair renames report each side alone.
            (_, paths) => {
                for path in paths {
                    if path.exists() {
                        out.extend(self.entry(path, path.is_dir(), |path, is_directory| {
                            ResourceEvent::Created { path, is_directory }
                        }));
                    } else {
                        out.extend(self.deleted(path, None));
                    }
                }
            }
        }
    }

    fn renamed(&self, from: &Path, to: &Path) -> Option<ResourceEvent> {
        let is_directory = to.is_dir();
        let old_path = self.relative(from);
        let new_path = self.relative(to);

        match (old_path, new_path) {
            (Some(old_path), Some(new_path)) if is_directory => Some(ResourceEvent::Renamed {
                old_path,
                new_path,
                kind: EntryKind::Directory,
            }),
            (Some(old_path), Some(new_path)) => {
                let was_resource = self.config.is_resource_file(from);
                let is_resource = self.config.is_resource_file(to);
                match (was_resource, is_resource) {
                    (true, true) => Some(ResourceEvent::Renamed {
                        old_path,
                        new_path,
                        kind: EntryKind::Resource,
                    }),
                    (true, false) => Some(ResourceEvent::deleted(old_path)),
                    (false, true) => Some(ResourceEvent::created(new_path)),
                    (false, false) => None,
                }
            }
            // Moved into the tree from outside, or out of it.
            (None, Some(_)) => self.entry(to, is_directory, |path, is_directory| {
                ResourceEvent::Created { path, is_directory }
            }),
            (Some(_), None) => self.deleted(from, None),
            (None, None) => None,
        }
    }

    fn deleted(&self, path: &Path, kind: Option<RemoveKind>) -> Option<ResourceEvent> {
        // The path is gone, so the kind can only be guessed for Any/Other.
        let is_directory = match kind {
            Some(RemoveKind::Folder) => true,
            Some(RemoveKind::File) => false,
            _ => !self.config.is_resource_file(path),
        };
        self.entry(path, is_directory, |path, is_directory| ResourceEvent::Deleted {
            path,
            is_directory,
        })
    }

    fn entry(
        &self,
        path: &Path,
        is_directory: bool,
        make: impl FnOnce(String, bool) -> ResourceEvent,
    ) -> Option<ResourceEvent> {
        let relative = self.relative(path)?;
        if !is_directory && !self.config.is_resource_file(path) {
            return None;
        }
        Some(make(relative, is_directory))
    }

    /// Root-relative path, or `None` for paths that should not reach the database.
    fn relative(&self, path: &Path) -> Option<String> {
        let relative = relative_to(&self.root, path)?;
        if should_ignore_path(Path::new(&relative))
            || Path::new(&relative) == self.database_file
            || self.ignored.is_match(&relative)
        {
            return None;
        }
        Some(relative)
    }
}

/// File system watcher for the resource data directory
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    watched_path: PathBuf,
}

impl FileWatcher {
    /// Watch the configured data directory recursively, sending translated
    /// events to `event_tx`.
    pub fn new(config: RefDbConfig, event_tx: mpsc::UnboundedSender<ResourceEvent>) -> Result<Self> {
        let mut translator = EventTranslator::new(config)?;
        let watched_path = translator.root().join(&translator.config.data_dir);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            match res {
                Ok(event) => {
                    debug!("File system event: {:?}", event);
                    for resource_event in translator.translate(event) {
                        if let Err(e) = event_tx.send(resource_event) {
                            warn!("Failed to forward resource event: {}", e);
                        }
                    }
                }
                Err(e) => {
                    error!("File system watch error: {}", e);
                }
            }
        })?;

        watcher.watch(&watched_path, RecursiveMode::Recursive)?;
        info!("Watching directory: {:?}", watched_path);

        Ok(Self { watcher, watched_path })
    }

    /// Stop watching.
    pub fn unwatch(&mut self) -> Result<()> {
        info!("Stopping watch for: {:?}", self.watched_path);
        self.watcher.unwatch(&self.watched_path)?;
        Ok(())
    }
}

/// Check if a path should be ignored (e.g., target/, .git/, etc.)
fn should_ignore_path(path: &Path) -> bool {
    path.components().any(|component| {
        matches!(
            component.as_os_str().to_str(),
            Some("target") | Some(".git") | Some(".svn")
        )
    })
}
