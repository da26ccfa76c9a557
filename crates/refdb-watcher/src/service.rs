//! Serialized event dispatch for a shared reference database

use crate::watcher::FileWatcher;
use anyhow::Result;
use refdb_core::{ReferenceDatabase, RenameReport, ResourceEvent, UnsavedResources};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Handle for feeding events into a running service.
pub type EventSender = mpsc::UnboundedSender<ResourceEvent>;

/// Applies resource events to the database one at a time.
///
/// Filesystem events and editor notifications share one queue, so handlers
/// never interleave.
pub struct ReferenceService {
    database: Arc<Mutex<ReferenceDatabase>>,
    unsaved: Option<Arc<UnsavedResources>>,
    event_tx: EventSender,
    event_rx: mpsc::UnboundedReceiver<ResourceEvent>,
    watcher: Option<FileWatcher>,
}

impl ReferenceService {
    pub fn new(database: ReferenceDatabase) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            database: Arc::new(Mutex::new(database)),
            unsaved: None,
            event_tx,
            event_rx,
            watcher: None,
        }
    }

    /// Keep `unsaved` in step with handled events: saves clear the flag and
    /// renames move it.
    pub fn with_unsaved(mut self, unsaved: Arc<UnsavedResources>) -> Self {
        self.unsaved = Some(unsaved);
        self
    }

    pub fn database(&self) -> Arc<Mutex<ReferenceDatabase>> {
        self.database.clone()
    }

    pub fn sender(&self) -> EventSender {
        self.event_tx.clone()
    }

    /// Start forwarding filesystem events from the data directory.
    pub async fn start_watching(&mut self) -> Result<()> {
        let config = self.database.lock().await.config().clone();
        let watcher = FileWatcher::new(config, self.event_tx.clone())?;
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Handle one event under the database lock.
    pub async fn dispatch(&self, event: &ResourceEvent) -> refdb_core::Result<Option<RenameReport>> {
        let report = {
            let mut database = self.database.lock().await;
            database.handle(event)?
        };

        if let Some(unsaved) = &self.unsaved {
            match event {
                ResourceEvent::Saved { path, .. } => {
                    unsaved.mark_saved(path);
                }
                ResourceEvent::Renamed {
                    old_path,
                    new_path,
                    kind,
                } => unsaved.rename(old_path, new_path, *kind),
                _ => {}
            }
        }

        Ok(report)
    }

    /// Process queued events until `shutdown` resolves, then save.
    ///
    /// Events already queued when shutdown fires are still handled.
    pub async fn process_events(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        info!("Processing resource events");

        loop {
            let event = tokio::select! {
                biased;
                event = self.event_rx.recv() => event,
                _ = &mut shutdown => None,
            };
            let Some(event) = event else { break };

            debug!("Handling {:?}", event);
            match self.dispatch(&event).await {
                Ok(Some(report)) if !report.skipped_unsaved.is_empty() => {
                    info!(
                        "{}: {} unsaved referencing resources left for the editor",
                        event.path(),
                        report.skipped_unsaved.len()
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Failed to handle event for {}: {}", event.path(), e),
            }
        }

        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch() {
                warn!("Failed to stop watcher: {}", e);
            }
        }

        let database = self.database.lock().await;
        database.save()?;
        info!("Saved {} references", database.edge_count());
        Ok(())
    }
}
