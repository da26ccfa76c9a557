//! CLI command implementations

use refdb_content::ExtensionRouter;
use refdb_core::{clear_database, NeverUnsaved, RefDbConfig, ReferenceDatabase, UnsavedResources};
use refdb_watcher::ReferenceService;
use std::sync::Arc;

fn open(config: RefDbConfig) -> anyhow::Result<ReferenceDatabase> {
    let mut database = ReferenceDatabase::new(
        Box::new(ExtensionRouter::default()),
        Arc::new(NeverUnsaved),
        config,
    );
    database.initialize()?;
    Ok(database)
}

pub fn init(config: RefDbConfig) -> anyhow::Result<()> {
    let database = open(config)?;
    let sources = database
        .edges()
        .iter()
        .map(|edge| edge.source.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();
    println!(
        "{} references from {} resources ({})",
        database.edge_count(),
        sources,
        database.config().database_path().display()
    );
    Ok(())
}

pub fn refs(config: RefDbConfig, path: &str) -> anyhow::Result<()> {
    let database = open(config)?;
    match database.resource_references(path) {
        Some(refs) => {
            for target in refs.references {
                println!("{}", target);
            }
        }
        None => tracing::info!("{} references nothing", path),
    }
    Ok(())
}

pub fn dependents(config: RefDbConfig, path: &str, transitive: bool) -> anyhow::Result<()> {
    let database = open(config)?;
    for source in database.dependents(path, transitive) {
        println!("{}", source);
    }
    Ok(())
}

pub async fn watch(config: RefDbConfig) -> anyhow::Result<()> {
    let unsaved = Arc::new(UnsavedResources::new());
    let mut database = ReferenceDatabase::new(
        Box::new(ExtensionRouter::default()),
        unsaved.clone(),
        config,
    );
    database.initialize()?;
    tracing::info!("Loaded {} references", database.edge_count());

    let mut service = ReferenceService::new(database).with_unsaved(unsaved);
    service.start_watching().await?;
    service
        .process_events(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
}

pub fn rebuild(config: RefDbConfig) -> anyhow::Result<()> {
    let mut database = ReferenceDatabase::new(
        Box::new(ExtensionRouter::default()),
        Arc::new(NeverUnsaved),
        config,
    );
    database.rebuild()?;
    tracing::info!("Rebuilt {} references", database.edge_count());
    Ok(())
}

pub fn clear(config: RefDbConfig) -> anyhow::Result<()> {
    let path = config.database_path();
    if clear_database(&path)? {
        tracing::info!("Removed {}", path.display());
    } else {
        tracing::info!("Nothing to clear at {}", path.display());
    }
    Ok(())
}
