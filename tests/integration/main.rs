//! Integration tests for refdb
//!
//! These tests drive the database, the XML content format and the watcher
//! service together against real files.

use refdb_content::ExtensionRouter;
use refdb_core::{
    EntryKind, NeverUnsaved, PersistFormat, RefDbConfig, ReferenceDatabase, ResourceEvent,
    UnsavedResources,
};
use refdb_watcher::ReferenceService;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

fn prefab(refs: &[&str]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root dataType=\"Class\">\n");
    for (i, r) in refs.iter().enumerate() {
        xml.push_str(&format!(
            "  <item{} dataType=\"Struct\">\n    <contentPath dataType=\"String\">{}</contentPath>\n  </item{}>\n",
            i, r, i
        ));
    }
    xml.push_str("</root>\n");
    xml
}

fn project(files: &[(&str, String)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = temp_dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    temp_dir
}

fn game_project() -> TempDir {
    project(&[
        (
            "Data/Scenes/Level.res",
            prefab(&["Data/Prefabs/Tree.res", "Data/Materials/Wood.res"]),
        ),
        ("Data/Prefabs/Tree.res", prefab(&["Data/Materials/Wood.res"])),
        ("Data/Materials/Wood.res", prefab(&["Data/Textures/Wood.res"])),
        ("Data/Textures/Wood.res", prefab(&[])),
        ("Data/readme.txt", "not a resource".to_string()),
    ])
}

fn open(root: &Path) -> ReferenceDatabase {
    let mut database = ReferenceDatabase::new(
        Box::new(ExtensionRouter::default()),
        Arc::new(NeverUnsaved),
        RefDbConfig::for_root(root),
    );
    database.initialize().unwrap();
    database
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

/// A cold scan indexes every resource and a second open loads the saved file
#[test]
fn test_scan_then_reload() {
    let temp_dir = game_project();
    let root = temp_dir.path();

    let database = open(root);
    assert_eq!(database.edge_count(), 4);
    assert!(root.join("ResourceDatabase.db").exists());

    // Not rescanned on reload: an edit without an event is invisible.
    fs::write(root.join("Data/Textures/Wood.res"), prefab(&["Data/Scenes/Level.res"])).unwrap();
    let reloaded = open(root);
    assert_eq!(reloaded.edges(), database.edges());

    assert_eq!(
        reloaded.dependents("Data/Materials/Wood.res", false),
        vec!["Data/Prefabs/Tree.res", "Data/Scenes/Level.res"]
    );
    assert_eq!(
        reloaded.dependents("Data/Textures/Wood.res", true),
        vec![
            "Data/Materials/Wood.res",
            "Data/Prefabs/Tree.res",
            "Data/Scenes/Level.res"
        ]
    );
}

/// Renaming a resource rewrites every referencing file on disk
#[test]
fn test_rename_rewrites_referencing_files() {
    let temp_dir = game_project();
    let root = temp_dir.path();
    let mut database = open(root);

    fs::rename(root.join("Data/Materials/Wood.res"), root.join("Data/Materials/Oak.res")).unwrap();
    let report = database
        .handle(&ResourceEvent::renamed("Data/Materials/Wood.res", "Data/Materials/Oak.res"))
        .unwrap()
        .unwrap();

    assert_eq!(report.rewritten, vec!["Data/Prefabs/Tree.res", "Data/Scenes/Level.res"]);
    assert!(report.skipped_unsaved.is_empty());
    assert_eq!(
        read(root, "Data/Scenes/Level.res"),
        prefab(&["Data/Prefabs/Tree.res", "Data/Materials/Oak.res"])
    );
    assert_eq!(read(root, "Data/Prefabs/Tree.res"), prefab(&["Data/Materials/Oak.res"]));
    assert_eq!(
        database
            .resource_references("Data/Materials/Oak.res")
            .unwrap()
            .references,
        vec!["Data/Textures/Wood.res"]
    );
    assert!(database.resource_references("Data/Materials/Wood.res").is_none());
}

/// Files with unsaved edits are not touched, but the edge set still moves
#[test]
fn test_rename_skips_unsaved_files() {
    let temp_dir = game_project();
    let root = temp_dir.path();
    let unsaved = Arc::new(UnsavedResources::new());
    let mut database = ReferenceDatabase::new(
        Box::new(ExtensionRouter::default()),
        unsaved.clone(),
        RefDbConfig::for_root(root),
    );
    database.initialize().unwrap();
    unsaved.mark_unsaved("Data/Prefabs/Tree.res");

    let before = read(root, "Data/Prefabs/Tree.res");
    let report = database
        .on_renamed("Data/Materials/Wood.res", "Data/Materials/Oak.res", EntryKind::Resource)
        .unwrap();

    assert_eq!(report.skipped_unsaved, vec!["Data/Prefabs/Tree.res"]);
    assert_eq!(read(root, "Data/Prefabs/Tree.res"), before);
    assert_eq!(
        database.referencing_resources("Data/Materials/Oak.res"),
        vec!["Data/Prefabs/Tree.res", "Data/Scenes/Level.res"]
    );
}

/// Renaming a directory moves every tracked resource inside it
#[test]
fn test_directory_rename() {
    let temp_dir = game_project();
    let root = temp_dir.path();
    let mut database = open(root);

    fs::rename(root.join("Data/Materials"), root.join("Data/Mats")).unwrap();
    database
        .handle(&ResourceEvent::Renamed {
            old_path: "Data/Materials".to_string(),
            new_path: "Data/Mats".to_string(),
            kind: EntryKind::Directory,
        })
        .unwrap();

    assert_eq!(read(root, "Data/Prefabs/Tree.res"), prefab(&["Data/Mats/Wood.res"]));
    assert_eq!(
        database.dependents("Data/Textures/Wood.res", false),
        vec!["Data/Mats/Wood.res"]
    );
}

/// Deleting drops edges in both directions and the state persists
#[test]
fn test_delete_and_save_binary() {
    let temp_dir = game_project();
    let root = temp_dir.path();
    let mut config = RefDbConfig::for_root(root);
    config.format = PersistFormat::Binary;
    let mut database = ReferenceDatabase::new(
        Box::new(ExtensionRouter::default()),
        Arc::new(NeverUnsaved),
        config.clone(),
    );
    database.initialize().unwrap();

    fs::remove_file(root.join("Data/Materials/Wood.res")).unwrap();
    database
        .handle(&ResourceEvent::deleted("Data/Materials/Wood.res"))
        .unwrap();
    database.save().unwrap();
    assert_eq!(database.edge_count(), 1);

    let mut reloaded =
        ReferenceDatabase::new(Box::new(ExtensionRouter::default()), Arc::new(NeverUnsaved), config);
    reloaded.initialize().unwrap();
    assert_eq!(
        reloaded.edges(),
        &[refdb_core::Edge::new("Data/Scenes/Level.res", "Data/Prefabs/Tree.res")]
    );
}

/// The watcher service picks up a resource moved into the data directory
#[tokio::test]
async fn test_watch_service_tracks_new_resource() {
    let temp_dir = game_project();
    let root = temp_dir.path().canonicalize().unwrap();
    let database = open(&root);
    let mut service = ReferenceService::new(database);
    let shared = service.database();
    service.start_watching().await.unwrap();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        service
            .process_events(async {
                let _ = stop_rx.await;
            })
            .await
    });

    fs::write(root.join("staged.res"), prefab(&["Data/Textures/Wood.res"])).unwrap();
    fs::rename(root.join("staged.res"), root.join("Data/Scenes/Forest.res")).unwrap();

    let mut found = false;
    for _ in 0..50 {
        sleep(Duration::from_millis(100)).await;
        if shared
            .lock()
            .await
            .referencing_resources("Data/Textures/Wood.res")
            .contains(&"Data/Scenes/Forest.res".to_string())
        {
            found = true;
            break;
        }
    }
    assert!(found, "watcher never reported the new resource");

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

/// The CLI reports references and dependents
#[test]
fn test_cli_refs_and_dependents() {
    let temp_dir = game_project();
    let root = temp_dir.path();
    let bin = env!("CARGO_BIN_EXE_refdb");

    let output = Command::new(bin)
        .args(["--root", root.to_str().unwrap(), "refs", "Data/Scenes/Level.res"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Data/Prefabs/Tree.res\nData/Materials/Wood.res\n"
    );

    let output = Command::new(bin)
        .args([
            "--root",
            root.to_str().unwrap(),
            "dependents",
            "Data/Textures/Wood.res",
            "--transitive",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Data/Materials/Wood.res\nData/Prefabs/Tree.res\nData/Scenes/Level.res\n"
    );

    let output = Command::new(bin)
        .args(["--root", root.to_str().unwrap(), "clear"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(!root.join("ResourceDatabase.db").exists());
}
