//! Persistence of the edge list

use crate::config::PersistFormat;
use crate::error::{RefDbError, Result};
use crate::model::Edge;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Snapshot layout version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_at: String,
    edges: Vec<Edge>,
}

/// Write `edges` to `path`, replacing it atomically.
pub fn write_edges(edges: &[Edge], path: &Path, format: PersistFormat) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        saved_at: chrono::Utc::now().to_rfc3339(),
        edges: edges.to_vec(),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        match format {
            PersistFormat::Json => serde_json::to_writer_pretty(&mut writer, &snapshot)?,
            PersistFormat::Binary => bincode::serialize_into(&mut writer, &snapshot)?,
        }
        writer.flush()?;
    }
    file.persist(path).map_err(|e| e.error)?;

    tracing::debug!("Saved {} edges to {}", edges.len(), path.display());
    Ok(())
}

/// Read an edge list written by [`write_edges`].
pub fn read_edges(path: &Path, format: PersistFormat) -> Result<Vec<Edge>> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    let snapshot: Snapshot = match format {
        PersistFormat::Json => serde_json::from_reader(reader)?,
        PersistFormat::Binary => bincode::deserialize_from(reader)?,
    };
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(RefDbError::UnsupportedVersion(snapshot.version));
    }

    tracing::debug!(
        "Loaded {} edges from {} (saved {})",
        snapshot.edges.len(),
        path.display(),
        snapshot.saved_at
    );
    Ok(snapshot.edges)
}

/// Delete the persisted database file, if present.
pub fn clear_database(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        std::fs::remove_file(path)?;
        return Ok(true);
    }
    Ok(false)
}
