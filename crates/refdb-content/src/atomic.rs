//! Atomic file replacement

use refdb_core::ContentError;
use std::io::Write;
use std::path::Path;

/// Replace `file` with `bytes`: write a sibling temporary file, then rename it
/// over the original. On error the original is left as it was.
pub fn write_atomic(file: &Path, bytes: &[u8]) -> Result<(), ContentError> {
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ContentError::io(file, e))?;
    temp.write_all(bytes).map_err(|e| ContentError::io(file, e))?;
    temp.as_file().sync_all().map_err(|e| ContentError::io(file, e))?;
    temp.persist(file).map_err(|e| ContentError::io(file, e.error))?;
    Ok(())
}
