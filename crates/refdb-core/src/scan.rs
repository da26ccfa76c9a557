//! Enumeration of resource files for the initial cold scan

use crate::config::RefDbConfig;
use crate::error::Result;
use crate::model::path_to_string;
use ignore::WalkBuilder;
use std::path::Path;

/// All resource files under the data directory, as paths relative to the
/// project root, sorted.
pub fn resource_files(config: &RefDbConfig) -> Result<Vec<String>> {
    let data_dir = config.data_dir_path();
    if !data_dir.is_dir() {
        return Ok(Vec::new());
    }
    let ignored = config.ignore_set()?;

    let mut files = Vec::new();
    for entry in WalkBuilder::new(&data_dir).standard_filters(false).build() {
        let entry = entry?;
        if !entry.file_type().map_or(false, |t| t.is_file()) {
            continue;
        }
        let Some(relative) = relative_to(&config.root, entry.path()) else {
            continue;
        };
        if !config.is_resource_file(Path::new(&relative)) || ignored.is_match(&relative) {
            tracing::trace!("Skipping {}", relative);
            continue;
        }
        files.push(relative);
    }
    files.sort();

    tracing::debug!("Found {} resource files in {}", files.len(), data_dir.display());
    Ok(files)
}

/// Express `path` relative to `root`. Returns `None` for paths outside the root.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(path_to_string)
}
