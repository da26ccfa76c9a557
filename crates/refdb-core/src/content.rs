//! Content-path modifier trait definition

use std::path::Path;

use crate::error::ContentError;

/// Reads and rewrites the content-path references embedded in one resource format.
///
/// The database hands over file locations already resolved against the
/// project root; the returned and replaced strings are reference paths as
/// they are written inside the resource.
pub trait ContentPathModifier: Send + Sync {
    /// Every embedded reference in document order. Duplicates are kept.
    fn find_referenced_resources(&self, file: &Path) -> Result<Vec<String>, ContentError>;

    /// Replace every embedded reference equal to `old_path` with `new_path`
    /// and write the file back. Returns the number of replaced references.
    ///
    /// Implementations must leave the file untouched when they fail.
    fn update_content_paths(
        &self,
        new_path: &str,
        old_path: &str,
        file: &Path,
    ) -> Result<usize, ContentError>;
}
