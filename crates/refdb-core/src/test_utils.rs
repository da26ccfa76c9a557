//! Test utilities for refdb

use crate::config::RefDbConfig;
use crate::content::ContentPathModifier;
use crate::database::ReferenceDatabase;
use crate::error::ContentError;
use crate::unsaved::UnsavedResources;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary project with the given files
pub fn create_project(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in structure {
        write_file(temp_dir.path(), path, content);
    }
    temp_dir
}

pub fn write_file(root: &Path, path: &str, content: &str) {
    let full_path = root.join(path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&full_path, content).unwrap();
}

/// Resource body referencing each of `targets`, one `@ref` line each
pub fn resource(targets: &[&str]) -> String {
    let mut body = String::from("resource\n");
    for target in targets {
        body.push_str("@ref ");
        body.push_str(target);
        body.push('\n');
    }
    body
}

/// Line-based content format: every `@ref <path>` line is a reference.
///
/// Records the files it rewrote and can be told to fail for chosen files.
#[derive(Clone, Default)]
pub struct LineModifier {
    pub rewrites: Arc<Mutex<Vec<PathBuf>>>,
    pub failing: Arc<Mutex<HashSet<PathBuf>>>,
}

impl LineModifier {
    pub fn rewritten(&self) -> Vec<PathBuf> {
        self.rewrites.lock().unwrap().clone()
    }

    pub fn fail_for(&self, file: PathBuf) {
        self.failing.lock().unwrap().insert(file);
    }
}

impl ContentPathModifier for LineModifier {
    fn find_referenced_resources(&self, file: &Path) -> Result<Vec<String>, ContentError> {
        let text = fs::read_to_string(file).map_err(|e| ContentError::io(file, e))?;
        if !text.starts_with("resource") {
            return Err(ContentError::malformed(file, "missing resource header"));
        }
        Ok(text
            .lines()
            .filter_map(|line| line.strip_prefix("@ref "))
            .map(|target| target.trim().to_string())
            .collect())
    }

    fn update_content_paths(
        &self,
        new_path: &str,
        old_path: &str,
        file: &Path,
    ) -> Result<usize, ContentError> {
        if self.failing.lock().unwrap().contains(file) {
            return Err(ContentError::io(
                file,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        let text = fs::read_to_string(file).map_err(|e| ContentError::io(file, e))?;
        let mut count = 0;
        let lines: Vec<String> = text
            .lines()
            .map(|line| match line.strip_prefix("@ref ") {
                Some(target) if target.trim() == old_path => {
                    count += 1;
                    format!("@ref {}", new_path)
                }
                _ => line.to_string(),
            })
            .collect();
        fs::write(file, lines.join("\n") + "\n").map_err(|e| ContentError::io(file, e))?;
        self.rewrites.lock().unwrap().push(file.to_path_buf());
        Ok(count)
    }
}

/// A database over `root` wired to a [`LineModifier`] and an unsaved set.
pub struct TestDb {
    pub db: ReferenceDatabase,
    pub modifier: LineModifier,
    pub unsaved: Arc<UnsavedResources>,
}

pub fn test_db(root: &Path) -> TestDb {
    test_db_with(RefDbConfig::for_root(root))
}

pub fn test_db_with(config: RefDbConfig) -> TestDb {
    let modifier = LineModifier::default();
    let unsaved = Arc::new(UnsavedResources::new());
    let db = ReferenceDatabase::new(Box::new(modifier.clone()), unsaved.clone(), config);
    TestDb { db, modifier, unsaved }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_modifier_round() {
        let temp_dir = create_project(&[("Data/a.res", &resource(&["Data/b.res", "Data/c.res"]))]);
        let file = temp_dir.path().join("Data/a.res");
        let modifier = LineModifier::default();

        assert_eq!(
            modifier.find_referenced_resources(&file).unwrap(),
            vec!["Data/b.res", "Data/c.res"]
        );
        assert_eq!(modifier.update_content_paths("Data/z.res", "Data/b.res", &file).unwrap(), 1);
        assert_eq!(
            modifier.find_referenced_resources(&file).unwrap(),
            vec!["Data/z.res", "Data/c.res"]
        );
    }
}
