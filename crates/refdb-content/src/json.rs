//! JSON resources: references are string values under `contentPath` keys

use crate::atomic::write_atomic;
use refdb_core::{normalize_separators, ContentError, ContentPathModifier};
use serde_json::Value;
use std::path::Path;

pub const CONTENT_PATH_KEY: &str = "contentPath";

#[derive(Debug, Clone)]
pub struct JsonContentPathModifier {
    key: String,
}

impl Default for JsonContentPathModifier {
    fn default() -> Self {
        Self::new(CONTENT_PATH_KEY)
    }
}

impl JsonContentPathModifier {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn collect(&self, value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    match child {
                        Value::String(path) if key == &self.key && !path.is_empty() => {
                            out.push(normalize_separators(path));
                        }
                        _ => self.collect(child, out),
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.collect(item, out);
                }
            }
            _ => {}
        }
    }

    fn replace(&self, value: &mut Value, new_path: &str, old_path: &str) -> usize {
        match value {
            Value::Object(map) => map
                .iter_mut()
                .map(|(key, child)| match child {
                    Value::String(path)
                        if key == &self.key && normalize_separators(path) == old_path =>
                    {
                        *path = new_path.to_string();
                        1
                    }
                    _ => self.replace(child, new_path, old_path),
                })
                .sum(),
            Value::Array(items) => items
                .iter_mut()
                .map(|item| self.replace(item, new_path, old_path))
                .sum(),
            _ => 0,
        }
    }

    fn parse(file: &Path) -> Result<Value, ContentError> {
        let text = std::fs::read_to_string(file).map_err(|e| ContentError::io(file, e))?;
        serde_json::from_str(&text).map_err(|e| ContentError::malformed(file, e))
    }
}

impl ContentPathModifier for JsonContentPathModifier {
    fn find_referenced_resources(&self, file: &Path) -> Result<Vec<String>, ContentError> {
        let value = Self::parse(file)?;
        let mut references = Vec::new();
        self.collect(&value, &mut references);
        Ok(references)
    }

    fn update_content_paths(
        &self,
        new_path: &str,
        old_path: &str,
        file: &Path,
    ) -> Result<usize, ContentError> {
        let mut value = Self::parse(file)?;
        let count = self.replace(&mut value, new_path, &normalize_separators(old_path));
        if count > 0 {
            let text =
                serde_json::to_string_pretty(&value).map_err(|e| ContentError::malformed(file, e))?;
            write_atomic(file, text.as_bytes())?;
        }
        Ok(count)
    }
}
