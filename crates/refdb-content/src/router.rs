//! Per-extension dispatch to the right content-path format

use crate::json::JsonContentPathModifier;
use crate::xml::XmlContentPathModifier;
use refdb_core::{ContentError, ContentPathModifier};
use std::collections::HashMap;
use std::path::Path;

/// Routes each file to the modifier registered for its extension.
pub struct ExtensionRouter {
    routes: HashMap<String, Box<dyn ContentPathModifier>>,
}

impl ExtensionRouter {
    /// A router with no formats registered.
    pub fn empty() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register `modifier` for `extension` (case-insensitive, without dot).
    pub fn with(mut self, extension: &str, modifier: impl ContentPathModifier + 'static) -> Self {
        self.routes
            .insert(extension.to_ascii_lowercase(), Box::new(modifier));
        self
    }

    /// Get the modifier for a file based on its extension
    pub fn modifier_for(&self, path: &Path) -> Option<&dyn ContentPathModifier> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.routes.get(&ext).map(|m| m.as_ref())
    }

    fn route(&self, file: &Path) -> Result<&dyn ContentPathModifier, ContentError> {
        self.modifier_for(file).ok_or_else(|| ContentError::Unsupported {
            path: file.to_path_buf(),
        })
    }
}

impl Default for ExtensionRouter {
    /// `.res` and `.xml` as XML, `.json` as JSON.
    fn default() -> Self {
        Self::empty()
            .with("res", XmlContentPathModifier::default())
            .with("xml", XmlContentPathModifier::default())
            .with("json", JsonContentPathModifier::default())
    }
}

impl ContentPathModifier for ExtensionRouter {
    fn find_referenced_resources(&self, file: &Path) -> Result<Vec<String>, ContentError> {
        self.route(file)?.find_referenced_resources(file)
    }

    fn update_content_paths(
        &self,
        new_path: &str,
        old_path: &str,
        file: &Path,
    ) -> Result<usize, ContentError> {
        self.route(file)?.update_content_paths(new_path, old_path, file)
    }
}
