//! Database configuration
//!
//! Loaded from an optional `refdb.toml` in the project root. Every key has a
//! default, so an empty or missing file yields a working configuration.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{RefDbError, Result};

/// Default config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "refdb.toml";

/// Well-known name of the persisted edge list.
pub const DATABASE_FILE: &str = "ResourceDatabase.db";

/// On-disk encoding of the persisted edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistFormat {
    #[default]
    Json,
    Binary,
}

impl std::str::FromStr for PersistFormat {
    type Err = RefDbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(PersistFormat::Json),
            "binary" | "bincode" => Ok(PersistFormat::Binary),
            _ => Err(RefDbError::ConfigValue {
                key: "format".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// What to do when a delete or modify names a path the database does not track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Silently do nothing. Tolerates duplicate and out-of-order watcher events.
    #[default]
    Ignore,
    /// Fail with [`RefDbError::Untracked`].
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefDbConfig {
    /// Project root; resource paths and the database file are relative to it.
    #[serde(skip)]
    pub root: PathBuf,
    /// Resource data directory, relative to the root.
    pub data_dir: PathBuf,
    /// Persisted database file, relative to the root.
    pub database_file: PathBuf,
    pub format: PersistFormat,
    /// File extensions (without dot) treated as resources.
    pub resource_extensions: Vec<String>,
    /// Glob patterns, relative to the root, excluded from scans and watching.
    pub ignore: Vec<String>,
    pub missing_policy: MissingPolicy,
}

impl Default for RefDbConfig {
    fn default() -> Self {
        RefDbConfig {
            root: PathBuf::from("."),
            data_dir: PathBuf::from("Data"),
            database_file: PathBuf::from(DATABASE_FILE),
            format: PersistFormat::default(),
            resource_extensions: vec!["res".to_string()],
            ignore: Vec::new(),
            missing_policy: MissingPolicy::default(),
        }
    }
}

impl RefDbConfig {
    /// Defaults rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        RefDbConfig {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Load `config_file`, or `<root>/refdb.toml` when it exists, then apply
    /// `REFDB_*` environment overrides.
    pub fn load(root: &Path, config_file: Option<&Path>) -> Result<Self> {
        let path = match config_file {
            Some(path) => Some(path.to_path_buf()),
            None => Some(root.join(CONFIG_FILE)).filter(|p| p.exists()),
        };

        let mut config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                let text = std::fs::read_to_string(&path)?;
                Self::from_toml(&text)?
            }
            None => RefDbConfig::default(),
        };
        config.root = root.to_path_buf();
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("REFDB_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(file) = std::env::var("REFDB_DATABASE_FILE") {
            self.database_file = PathBuf::from(file);
        }
        if let Ok(format) = std::env::var("REFDB_FORMAT") {
            self.format = format.parse()?;
        }
        Ok(())
    }

    pub fn data_dir_path(&self) -> PathBuf {
        self.root.join(&self.data_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(&self.database_file)
    }

    /// Whether `path` has one of the configured resource extensions.
    pub fn is_resource_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| {
                self.resource_extensions
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(ext))
            })
    }

    /// Compile the `ignore` patterns.
    pub fn ignore_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = RefDbConfig::from_toml("").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("Data"));
        assert_eq!(config.database_file, PathBuf::from(DATABASE_FILE));
        assert_eq!(config.format, PersistFormat::Json);
        assert_eq!(config.missing_policy, MissingPolicy::Ignore);
    }

    #[test]
    fn test_parse_full_file() {
        let config = RefDbConfig::from_toml(
            r#"
data_dir = "Content"
format = "binary"
resource_extensions = ["res", "Prefab"]
ignore = ["Content/Temp/**"]
missing_policy = "strict"
"#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("Content"));
        assert_eq!(config.format, PersistFormat::Binary);
        assert_eq!(config.missing_policy, MissingPolicy::Strict);
        assert!(config.is_resource_file(Path::new("Content/a.prefab")));
        assert!(!config.is_resource_file(Path::new("Content/a.png")));

        let ignored = config.ignore_set().unwrap();
        assert!(ignored.is_match("Content/Temp/x.res"));
        assert!(!ignored.is_match("Content/x.res"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!("yaml".parse::<PersistFormat>().is_err());
        assert_eq!("Binary".parse::<PersistFormat>().unwrap(), PersistFormat::Binary);
    }
}
