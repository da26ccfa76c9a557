//! Error types

use std::path::PathBuf;

use thiserror::Error;

/// Failures of a content-path modifier while reading or rewriting one resource file.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("cannot access resource {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed resource {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
    #[error("no content-path format registered for {}", path.display())]
    Unsupported { path: PathBuf },
}

impl ContentError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ContentError::Io { path: path.into(), source }
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ContentError::Malformed {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RefDbError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON snapshot error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary snapshot error: {0}")]
    Binary(#[from] bincode::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid configuration value for {key}: {value}")]
    ConfigValue { key: String, value: String },
    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("resource scan failed: {0}")]
    Scan(#[from] ignore::Error),
    #[error("unsupported database snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("resource {path} is not tracked")]
    Untracked { path: String },
}

pub type Result<T> = std::result::Result<T, RefDbError>;
