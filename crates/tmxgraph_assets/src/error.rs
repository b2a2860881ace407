use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a raw document from disk.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse XML in {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: xml::reader::Error,
    },

    #[error("Failed to parse JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document {} has no root element", path.display())]
    EmptyDocument { path: PathBuf },

    #[error("JSON document {} is not an object", path.display())]
    NotAnObject { path: PathBuf },

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl AssetError {
    /// Whether this error means the referenced file does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            AssetError::NotFound { .. } => true,
            AssetError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
