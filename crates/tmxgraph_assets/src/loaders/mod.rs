use std::path::Path;

use tracing::debug;

use crate::error::AssetError;
use crate::raw::RawNode;

pub mod files;
pub mod element_tree;

/// The two encodings of a Tiled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// TMX/TSX/TX XML documents
    Xml,
    /// Tiled JSON documents (TMJ/TSJ/TJ)
    Json,
}

impl DocumentFormat {
    /// Detect the encoding from a file extension (case-insensitive).
    ///
    /// Returns `None` for extensions Tiled does not use.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "tmx" | "tsx" | "tx" | "xml" => Some(DocumentFormat::Xml),
            "json" | "tmj" | "tsj" | "tj" => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// Read and parse the document at `path`.
///
/// The encoding is taken from the file extension; `fallback` is used when the extension is
/// not one Tiled writes. With `case_insensitive` set, a file whose name only differs in letter
/// case from `path` is accepted.
pub fn load_raw_document(
    path: &Path,
    fallback: DocumentFormat,
    case_insensitive: bool,
) -> Result<RawNode, AssetError> {
    let format = DocumentFormat::from_path(path).unwrap_or(fallback);
    let contents = files::read_to_string(path, case_insensitive)?;
    debug!("Read {:?} document {}", format, path.display());
    parse_raw_document(&contents, format, path)
}

/// Parse document text that was already read from `path`.
///
/// `path` is only used for error reporting.
pub fn parse_raw_document(
    contents: &str,
    format: DocumentFormat,
    path: &Path,
) -> Result<RawNode, AssetError> {
    match format {
        DocumentFormat::Xml => {
            let root = element_tree::parse_element_tree(contents.as_bytes(), path)?;
            Ok(RawNode::Xml(root))
        }
        DocumentFormat::Json => {
            let value: serde_json::Value =
                serde_json::from_str(contents).map_err(|source| AssetError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            if !value.is_object() {
                return Err(AssetError::NotAnObject {
                    path: path.to_path_buf(),
                });
            }
            Ok(RawNode::Json(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("maps/a.TMX")),
            Some(DocumentFormat::Xml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("tiles.tsj")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_parse_json_requires_object() {
        let path = PathBuf::from("a.json");
        let result = parse_raw_document("[1, 2]", DocumentFormat::Json, &path);
        assert!(matches!(result, Err(AssetError::NotAnObject { .. })));

        let node = parse_raw_document(r#"{"width": 3}"#, DocumentFormat::Json, &path).unwrap();
        assert_eq!(node.scalar_text("width").as_deref(), Some("3"));
    }

    #[test]
    fn test_load_uses_fallback_for_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.dat");
        std::fs::write(&path, r#"<map width="2"/>"#).unwrap();

        let node = load_raw_document(&path, DocumentFormat::Xml, false).unwrap();
        assert_eq!(node.tag(), Some("map"));
    }
}
