//! File lookup and relative path resolution.

use std::fs;
use std::path::{Path, PathBuf};

use normalize_path::NormalizePath;

use crate::error::AssetError;

/// Resolve a path referenced from inside a Tiled file.
///
/// Tiled stores references (tilesets, images, templates) relative to the file that contains
/// them, e.g. `../tilesets/dungeon.tsx`. This function:
/// 1. Takes the parent directory of `current_file`
/// 2. Joins `reference` onto it (backslashes are treated as separators)
/// 3. Normalizes `.` and `..` components
///
/// An absolute `reference` replaces the parent directory entirely.
pub fn resolve_relative_path(current_file: &Path, reference: &str) -> PathBuf {
    let reference = reference.replace('\\', "/");
    let parent = current_file.parent().unwrap_or_else(|| Path::new(""));

    // Path::join does NOT normalize, it just concatenates
    parent.join(reference).normalize()
}

/// Read a whole file as UTF-8 text.
///
/// When `case_insensitive` is set and `path` does not exist as written, the parent directory
/// is scanned for a file whose name matches ignoring ASCII case. Maps authored on
/// case-insensitive file systems frequently reference `Tiles.TSX` as `tiles.tsx`.
pub fn read_to_string(path: &Path, case_insensitive: bool) -> Result<String, AssetError> {
    let resolved = if path.is_file() || !case_insensitive {
        path.to_path_buf()
    } else {
        find_case_insensitive(path)?
    };

    fs::read_to_string(&resolved).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            AssetError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            AssetError::Io {
                path: resolved.clone(),
                source,
            }
        }
    })
}

fn find_case_insensitive(path: &Path) -> Result<PathBuf, AssetError> {
    let not_found = || AssetError::NotFound {
        path: path.to_path_buf(),
    };

    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AssetError::InvalidPath(format!("No file name in path: {:?}", path)))?
        .to_lowercase();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let entries = fs::read_dir(dir).map_err(|_| not_found())?;
    for entry in entries.flatten() {
        let candidate = entry.file_name();
        if candidate.to_str().map(str::to_lowercase).as_deref() == Some(name.as_str()) {
            return Ok(dir.join(candidate));
        }
    }

    Err(not_found())
}
