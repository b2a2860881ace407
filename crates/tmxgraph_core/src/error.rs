use std::path::PathBuf;

use thiserror::Error;
use tmxgraph_assets::AssetError;

/// Errors raised while building a document or reading from a built one.
///
/// Any error raised during a load aborts the whole load; no partial document is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Missing required field '{field}' on {entity}")]
    MissingRequiredField {
        field: &'static str,
        entity: &'static str,
    },

    #[error("Field '{field}' on {entity} expects one child but {count} matched")]
    MultipleMatchesForSingleChild {
        field: &'static str,
        entity: &'static str,
        count: usize,
    },

    #[error("Field '{field}' on {entity} requires a {target} child but none was found")]
    NoMatchForRequiredChild {
        field: &'static str,
        entity: &'static str,
        target: &'static str,
    },

    #[error("Field '{field}' on {entity}: node matches several types {candidates:?}")]
    AmbiguousPolymorphicType {
        field: &'static str,
        entity: &'static str,
        candidates: Vec<&'static str>,
    },

    #[error("Field '{field}' on {entity}: no type matches discriminant {discriminant:?}")]
    NoMatchingPolymorphicType {
        field: &'static str,
        entity: &'static str,
        discriminant: Option<String>,
    },

    #[error("Unknown tag <{tag}> in {}", path.display())]
    UnknownTag { tag: String, path: PathBuf },

    #[error("Property bag is frozen, cannot modify '{key}'")]
    FrozenMutation { key: String },

    #[error("Property bag must be frozen before it can be hashed or compared")]
    UnhashedPropertyBag,

    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Property '{name}' has unrecognized type '{kind}'")]
    InvalidPropertyType { name: String, kind: String },

    #[error("Could not resolve source '{reference}' ({})", path.display())]
    UnresolvedSource { reference: String, path: PathBuf },

    #[error("Cyclic source reference '{reference}' ({})", path.display())]
    CyclicReference { reference: String, path: PathBuf },

    #[error("Invalid value {value:?} for field '{field}' on {entity}: expected {expected}")]
    InvalidValue {
        field: &'static str,
        entity: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Entity type '{0}' is not registered")]
    UnknownEntityType(String),

    #[error("Unsupported layer data encoding '{encoding}' (only csv is supported)")]
    UnsupportedEncoding { encoding: String },

    #[error("Grid index must have exactly 2 coordinates, got {0}")]
    MalformedGridIndex(usize),

    #[error("Grid dimensions are not known yet")]
    UnsizedGrid,

    #[error("Grid of {width}x{height} does not match its payload of {cells} cells")]
    GridSizeMismatch { width: u32, height: u32, cells: usize },

    #[error(transparent)]
    Asset(#[from] AssetError),
}

pub type LoadResult<T> = Result<T, LoadError>;
