//! # `tmxgraph_assets`
//!
//! Raw document layer for `tmxgraph`. Reads Tiled files (`.tmx`, `.tsx`, `.tx`, and their JSON
//! counterparts `.tmj`, `.tsj`, `.json`) into schema-agnostic [`RawNode`] trees.
//!
//! **This crate knows nothing about maps, tilesets or layers** - turning raw nodes into a typed
//! document graph is the job of `tmxgraph_core`.
//!
//! ## Architecture
//!
//! This is **Layer 1**:
//! - [`loaders`]: format detection, file reading (with case-insensitive lookup) and parsing
//! - [`raw`]: the raw node model shared by both encodings, including the overlay used when a
//!   remote reference is merged with its local overrides
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tmxgraph_assets::prelude::*;
//!
//! let node = load_raw_document(Path::new("maps/level1.tmx"), DocumentFormat::Xml, true)?;
//! assert_eq!(node.tag(), Some("map"));
//! # Ok::<(), AssetError>(())
//! ```

pub mod error;
pub mod loaders;
pub mod raw;

pub use error::AssetError;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::AssetError;
    pub use crate::loaders::{
        DocumentFormat, load_raw_document, parse_raw_document, files::resolve_relative_path,
    };
    pub use crate::raw::{RawNode, XmlElement};
}
