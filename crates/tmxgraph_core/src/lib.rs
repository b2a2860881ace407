//! # `tmxgraph_core`
//!
//! Declarative deserialization engine for Tiled documents. Turns the raw nodes produced by
//! `tmxgraph_assets` into a typed, linked [`Document`] graph: maps, tilesets, layers, objects,
//! tiles, properties and images.
//!
//! **This crate does NOT render anything or decode images** - image and font loading are
//! delegated to caller-supplied [`ResourceCallbacks`].
//!
//! ## Architecture
//!
//! Layer 2 (this crate) sits on top of:
//! - **Layer 1** (`tmxgraph_assets`): raw XML/JSON nodes, file lookup, reference overlay
//!
//! ## What Layer 2 Provides
//!
//! 1. **Field schemas**: each entity type declares its fields once, with an extraction rule
//!    (attribute, child, text, alias or computed) and independent XML/JSON key names
//! 2. **Type registry**: XML tag dispatch, JSON polymorphism and per-type specialization by
//!    a discriminant attribute (`class`/`type`)
//! 3. **Remote references**: `source="tiles.tsx"` loads the referenced file and overlays the
//!    referencing attributes on top of it
//! 4. **Tile index**: GID → (tileset, local id) lookup with flip flags stripped
//! 5. **Grid data** and **property bags** frozen after load
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tmxgraph_core::prelude::*;
//!
//! let document = Loader::default().load("maps/level1.tmx")?;
//! let map = MapView::root(&document).expect("root is a map");
//!
//! for layer in map.all_layers() {
//!     if let Some(LayerKind::Tiles(tiles)) = layer.kind() {
//!         for (x, y, tile) in tiles.iter_tiles()? {
//!             if !tile.is_empty() {
//!                 println!("{x},{y}: tile {} of {:?}", tile.id, tile.tileset);
//!             }
//!         }
//!     }
//! }
//! # Ok::<(), LoadError>(())
//! ```

pub mod config;
pub mod context;
pub mod document;
pub mod entities;
pub mod error;
pub mod grid;
pub mod loader;
pub mod properties;
pub mod registry;
pub mod schema;
pub mod tiles;
pub mod value;

pub mod prelude {
    //! Common imports for `tmxgraph_core` users.

    pub use crate::config::LoaderConfig;
    pub use crate::document::{Document, Entry, EntryId};
    pub use crate::entities::{
        AnimationFrame, ChunkView, GridView, GroupLayerView, ImageLayerView, ImageView,
        LayerDataView, LayerKind, LayerView, MapView, ObjectGroupView, ObjectShape, ObjectView,
        PropertyView, TextView, TileLayerView, TileView, TilesetView,
    };
    pub use crate::error::{LoadError, LoadResult};
    pub use crate::grid::GridData;
    pub use crate::loader::{FieldScope, Loader, NoCallbacks, ResourceCallbacks};
    pub use crate::properties::{Properties, PropertyBagBuilder, PropertyKind, PropertyValue};
    pub use crate::registry::{EntityRegistration, TypeRegistry};
    pub use crate::schema::{EntityType, FieldDescriptor};
    pub use crate::tiles::{FlipFlags, TileCollection, TileRef};
    pub use crate::value::{AssetHandle, Value};
}

// Re-export the main entry points at crate root for convenience
pub use config::LoaderConfig;
pub use document::{Document, EntryId};
pub use error::{LoadError, LoadResult};
pub use loader::{Loader, ResourceCallbacks};
pub use registry::TypeRegistry;
