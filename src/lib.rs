//! # `tmxgraph`
//!
//! Load [Tiled](https://www.mapeditor.org/) maps and tilesets, in either the XML (`.tmx`,
//! `.tsx`) or JSON (`.tmj`, `.tsj`) encoding, into one typed document graph.
//!
//! This crate re-exports the layered crates:
//! - [`assets`] (`tmxgraph_assets`): raw node parsing and file resolution
//! - [`core`] (`tmxgraph_core`): schemas, registry and the document loader
//!
//! ## Example
//!
//! ```rust,no_run
//! use tmxgraph::prelude::*;
//!
//! let document = Loader::default().load("maps/level1.tmx")?;
//! let map = MapView::root(&document).expect("root is a map");
//! for tileset in map.tilesets() {
//!     println!("{:?} starts at gid {}", tileset.name(), tileset.firstgid());
//! }
//! # Ok::<(), LoadError>(())
//! ```
//!
//! ## Custom entity types
//!
//! Types submitted with `inventory` are picked up by [`Loader::new`](core::Loader::new):
//!
//! ```rust,no_run
//! use tmxgraph::prelude::*;
//!
//! fn spawn_points(registry: &TypeRegistry) -> Option<EntityType> {
//!     let base = registry.get(tmxgraph::core::entities::OBJECT_GROUP)?;
//!     Some(
//!         EntityType::specialize(base, "SpawnPoints", "spawn")
//!             .field(FieldDescriptor::int("team").default(0)),
//!     )
//! }
//!
//! tmxgraph::inventory::submit! {
//!     EntityRegistration { build: spawn_points }
//! }
//!
//! assert!(TypeRegistry::build().get("SpawnPoints").is_some());
//! ```

pub use inventory;
pub use tmxgraph_assets as assets;
pub use tmxgraph_core as core;

pub mod prelude {
    //! Everything needed to load and read a document.

    pub use tmxgraph_assets::prelude::{AssetError, DocumentFormat, RawNode};
    pub use tmxgraph_core::prelude::*;
}
