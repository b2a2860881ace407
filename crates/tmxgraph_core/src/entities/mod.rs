//! Built-in Tiled entity types and typed views over them.
//!
//! Each submodule declares the schemas of a family of entities and the views that read their
//! populated fields back with concrete Rust types. Views borrow the [`Document`] and are
//! created with `View::new(&doc, id)`, which checks the entry's type.

/// Declares a view type over entries of one entity type (or its subtypes).
macro_rules! entity_view {
    ($(#[$meta:meta])* $view:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $view<'d> {
            doc: &'d $crate::document::Document,
            id: $crate::document::EntryId,
        }

        impl<'d> $view<'d> {
            /// View `id`, or `None` if the entry is not of the right type.
            pub fn new(
                doc: &'d $crate::document::Document,
                id: $crate::document::EntryId,
            ) -> Option<Self> {
                doc.is_a(id, $kind).then_some(Self { doc, id })
            }

            pub fn id(&self) -> $crate::document::EntryId {
                self.id
            }

            pub fn entry(&self) -> &'d $crate::document::Entry {
                self.doc.entry(self.id)
            }

            pub fn document(&self) -> &'d $crate::document::Document {
                self.doc
            }

            /// Frozen custom properties, when the entity declares any.
            pub fn properties(&self) -> Option<&'d $crate::properties::Properties> {
                $crate::entities::properties_of(self.doc, self.id)
            }
        }
    };
}

mod image;
mod layer;
mod map;
mod object;
mod property;
mod tileset;

pub use image::ImageView;
pub use layer::{
    ChunkView, GroupLayerView, ImageLayerView, LayerDataView, LayerKind, LayerView,
    ObjectGroupView, TileLayerView,
};
pub use map::MapView;
pub use object::{ObjectShape, ObjectView, TextView};
pub use property::{PropertyView, properties_of};
pub use tileset::{AnimationFrame, GridView, TileView, TilesetView};

use crate::document::{Document, EntryId};
use crate::registry::TypeRegistry;
use crate::schema::EntityType;

pub const MAP: &str = "Map";
pub const TILESET: &str = "Tileset";
pub const TILE: &str = "Tile";
pub const GRID: &str = "Grid";
pub const TILE_OFFSET: &str = "TileOffset";
pub const ANIMATION: &str = "Animation";
pub const FRAME: &str = "Frame";
pub const IMAGE: &str = "Image";
pub const PROPERTIES: &str = "Properties";
pub const PROPERTY: &str = "Property";
/// Abstract base of every layer type
pub const LAYER: &str = "Layer";
pub const TILE_LAYER: &str = "TileLayer";
pub const LAYER_DATA: &str = "LayerData";
pub const CHUNK: &str = "Chunk";
pub const IMAGE_LAYER: &str = "ImageLayer";
pub const OBJECT_GROUP: &str = "ObjectGroup";
pub const GROUP_LAYER: &str = "GroupLayer";
pub const OBJECT: &str = "Object";
pub const TEXT: &str = "Text";
pub const ELLIPSE: &str = "Ellipse";
pub const POINT: &str = "Point";
pub const POLYGON: &str = "Polygon";
pub const POLYLINE: &str = "Polyline";
pub const EDITOR_SETTINGS: &str = "EditorSettings";
pub const WANG_SETS: &str = "WangSets";
pub const TRANSFORMATIONS: &str = "Transformations";
pub const TERRAIN_TYPES: &str = "TerrainTypes";
pub const TEMPLATE: &str = "Template";
/// Field-less entry standing in for an unknown tag in lenient mode
pub const GENERIC: &str = "Generic";

pub(crate) fn register_builtins(registry: &mut TypeRegistry) {
    let layer = layer::layer_type();
    let builtins = [
        map::map_type(),
        tileset::tileset_type(),
        tileset::tile_type(),
        tileset::grid_type(),
        tileset::tile_offset_type(),
        tileset::animation_type(),
        tileset::frame_type(),
        image::image_type(),
        property::properties_type(),
        property::property_type(),
        layer::tile_layer_type(&layer),
        layer::layer_data_type(),
        layer::chunk_type(),
        layer::image_layer_type(&layer),
        layer::object_group_type(&layer),
        layer::group_layer_type(&layer),
        object::object_type(),
        object::text_type(),
        object::shape_type(ELLIPSE, "ellipse"),
        object::shape_type(POINT, "point"),
        object::polygon_type(POLYGON, "polygon"),
        object::polygon_type(POLYLINE, "polyline"),
        EntityType::new(EDITOR_SETTINGS).tag("editorsettings").opaque(),
        EntityType::new(WANG_SETS).tag("wangsets").opaque(),
        EntityType::new(TRANSFORMATIONS).tag("transformations").opaque(),
        EntityType::new(TERRAIN_TYPES).tag("terraintypes").opaque(),
        EntityType::new(TEMPLATE).tag("template").opaque(),
        EntityType::new(GENERIC).opaque(),
    ];

    registry.register(layer);
    for ty in builtins {
        registry.register(ty);
    }
}

/// Views over a list of entry ids, skipping entries of the wrong type.
fn views<'d, V>(
    doc: &'d Document,
    ids: impl IntoIterator<Item = EntryId>,
    make: fn(&'d Document, EntryId) -> Option<V>,
) -> Vec<V> {
    ids.into_iter().filter_map(|id| make(doc, id)).collect()
}

/// Clamp a stored integer into `u32`, treating negatives and missing values as `None`.
fn as_u32(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}
