use tmxgraph_assets::prelude::RawNode;

use super::image::ImageView;
use super::{
    CHUNK, GROUP_LAYER, IMAGE, IMAGE_LAYER, LAYER, LAYER_DATA, MAP, MapView, OBJECT,
    OBJECT_GROUP, ObjectView, PROPERTIES, TILE_LAYER, as_u32, views,
};
use crate::document::{Document, EntryId};
use crate::error::{LoadError, LoadResult};
use crate::grid::GridData;
use crate::loader::FieldScope;
use crate::schema::{EntityType, FieldDescriptor, PARENT};
use crate::tiles::{TileCollection, TileRef};
use crate::value::Value;

/// Fields shared by every layer type. Never built directly.
pub(super) fn layer_type() -> EntityType {
    EntityType::new(LAYER).fields([
        FieldDescriptor::int("id").default(0),
        FieldDescriptor::string("name").default(""),
        FieldDescriptor::string("class").optional(),
        FieldDescriptor::float("opacity").default(1.0),
        FieldDescriptor::bool("visible").default(true),
        FieldDescriptor::bool("locked").default(false),
        FieldDescriptor::string("tintcolor").optional(),
        FieldDescriptor::float("offsetx").default(0.0),
        FieldDescriptor::float("offsety").default(0.0),
        FieldDescriptor::float("parallaxx").default(1.0),
        FieldDescriptor::float("parallaxy").default(1.0),
        FieldDescriptor::alias("map", PARENT),
        FieldDescriptor::child("properties", PROPERTIES).optional(),
    ])
}

/// `<layer>` / `"type": "tilelayer"`.
pub(super) fn tile_layer_type(layer: &EntityType) -> EntityType {
    EntityType::new(TILE_LAYER)
        .extends(layer)
        .tag("layer")
        .json_type("tilelayer")
        .fields([
            FieldDescriptor::int("x").default(0),
            FieldDescriptor::int("y").default(0),
            FieldDescriptor::int("width"),
            FieldDescriptor::int("height"),
            FieldDescriptor::string("encoding").optional(),
            FieldDescriptor::string("compression").optional(),
            FieldDescriptor::child("data", LAYER_DATA).optional(),
            // JSON keeps infinite-map chunks on the layer itself
            FieldDescriptor::children("chunks", CHUNK),
        ])
        .finalize_with(size_grid)
}

/// XML grids carry no dimensions of their own; take them from the layer.
fn size_grid(doc: &mut Document, id: EntryId) -> LoadResult<()> {
    let layer = doc.entry(id);
    let (Some(width), Some(height)) = (
        as_u32(layer.get_int("width")),
        as_u32(layer.get_int("height")),
    ) else {
        return Ok(());
    };
    let Some(data) = layer.get_entry("data") else {
        return Ok(());
    };

    if let Some(Value::Grid(grid)) = doc.entry_mut(data).get_mut("grid")
        && !grid.is_sized()
        && !grid.is_empty()
    {
        grid.set_dimensions(width, height)?;
    }
    Ok(())
}

/// `<data>`: the GID payload of a tile layer.
///
/// Legacy `<tile gid>` cells are payload, not entries; only chunks are built.
pub(super) fn layer_data_type() -> EntityType {
    EntityType::new(LAYER_DATA).tag("data").only_children(&["chunk"]).fields([
        FieldDescriptor::string("encoding").optional(),
        FieldDescriptor::string("compression").optional(),
        FieldDescriptor::children("chunks", CHUNK),
        FieldDescriptor::computed("grid", read_layer_grid),
    ])
}

fn read_layer_grid(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let grid = match scope.raw() {
        RawNode::Xml(_) => {
            let chunked = scope.value("chunks").is_some_and(|chunks| !chunks.entries().is_empty());
            if chunked {
                GridData::default()
            } else {
                let encoding = scope.value("encoding").and_then(Value::as_str);
                decode_payload(scope, scope.raw(), encoding)?
            }
        }
        // The payload is the layer's `data` value; everything else lives on the layer
        RawNode::Json(_) => {
            let layer = scope.parent_raw();
            let encoding = layer.and_then(|layer| layer.scalar_text("encoding"));
            let grid = decode_payload(scope, scope.raw(), encoding.as_deref())?;
            let size = |key| {
                layer
                    .and_then(|layer| layer.scalar_text(key))
                    .and_then(|text| text.parse::<u32>().ok())
            };
            match (size("width"), size("height")) {
                (Some(width), Some(height)) => grid.with_dimensions(width, height)?,
                _ => grid,
            }
        }
    };
    Ok(Value::Grid(grid))
}

/// `<chunk>`: one rectangle of an infinite map's layer.
pub(super) fn chunk_type() -> EntityType {
    EntityType::new(CHUNK).tag("chunk").only_children(&[]).fields([
        FieldDescriptor::int("x"),
        FieldDescriptor::int("y"),
        FieldDescriptor::int("width"),
        FieldDescriptor::int("height"),
        FieldDescriptor::computed("grid", read_chunk_grid),
    ])
}

fn read_chunk_grid(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let grid = match scope.raw() {
        // Encoding is declared once on the enclosing <data>
        RawNode::Xml(_) => {
            let encoding = scope
                .parent_raw()
                .and_then(|data| data.scalar_text("encoding"));
            decode_payload(scope, scope.raw(), encoding.as_deref())?
        }
        RawNode::Json(json) => match json.get("data") {
            Some(payload) => {
                let encoding = scope
                    .parent_raw()
                    .and_then(|layer| layer.scalar_text("encoding"));
                decode_payload(scope, &RawNode::Json(payload.clone()), encoding.as_deref())?
            }
            None => GridData::default(),
        },
    };

    let size = |name| as_u32(scope.value(name).and_then(Value::as_int));
    Ok(Value::Grid(match (size("width"), size("height")) {
        (Some(width), Some(height)) => grid.with_dimensions(width, height)?,
        _ => grid,
    }))
}

/// Decode a tile payload. Only uncompressed CSV (or plain JSON arrays) is supported.
fn decode_payload(
    scope: &FieldScope<'_>,
    payload: &RawNode,
    encoding: Option<&str>,
) -> LoadResult<GridData> {
    match payload {
        RawNode::Xml(element) => match encoding {
            // Legacy format: one <tile gid="..."/> per cell
            None => {
                let data = element
                    .children
                    .iter()
                    .filter(|child| child.tag == "tile")
                    .map(|tile| match tile.attr("gid") {
                        Some(gid) => gid
                            .trim()
                            .parse::<u32>()
                            .map_err(|_| scope.invalid(gid, "unsigned tile id")),
                        None => Ok(0),
                    })
                    .collect::<LoadResult<Vec<_>>>()?;
                Ok(GridData::new(None, None, data))
            }
            Some("csv") => GridData::from_csv(element.text.as_deref().unwrap_or_default()),
            Some(other) => Err(LoadError::UnsupportedEncoding {
                encoding: other.to_string(),
            }),
        },
        RawNode::Json(json) => match json {
            serde_json::Value::Array(values) => GridData::from_json(values),
            serde_json::Value::String(_) => Err(LoadError::UnsupportedEncoding {
                encoding: encoding.unwrap_or("base64").to_string(),
            }),
            other => Err(scope.invalid(other.to_string(), "array of tile ids")),
        },
    }
}

/// `<imagelayer>`.
pub(super) fn image_layer_type(layer: &EntityType) -> EntityType {
    EntityType::new(IMAGE_LAYER)
        .extends(layer)
        .tag("imagelayer")
        .json_type("imagelayer")
        .specialized_by("class", "class")
        .fields([
            FieldDescriptor::child("image", IMAGE).optional(),
            FieldDescriptor::bool("repeatx").default(false),
            FieldDescriptor::bool("repeaty").default(false),
        ])
}

/// `<objectgroup>`, also used for per-tile collision shapes.
pub(super) fn object_group_type(layer: &EntityType) -> EntityType {
    EntityType::new(OBJECT_GROUP)
        .extends(layer)
        .tag("objectgroup")
        .json_type("objectgroup")
        .specialized_by("class", "class")
        .fields([
            FieldDescriptor::string("color").optional(),
            FieldDescriptor::string("draworder").default("topdown"),
            FieldDescriptor::children("objects", OBJECT),
        ])
}

/// `<group>`: a layer holding other layers.
pub(super) fn group_layer_type(layer: &EntityType) -> EntityType {
    EntityType::new(GROUP_LAYER)
        .extends(layer)
        .tag("group")
        .json_type("group")
        .field(FieldDescriptor::children("layers", LAYER))
}

/// The concrete kind of a layer.
#[derive(Debug, Clone, Copy)]
pub enum LayerKind<'d> {
    Tiles(TileLayerView<'d>),
    Image(ImageLayerView<'d>),
    Objects(ObjectGroupView<'d>),
    Group(GroupLayerView<'d>),
}

entity_view! {
    /// Any layer, exposing the fields every layer type shares.
    LayerView => LAYER
}

impl<'d> LayerView<'d> {
    pub fn kind(&self) -> Option<LayerKind<'d>> {
        let (doc, id) = (self.doc, self.id);
        TileLayerView::new(doc, id)
            .map(LayerKind::Tiles)
            .or_else(|| ImageLayerView::new(doc, id).map(LayerKind::Image))
            .or_else(|| ObjectGroupView::new(doc, id).map(LayerKind::Objects))
            .or_else(|| GroupLayerView::new(doc, id).map(LayerKind::Group))
    }

    pub fn layer_id(&self) -> i64 {
        self.entry().get_int("id").unwrap_or_default()
    }

    pub fn name(&self) -> &'d str {
        self.entry().get_str("name").unwrap_or_default()
    }

    pub fn class(&self) -> Option<&'d str> {
        self.entry().get_str("class")
    }

    pub fn opacity(&self) -> f64 {
        self.entry().get_float("opacity").unwrap_or(1.0)
    }

    pub fn visible(&self) -> bool {
        self.entry().get_bool("visible").unwrap_or(true)
    }

    pub fn locked(&self) -> bool {
        self.entry().get_bool("locked").unwrap_or_default()
    }

    pub fn tint_color(&self) -> Option<&'d str> {
        self.entry().get_str("tintcolor")
    }

    /// Rendering offset in pixels.
    pub fn offset(&self) -> (f64, f64) {
        let entry = self.entry();
        (
            entry.get_float("offsetx").unwrap_or_default(),
            entry.get_float("offsety").unwrap_or_default(),
        )
    }

    pub fn parallax(&self) -> (f64, f64) {
        let entry = self.entry();
        (
            entry.get_float("parallaxx").unwrap_or(1.0),
            entry.get_float("parallaxy").unwrap_or(1.0),
        )
    }

    /// The map this layer belongs to, through any enclosing groups.
    pub fn map(&self) -> Option<MapView<'d>> {
        MapView::new(self.doc, self.doc.find_ancestor(self.id, MAP)?)
    }
}

macro_rules! as_layer {
    ($view:ident) => {
        impl<'d> $view<'d> {
            /// Shared layer fields.
            pub fn layer(&self) -> LayerView<'d> {
                LayerView {
                    doc: self.doc,
                    id: self.id,
                }
            }
        }
    };
}

entity_view! {
    /// A layer of tiles, finite (one grid) or infinite (chunks).
    TileLayerView => TILE_LAYER
}
as_layer!(TileLayerView);

impl<'d> TileLayerView<'d> {
    pub fn width(&self) -> u32 {
        as_u32(self.entry().get_int("width")).unwrap_or_default()
    }

    pub fn height(&self) -> u32 {
        as_u32(self.entry().get_int("height")).unwrap_or_default()
    }

    pub fn data(&self) -> Option<LayerDataView<'d>> {
        LayerDataView::new(self.doc, self.entry().get_entry("data")?)
    }

    pub fn grid(&self) -> Option<&'d GridData> {
        self.data()?.grid()
    }

    /// Chunks of an infinite layer, whichever encoding they were read from.
    pub fn chunks(&self) -> Vec<ChunkView<'d>> {
        let mut chunks = views(self.doc, self.entry().get_entries("chunks"), ChunkView::new);
        if let Some(data) = self.data() {
            chunks.extend(data.chunks());
        }
        chunks
    }

    /// Raw GID at `(x, y)`, flip flags included.
    pub fn gid(&self, x: u32, y: u32) -> LoadResult<u32> {
        self.grid().ok_or(LoadError::UnsizedGrid)?.get(x, y)
    }

    /// Tile at `(x, y)`, resolved through the owning map's tilesets.
    pub fn tile(&self, x: u32, y: u32) -> LoadResult<TileRef> {
        let gid = self.gid(x, y)?;
        self.resolve(gid)
    }

    /// Every cell as `(x, y, tile)`, row by row.
    pub fn iter_tiles(&self) -> LoadResult<Vec<(u32, u32, TileRef)>> {
        let Some(grid) = self.grid() else {
            return Ok(Vec::new());
        };
        grid.iter()
            .map(|(x, y, gid)| Ok((x, y, self.resolve(gid)?)))
            .collect()
    }

    fn resolve(&self, gid: u32) -> LoadResult<TileRef> {
        match self.layer().map() {
            Some(map) => map.tile(gid),
            None => TileCollection::default().lookup(gid),
        }
    }
}

entity_view! {
    ImageLayerView => IMAGE_LAYER
}
as_layer!(ImageLayerView);

impl<'d> ImageLayerView<'d> {
    pub fn image(&self) -> Option<ImageView<'d>> {
        ImageView::new(self.doc, self.entry().get_entry("image")?)
    }

    pub fn repeat_x(&self) -> bool {
        self.entry().get_bool("repeatx").unwrap_or_default()
    }

    pub fn repeat_y(&self) -> bool {
        self.entry().get_bool("repeaty").unwrap_or_default()
    }
}

entity_view! {
    /// An object layer, or the collision shapes of a tile.
    ObjectGroupView => OBJECT_GROUP
}
as_layer!(ObjectGroupView);

impl<'d> ObjectGroupView<'d> {
    pub fn color(&self) -> Option<&'d str> {
        self.entry().get_str("color")
    }

    /// `topdown` or `index`.
    pub fn draw_order(&self) -> &'d str {
        self.entry().get_str("draworder").unwrap_or("topdown")
    }

    pub fn objects(&self) -> Vec<ObjectView<'d>> {
        views(self.doc, self.entry().get_entries("objects"), ObjectView::new)
    }
}

entity_view! {
    GroupLayerView => GROUP_LAYER
}
as_layer!(GroupLayerView);

impl<'d> GroupLayerView<'d> {
    pub fn layers(&self) -> Vec<LayerView<'d>> {
        views(self.doc, self.entry().get_entries("layers"), LayerView::new)
    }
}

entity_view! {
    LayerDataView => LAYER_DATA
}

impl<'d> LayerDataView<'d> {
    pub fn encoding(&self) -> Option<&'d str> {
        self.entry().get_str("encoding")
    }

    pub fn compression(&self) -> Option<&'d str> {
        self.entry().get_str("compression")
    }

    pub fn grid(&self) -> Option<&'d GridData> {
        self.entry().get("grid").and_then(Value::as_grid)
    }

    pub fn chunks(&self) -> Vec<ChunkView<'d>> {
        views(self.doc, self.entry().get_entries("chunks"), ChunkView::new)
    }
}

entity_view! {
    ChunkView => CHUNK
}

impl<'d> ChunkView<'d> {
    /// Position of the chunk's top-left cell, in tiles.
    pub fn position(&self) -> (i64, i64) {
        let entry = self.entry();
        (
            entry.get_int("x").unwrap_or_default(),
            entry.get_int("y").unwrap_or_default(),
        )
    }

    pub fn width(&self) -> u32 {
        as_u32(self.entry().get_int("width")).unwrap_or_default()
    }

    pub fn height(&self) -> u32 {
        as_u32(self.entry().get_int("height")).unwrap_or_default()
    }

    pub fn grid(&self) -> Option<&'d GridData> {
        self.entry().get("grid").and_then(Value::as_grid)
    }
}
