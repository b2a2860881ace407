use std::collections::BTreeMap;

use super::{
    ANIMATION, FRAME, GRID, IMAGE, MapView, OBJECT_GROUP, ObjectGroupView, PROPERTIES, TILE,
    TILE_OFFSET, TILESET, TRANSFORMATIONS, WANG_SETS, as_u32, views,
};
use super::image::ImageView;
use crate::document::Document;
use crate::error::{LoadError, LoadResult};
use crate::loader::FieldScope;
use crate::schema::{EntityType, FieldDescriptor, PARENT};
use crate::tiles::{FlipFlags, TileRef, TilesetSpan};
use crate::value::Value;

/// `<tileset>`, possibly defined in an external `.tsx`/`.tsj` file.
pub(super) fn tileset_type() -> EntityType {
    EntityType::new(TILESET).tag("tileset").remote().fields([
        FieldDescriptor::int("firstgid"),
        FieldDescriptor::string("name").optional(),
        FieldDescriptor::string("class").optional(),
        FieldDescriptor::int("tilewidth"),
        FieldDescriptor::int("tileheight"),
        FieldDescriptor::int("tilecount"),
        FieldDescriptor::int("columns"),
        FieldDescriptor::int("spacing").default(0),
        FieldDescriptor::int("margin").default(0),
        FieldDescriptor::string("objectalignment").optional(),
        FieldDescriptor::child("tileoffset", TILE_OFFSET).optional(),
        FieldDescriptor::child("grid", GRID).optional(),
        FieldDescriptor::child("properties", PROPERTIES).optional(),
        FieldDescriptor::child("image", IMAGE).optional(),
        FieldDescriptor::children("tiles", TILE).keyed_by("id"),
        FieldDescriptor::child("wangsets", WANG_SETS).optional(),
        FieldDescriptor::child("transformations", TRANSFORMATIONS).optional(),
        FieldDescriptor::alias("map", PARENT),
        FieldDescriptor::computed("tiledata", index_tiles),
    ])
}

/// Index explicit tiles by their local id.
fn index_tiles(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let doc = scope.document();
    let mut ids = BTreeMap::new();
    for tile in scope.value("tiles").map(Value::entries).unwrap_or_default() {
        let raw_id = doc.entry(tile).get_int("id");
        match as_u32(raw_id) {
            Some(id) => {
                ids.insert(id, tile);
            }
            None if raw_id.is_some() => {
                return Err(scope.invalid(format!("{raw_id:?}"), "tile id"));
            }
            None => {}
        }
    }
    Ok(Value::TileIds(ids))
}

/// `<tile>` inside a tileset.
pub(super) fn tile_type() -> EntityType {
    EntityType::new(TILE).tag("tile").fields([
        FieldDescriptor::int("id").optional(),
        FieldDescriptor::string("type").optional(),
        FieldDescriptor::string("class").optional(),
        FieldDescriptor::float("probability").optional(),
        FieldDescriptor::alias("tileset", PARENT),
        FieldDescriptor::child("properties", PROPERTIES).optional(),
        FieldDescriptor::child("image", IMAGE).optional(),
        FieldDescriptor::child("objectgroup", OBJECT_GROUP).optional(),
        FieldDescriptor::child("animation", ANIMATION).optional(),
    ])
}

/// `<grid>`: how tiles are laid out in the tileset editor.
pub(super) fn grid_type() -> EntityType {
    EntityType::new(GRID).tag("grid").fields([
        FieldDescriptor::string("orientation").default("orthogonal"),
        FieldDescriptor::int("width"),
        FieldDescriptor::int("height"),
    ])
}

pub(super) fn tile_offset_type() -> EntityType {
    EntityType::new(TILE_OFFSET).tag("tileoffset").fields([
        FieldDescriptor::int("x").default(0),
        FieldDescriptor::int("y").default(0),
    ])
}

/// `<animation>`. JSON stores the frame list directly under the tile's `animation` key.
pub(super) fn animation_type() -> EntityType {
    EntityType::new(ANIMATION)
        .tag("animation")
        .field(FieldDescriptor::children("frames", FRAME).json_self())
}

pub(super) fn frame_type() -> EntityType {
    EntityType::new(FRAME).tag("frame").fields([
        FieldDescriptor::int("tileid"),
        FieldDescriptor::int("duration"),
    ])
}

entity_view! {
    /// A tileset and the GID range it occupies in its map.
    TilesetView => TILESET
}

impl<'d> TilesetView<'d> {
    pub fn name(&self) -> Option<&'d str> {
        self.entry().get_str("name")
    }

    pub fn firstgid(&self) -> u32 {
        as_u32(self.entry().get_int("firstgid")).unwrap_or_default()
    }

    pub fn tile_width(&self) -> u32 {
        as_u32(self.entry().get_int("tilewidth")).unwrap_or_default()
    }

    pub fn tile_height(&self) -> u32 {
        as_u32(self.entry().get_int("tileheight")).unwrap_or_default()
    }

    pub fn tilecount(&self) -> u32 {
        as_u32(self.entry().get_int("tilecount")).unwrap_or_default()
    }

    /// Tiles per row of the tileset image. 0 for image collections.
    pub fn columns(&self) -> u32 {
        as_u32(self.entry().get_int("columns")).unwrap_or_default()
    }

    pub fn spacing(&self) -> u32 {
        as_u32(self.entry().get_int("spacing")).unwrap_or_default()
    }

    pub fn margin(&self) -> u32 {
        as_u32(self.entry().get_int("margin")).unwrap_or_default()
    }

    /// Drawing offset applied to every tile, `(0, 0)` when not declared.
    pub fn tile_offset(&self) -> (i64, i64) {
        match self.entry().get_entry("tileoffset") {
            Some(offset) => {
                let offset = self.doc.entry(offset);
                (
                    offset.get_int("x").unwrap_or_default(),
                    offset.get_int("y").unwrap_or_default(),
                )
            }
            None => (0, 0),
        }
    }

    /// The external file this tileset was loaded from, as referenced by its map.
    pub fn source(&self) -> Option<&'d str> {
        self.entry().source()
    }

    pub fn image(&self) -> Option<ImageView<'d>> {
        ImageView::new(self.doc, self.entry().get_entry("image")?)
    }

    pub fn grid(&self) -> Option<GridView<'d>> {
        GridView::new(self.doc, self.entry().get_entry("grid")?)
    }

    pub fn map(&self) -> Option<MapView<'d>> {
        MapView::new(self.doc, self.doc.find_ancestor(self.id, super::MAP)?)
    }

    /// Tiles declared explicitly (with properties, images, animations, ...).
    pub fn tiles(&self) -> Vec<TileView<'d>> {
        views(self.doc, self.entry().get_entries("tiles"), TileView::new)
    }

    /// Explicit tile entry for local id `id`, if the tileset declares one.
    pub fn tile_entry(&self, id: u32) -> Option<TileView<'d>> {
        let Some(Value::TileIds(ids)) = self.entry().get("tiledata") else {
            return None;
        };
        TileView::new(self.doc, *ids.get(&id)?)
    }

    pub fn span(&self) -> TilesetSpan {
        TilesetSpan {
            tileset: self.id,
            firstgid: self.firstgid(),
            tilecount: self.tilecount(),
        }
    }

    /// Tile with local id `id`.
    pub fn tile(&self, id: u32) -> LoadResult<TileRef> {
        if id >= self.tilecount() {
            return Err(LoadError::IndexOutOfRange {
                what: "tile",
                index: i64::from(id),
                len: self.tilecount() as usize,
            });
        }
        let entry = self.tile_entry(id).map(|tile| tile.id());
        Ok(TileRef::new(&self.span(), id, FlipFlags::default()).with_entry(entry))
    }

    /// Source rectangle `(x, y, width, height)` of tile `id` in the tileset image.
    ///
    /// For image collections this is the tile's own image.
    pub fn tile_rect(&self, id: u32) -> Option<(u32, u32, u32, u32)> {
        let columns = self.columns();
        if columns == 0 {
            let image = self.tile_entry(id)?.image()?;
            let width = as_u32(image.width())?;
            let height = as_u32(image.height())?;
            return Some((0, 0, width, height));
        }
        if id >= self.tilecount() {
            return None;
        }

        let (width, height) = (self.tile_width(), self.tile_height());
        let x = self.margin() + (id % columns) * (width + self.spacing());
        let y = self.margin() + (id / columns) * (height + self.spacing());
        Some((x, y, width, height))
    }
}

entity_view! {
    /// An explicitly declared tile.
    TileView => TILE
}

impl<'d> TileView<'d> {
    /// Local id inside the tileset.
    pub fn local_id(&self) -> Option<u32> {
        as_u32(self.entry().get_int("id"))
    }

    /// Class name (`class`, or `type` in files written before Tiled 1.9).
    pub fn class(&self) -> Option<&'d str> {
        let entry = self.entry();
        entry.get_str("class").or_else(|| entry.get_str("type"))
    }

    pub fn probability(&self) -> Option<f64> {
        self.entry().get_float("probability")
    }

    pub fn tileset(&self) -> Option<TilesetView<'d>> {
        TilesetView::new(self.doc, self.entry().get_entry("tileset")?)
    }

    pub fn image(&self) -> Option<ImageView<'d>> {
        ImageView::new(self.doc, self.entry().get_entry("image")?)
    }

    /// Collision shapes.
    pub fn collision(&self) -> Option<ObjectGroupView<'d>> {
        ObjectGroupView::new(self.doc, self.entry().get_entry("objectgroup")?)
    }

    pub fn animation(&self) -> Vec<AnimationFrame> {
        let Some(animation) = self.entry().get_entry("animation") else {
            return Vec::new();
        };
        self.doc
            .entry(animation)
            .get_entries("frames")
            .into_iter()
            .filter_map(|frame| {
                let frame = self.doc.entry(frame);
                Some(AnimationFrame {
                    tile_id: as_u32(frame.get_int("tileid"))?,
                    duration: as_u32(frame.get_int("duration"))?,
                })
            })
            .collect()
    }
}

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Local id of the tile shown
    pub tile_id: u32,
    /// Milliseconds
    pub duration: u32,
}

entity_view! {
    GridView => GRID
}

impl<'d> GridView<'d> {
    pub fn orientation(&self) -> &'d str {
        self.entry().get_str("orientation").unwrap_or("orthogonal")
    }

    pub fn width(&self) -> i64 {
        self.entry().get_int("width").unwrap_or_default()
    }

    pub fn height(&self) -> i64 {
        self.entry().get_int("height").unwrap_or_default()
    }
}

impl TileRef {
    pub fn tileset_view<'d>(&self, doc: &'d Document) -> Option<TilesetView<'d>> {
        TilesetView::new(doc, self.tileset?)
    }

    pub fn tile_view<'d>(&self, doc: &'d Document) -> Option<TileView<'d>> {
        TileView::new(doc, self.entry?)
    }

    /// Source rectangle of this tile in its tileset image. `None` for the empty tile.
    pub fn rect(&self, doc: &Document) -> Option<(u32, u32, u32, u32)> {
        self.tileset_view(doc)?.tile_rect(self.id)
    }
}
