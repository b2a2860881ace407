use super::image::ImageView;
use super::{
    EDITOR_SETTINGS, GroupLayerView, ImageLayerView, LAYER, LayerView, MAP, PROPERTIES, TILESET,
    TilesetView, as_u32, views,
};
use crate::document::{Document, EntryId};
use crate::error::LoadResult;
use crate::loader::FieldScope;
use crate::schema::{EntityType, FieldDescriptor};
use crate::tiles::{TileCollection, TileRef};
use crate::value::Value;

/// `<map>`, the usual document root.
pub(super) fn map_type() -> EntityType {
    EntityType::new(MAP)
        .tag("map")
        .remote()
        .specialized_by("class", "type")
        .fields([
            FieldDescriptor::string("version"),
            FieldDescriptor::string("tiledversion").optional(),
            FieldDescriptor::string("type").xml_name("class").optional(),
            FieldDescriptor::string("orientation"),
            FieldDescriptor::string("renderorder"),
            FieldDescriptor::int("compressionlevel").default(-1),
            FieldDescriptor::int("width"),
            FieldDescriptor::int("height"),
            FieldDescriptor::int("tilewidth"),
            FieldDescriptor::int("tileheight"),
            FieldDescriptor::int("hexsidelength").optional(),
            FieldDescriptor::string("staggeraxis").optional(),
            FieldDescriptor::string("staggerindex").optional(),
            FieldDescriptor::float("parallaxoriginx").default(0.0),
            FieldDescriptor::float("parallaxoriginy").default(0.0),
            FieldDescriptor::string("backgroundcolor").optional(),
            FieldDescriptor::int("nextlayerid").optional(),
            FieldDescriptor::int("nextobjectid").optional(),
            FieldDescriptor::bool("infinite").default(false),
            FieldDescriptor::child("properties", PROPERTIES).optional(),
            FieldDescriptor::child("editorsettings", EDITOR_SETTINGS).optional(),
            FieldDescriptor::children("tilesets", TILESET),
            FieldDescriptor::children("layers", LAYER),
            FieldDescriptor::computed("images", collect_images),
            FieldDescriptor::computed("tiles", index_tilesets),
        ])
}

fn index_tilesets(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let doc = scope.document();
    let spans = scope
        .value("tilesets")
        .map(Value::entries)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| TilesetView::new(doc, id))
        .map(|tileset| tileset.span())
        .collect();
    Ok(Value::Tiles(TileCollection::new(spans)))
}

/// Tileset and tile images first, then image layers (descending into groups).
fn collect_images(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let doc = scope.document();
    let mut images = Vec::new();

    for tileset in scope.value("tilesets").map(Value::entries).unwrap_or_default() {
        let Some(tileset) = TilesetView::new(doc, tileset) else {
            continue;
        };
        images.extend(tileset.image().map(|image| image.id()));
        images.extend(
            tileset
                .tiles()
                .iter()
                .filter_map(|tile| tile.image())
                .map(|image| image.id()),
        );
    }

    let layers = scope.value("layers").map(Value::entries).unwrap_or_default();
    layer_images(doc, &layers, &mut images);

    Ok(Value::List(images.into_iter().map(Value::Entry).collect()))
}

fn layer_images(doc: &Document, layers: &[EntryId], images: &mut Vec<EntryId>) {
    for &layer in layers {
        if let Some(image) = ImageLayerView::new(doc, layer).and_then(|layer| layer.image()) {
            images.push(image.id());
        } else if let Some(group) = GroupLayerView::new(doc, layer) {
            layer_images(doc, &group.entry().get_entries("layers"), images);
        }
    }
}

entity_view! {
    /// A map: tilesets, layers and the GID index over them.
    MapView => MAP
}

impl<'d> MapView<'d> {
    /// The root of `doc`, when it is a map.
    pub fn root(doc: &'d Document) -> Option<Self> {
        Self::new(doc, doc.root())
    }

    pub fn version(&self) -> &'d str {
        self.entry().get_str("version").unwrap_or_default()
    }

    pub fn tiled_version(&self) -> Option<&'d str> {
        self.entry().get_str("tiledversion")
    }

    /// Custom class of the map.
    pub fn class(&self) -> Option<&'d str> {
        self.entry().get_str("type")
    }

    /// `orthogonal`, `isometric`, `staggered` or `hexagonal`.
    pub fn orientation(&self) -> &'d str {
        self.entry().get_str("orientation").unwrap_or_default()
    }

    pub fn render_order(&self) -> &'d str {
        self.entry().get_str("renderorder").unwrap_or_default()
    }

    pub fn compression_level(&self) -> i64 {
        self.entry().get_int("compressionlevel").unwrap_or(-1)
    }

    /// Size in tiles.
    pub fn size(&self) -> (u32, u32) {
        let entry = self.entry();
        (
            as_u32(entry.get_int("width")).unwrap_or_default(),
            as_u32(entry.get_int("height")).unwrap_or_default(),
        )
    }

    pub fn tile_size(&self) -> (u32, u32) {
        let entry = self.entry();
        (
            as_u32(entry.get_int("tilewidth")).unwrap_or_default(),
            as_u32(entry.get_int("tileheight")).unwrap_or_default(),
        )
    }

    pub fn hex_side_length(&self) -> Option<i64> {
        self.entry().get_int("hexsidelength")
    }

    pub fn stagger_axis(&self) -> Option<&'d str> {
        self.entry().get_str("staggeraxis")
    }

    pub fn stagger_index(&self) -> Option<&'d str> {
        self.entry().get_str("staggerindex")
    }

    pub fn parallax_origin(&self) -> (f64, f64) {
        let entry = self.entry();
        (
            entry.get_float("parallaxoriginx").unwrap_or_default(),
            entry.get_float("parallaxoriginy").unwrap_or_default(),
        )
    }

    pub fn background_color(&self) -> Option<&'d str> {
        self.entry().get_str("backgroundcolor")
    }

    pub fn next_layer_id(&self) -> Option<i64> {
        self.entry().get_int("nextlayerid")
    }

    pub fn next_object_id(&self) -> Option<i64> {
        self.entry().get_int("nextobjectid")
    }

    pub fn infinite(&self) -> bool {
        self.entry().get_bool("infinite").unwrap_or_default()
    }

    /// The path the map was read from (or its `source` when embedded by reference).
    pub fn source(&self) -> Option<&'d str> {
        self.entry().source()
    }

    /// Tilesets in declaration order.
    pub fn tilesets(&self) -> Vec<TilesetView<'d>> {
        views(self.doc, self.entry().get_entries("tilesets"), TilesetView::new)
    }

    /// Top-level layers in drawing order.
    pub fn layers(&self) -> Vec<LayerView<'d>> {
        views(self.doc, self.entry().get_entries("layers"), LayerView::new)
    }

    /// Every layer, groups included, depth first.
    pub fn all_layers(&self) -> Vec<LayerView<'d>> {
        fn walk<'d>(layers: Vec<LayerView<'d>>, out: &mut Vec<LayerView<'d>>) {
            for layer in layers {
                out.push(layer);
                if let Some(group) = GroupLayerView::new(layer.document(), layer.id()) {
                    walk(group.layers(), out);
                }
            }
        }

        let mut out = Vec::new();
        walk(self.layers(), &mut out);
        out
    }

    pub fn layer_by_name(&self, name: &str) -> Option<LayerView<'d>> {
        self.all_layers()
            .into_iter()
            .find(|layer| layer.name() == name)
    }

    pub fn tiles(&self) -> Option<&'d TileCollection> {
        self.entry().get("tiles").and_then(Value::as_tiles)
    }

    /// Resolve a raw GID (flip flags allowed), including the tileset's explicit tile entry.
    pub fn tile(&self, gid: u32) -> LoadResult<TileRef> {
        let tile = match self.tiles() {
            Some(tiles) => tiles.lookup(gid)?,
            None => TileCollection::default().lookup(gid)?,
        };
        let entry = tile
            .tileset_view(self.doc)
            .and_then(|tileset| tileset.tile_entry(tile.id))
            .map(|view| view.id());
        Ok(tile.with_entry(entry))
    }

    /// Every image the map references.
    pub fn images(&self) -> Vec<ImageView<'d>> {
        views(self.doc, self.entry().get_entries("images"), ImageView::new)
    }
}
