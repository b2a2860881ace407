use tmxgraph_assets::prelude::RawNode;

use super::{
    ELLIPSE, MAP, MapView, OBJECT, ObjectGroupView, POINT, POLYGON, POLYLINE, PROPERTIES, TEXT,
    as_u32,
};
use crate::error::LoadResult;
use crate::loader::FieldScope;
use crate::schema::{EntityType, FieldDescriptor, PARENT};
use crate::tiles::{TileCollection, TileRef};
use crate::value::{AssetHandle, Value};

/// `<object>`. Specialized on its `type`.
pub(super) fn object_type() -> EntityType {
    EntityType::new(OBJECT)
        .tag("object")
        .specialized_by("type", "type")
        .fields([
            FieldDescriptor::int("id").default(0),
            FieldDescriptor::string("name").optional(),
            FieldDescriptor::string("type").optional(),
            FieldDescriptor::string("class").optional(),
            FieldDescriptor::float("x"),
            FieldDescriptor::float("y"),
            FieldDescriptor::float("width").optional(),
            FieldDescriptor::float("height").optional(),
            FieldDescriptor::float("rotation").default(0.0),
            FieldDescriptor::int("gid").optional(),
            FieldDescriptor::bool("visible").default(true),
            FieldDescriptor::string("template").optional(),
            FieldDescriptor::child("properties", PROPERTIES).optional(),
            FieldDescriptor::child("text", TEXT).optional(),
            FieldDescriptor::child("ellipse", ELLIPSE).optional(),
            FieldDescriptor::child("point", POINT).optional(),
            FieldDescriptor::child("polygon", POLYGON).optional(),
            FieldDescriptor::child("polyline", POLYLINE).optional(),
            FieldDescriptor::alias("layer", PARENT),
        ])
}

/// `<text>` of a text object. Defaults follow Tiled's.
pub(super) fn text_type() -> EntityType {
    EntityType::new(TEXT).tag("text").fields([
        FieldDescriptor::text("text").default(""),
        FieldDescriptor::string("fontfamily").default("sans-serif"),
        FieldDescriptor::int("pixelsize").default(16),
        FieldDescriptor::bool("wrap").default(false),
        FieldDescriptor::string("color").default("#000000"),
        FieldDescriptor::bool("bold").default(false),
        FieldDescriptor::bool("italic").default(false),
        FieldDescriptor::bool("underline").default(false),
        FieldDescriptor::bool("strikeout").default(false),
        FieldDescriptor::bool("kerning").default(true),
        FieldDescriptor::string("halign").default("left"),
        FieldDescriptor::string("valign").default("top"),
        FieldDescriptor::computed("font", load_font),
    ])
}

fn load_font(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let family = scope
        .value("fontfamily")
        .and_then(Value::as_str)
        .unwrap_or("sans-serif");
    let size = scope.value("pixelsize").and_then(Value::as_int).unwrap_or(16);
    Ok(Value::Handle(scope.callbacks().load_font(family, size as f64)))
}

/// Marker shapes (`<ellipse/>`, `<point/>`). In JSON they appear as `"ellipse": true`.
pub(super) fn shape_type(name: &'static str, tag: &'static str) -> EntityType {
    EntityType::new(name).tag(tag)
}

/// `<polygon points="0,0 8,0 8,8"/>` or `"polygon": [{"x": 0, "y": 0}, ...]`.
pub(super) fn polygon_type(name: &'static str, tag: &'static str) -> EntityType {
    EntityType::new(name)
        .tag(tag)
        .field(FieldDescriptor::computed("points", read_points))
}

fn read_points(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let points = match scope.raw() {
        RawNode::Xml(element) => {
            let text = element.attr("points").unwrap_or_default();
            text.split_whitespace()
                .map(|pair| -> LoadResult<(f64, f64)> {
                    let (x, y) = pair
                        .split_once(',')
                        .ok_or_else(|| scope.invalid(pair, "x,y pair"))?;
                    let coordinate = |text: &str| {
                        text.trim()
                            .parse::<f64>()
                            .map_err(|_| scope.invalid(pair, "x,y pair"))
                    };
                    Ok((coordinate(x)?, coordinate(y)?))
                })
                .collect::<LoadResult<Vec<_>>>()?
        }
        RawNode::Json(json) => json
            .as_array()
            .ok_or_else(|| scope.invalid(json.to_string(), "array of points"))?
            .iter()
            .map(|point| {
                let coordinate = |key| point.get(key).and_then(serde_json::Value::as_f64);
                match (coordinate("x"), coordinate("y")) {
                    (Some(x), Some(y)) => Ok((x, y)),
                    _ => Err(scope.invalid(point.to_string(), "point object")),
                }
            })
            .collect::<LoadResult<Vec<_>>>()?,
    };
    Ok(Value::Points(points))
}

/// Geometry of an object.
#[derive(Debug, Clone, Copy)]
pub enum ObjectShape<'d> {
    Rectangle { width: f64, height: f64 },
    Ellipse { width: f64, height: f64 },
    Point,
    /// Vertices relative to the object's position
    Polygon(&'d [(f64, f64)]),
    Polyline(&'d [(f64, f64)]),
    Text(TextView<'d>),
    /// Tile object, with its raw GID
    Tile(u32),
}

entity_view! {
    /// An object in an object group (or a tile's collision group).
    ObjectView => OBJECT
}

impl<'d> ObjectView<'d> {
    pub fn object_id(&self) -> i64 {
        self.entry().get_int("id").unwrap_or_default()
    }

    pub fn name(&self) -> Option<&'d str> {
        self.entry().get_str("name")
    }

    /// `class`, falling back to `type`.
    pub fn class(&self) -> Option<&'d str> {
        let entry = self.entry();
        entry.get_str("class").or_else(|| entry.get_str("type"))
    }

    pub fn position(&self) -> (f64, f64) {
        let entry = self.entry();
        (
            entry.get_float("x").unwrap_or_default(),
            entry.get_float("y").unwrap_or_default(),
        )
    }

    pub fn size(&self) -> (f64, f64) {
        let entry = self.entry();
        (
            entry.get_float("width").unwrap_or_default(),
            entry.get_float("height").unwrap_or_default(),
        )
    }

    /// Clockwise, in degrees.
    pub fn rotation(&self) -> f64 {
        self.entry().get_float("rotation").unwrap_or_default()
    }

    pub fn visible(&self) -> bool {
        self.entry().get_bool("visible").unwrap_or(true)
    }

    pub fn template(&self) -> Option<&'d str> {
        self.entry().get_str("template")
    }

    /// Raw GID of a tile object, flip flags included.
    pub fn gid(&self) -> Option<u32> {
        as_u32(self.entry().get_int("gid"))
    }

    pub fn has_tile(&self) -> bool {
        self.gid().is_some()
    }

    pub fn has_text(&self) -> bool {
        self.entry().get_entry("text").is_some()
    }

    pub fn text(&self) -> Option<TextView<'d>> {
        TextView::new(self.doc, self.entry().get_entry("text")?)
    }

    /// Tile of a tile object, resolved through the owning map.
    pub fn tile(&self) -> LoadResult<Option<TileRef>> {
        let Some(gid) = self.gid() else {
            return Ok(None);
        };
        let map = self
            .doc
            .find_ancestor(self.id, MAP)
            .and_then(|map| MapView::new(self.doc, map));
        let tile = match map {
            Some(map) => map.tile(gid)?,
            None => TileCollection::default().lookup(gid)?,
        };
        Ok(Some(tile))
    }

    pub fn layer(&self) -> Option<ObjectGroupView<'d>> {
        ObjectGroupView::new(self.doc, self.entry().get_entry("layer")?)
    }

    pub fn shape(&self) -> ObjectShape<'d> {
        let entry = self.entry();
        let (width, height) = self.size();
        let points = |field| {
            let shape = entry.get_entry(field)?;
            match self.doc.field(shape, "points") {
                Some(Value::Points(points)) => Some(points.as_slice()),
                _ => Some(&[][..]),
            }
        };

        if let Some(points) = points("polygon") {
            ObjectShape::Polygon(points)
        } else if let Some(points) = points("polyline") {
            ObjectShape::Polyline(points)
        } else if entry.get_entry("ellipse").is_some() {
            ObjectShape::Ellipse { width, height }
        } else if entry.get_entry("point").is_some() {
            ObjectShape::Point
        } else if let Some(text) = self.text() {
            ObjectShape::Text(text)
        } else if let Some(gid) = self.gid() {
            ObjectShape::Tile(gid)
        } else {
            ObjectShape::Rectangle { width, height }
        }
    }
}

entity_view! {
    TextView => TEXT
}

impl<'d> TextView<'d> {
    pub fn text(&self) -> &'d str {
        self.entry().get_str("text").unwrap_or_default()
    }

    pub fn font_family(&self) -> &'d str {
        self.entry().get_str("fontfamily").unwrap_or("sans-serif")
    }

    pub fn pixel_size(&self) -> i64 {
        self.entry().get_int("pixelsize").unwrap_or(16)
    }

    pub fn wrap(&self) -> bool {
        self.entry().get_bool("wrap").unwrap_or_default()
    }

    pub fn color(&self) -> &'d str {
        self.entry().get_str("color").unwrap_or("#000000")
    }

    pub fn bold(&self) -> bool {
        self.entry().get_bool("bold").unwrap_or_default()
    }

    pub fn italic(&self) -> bool {
        self.entry().get_bool("italic").unwrap_or_default()
    }

    pub fn underline(&self) -> bool {
        self.entry().get_bool("underline").unwrap_or_default()
    }

    pub fn strikeout(&self) -> bool {
        self.entry().get_bool("strikeout").unwrap_or_default()
    }

    pub fn kerning(&self) -> bool {
        self.entry().get_bool("kerning").unwrap_or(true)
    }

    pub fn halign(&self) -> &'d str {
        self.entry().get_str("halign").unwrap_or("left")
    }

    pub fn valign(&self) -> &'d str {
        self.entry().get_str("valign").unwrap_or("top")
    }

    /// Handle returned by the font callback.
    pub fn font(&self) -> Option<&'d AssetHandle> {
        self.entry().get("font").and_then(Value::as_handle)
    }
}
