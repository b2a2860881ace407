use std::path::PathBuf;

use super::IMAGE;
use crate::error::LoadResult;
use crate::loader::FieldScope;
use crate::schema::{EntityType, FieldDescriptor};
use crate::value::{AssetHandle, Value};

/// `<image>`. In JSON the image attributes are flattened into the owner
/// (`image`, `imagewidth`, ...), so it is built from the parent's node.
pub(super) fn image_type() -> EntityType {
    EntityType::new(IMAGE)
        .tag("image")
        .json_use_parent()
        .fields([
            FieldDescriptor::string("source").json_name("image").optional(),
            FieldDescriptor::int("width").json_name("imagewidth").optional(),
            FieldDescriptor::int("height").json_name("imageheight").optional(),
            FieldDescriptor::string("trans")
                .json_name("transparentcolor")
                .optional(),
            FieldDescriptor::string("format").optional(),
            FieldDescriptor::computed("surface", load_surface),
        ])
}

fn load_surface(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let Some(source) = scope.value("source").and_then(Value::as_str) else {
        return Ok(Value::Handle(None));
    };
    let path = scope.resolve_path(source);
    Ok(Value::Handle(scope.callbacks().load_image(&path)))
}

entity_view! {
    /// An image reference (tileset image, tile image or image layer).
    ImageView => IMAGE
}

impl<'d> ImageView<'d> {
    /// Path as written in the file that declares the image.
    pub fn source(&self) -> Option<&'d str> {
        self.entry().get_str("source")
    }

    /// Path of the image resolved through the chain of files leading to it.
    pub fn path(&self) -> Option<PathBuf> {
        self.source()
            .map(|source| self.doc.resource_path(self.id, source))
    }

    pub fn width(&self) -> Option<i64> {
        self.entry().get_int("width")
    }

    pub fn height(&self) -> Option<i64> {
        self.entry().get_int("height")
    }

    /// Color treated as transparent (`RRGGBB`, no leading `#`).
    pub fn transparent_color(&self) -> Option<&'d str> {
        self.entry().get_str("trans")
    }

    /// Handle returned by the image callback.
    pub fn handle(&self) -> Option<&'d AssetHandle> {
        self.entry().get("surface").and_then(Value::as_handle)
    }
}
