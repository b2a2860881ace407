//! Declarative entity schemas.
//!
//! An [`EntityType`] is an ordered list of [`FieldDescriptor`]s plus the flags the loader
//! needs to dispatch raw nodes onto it (XML tag, JSON `type` discriminant, remote loading,
//! specialization). Subtypes are composed explicitly: [`EntityType::extends`] copies the base
//! schema, and fields added afterwards are appended or replace a base field of the same name.
//!
//! ```rust
//! use tmxgraph_core::schema::{EntityType, FieldDescriptor};
//!
//! let layer = EntityType::new("MyLayer")
//!     .field(FieldDescriptor::int("id").default(0))
//!     .field(FieldDescriptor::string("name").default(""));
//! let tiles = EntityType::new("MyTileLayer")
//!     .extends(&layer)
//!     .tag("mylayer")
//!     .field(FieldDescriptor::int("width"));
//!
//! let names: Vec<_> = tiles.schema().iter().map(|f| f.name()).collect();
//! assert_eq!(names, ["id", "name", "width"]);
//! ```

mod field;

pub use field::{
    ComputeFn, Extraction, FieldDescriptor, JSON_SELF, PARENT, SemanticType,
};

use tmxgraph_assets::prelude::{DocumentFormat, RawNode};

use crate::document::{Document, EntryId};
use crate::error::LoadResult;

/// Post-load hook, run once per entry after the whole document is built.
pub type FinalizeFn = fn(&mut Document, EntryId) -> LoadResult<()>;

/// Ordered field list of an entity type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Append `field`, or replace an inherited field with the same name in place.
    pub fn push(&mut self, field: FieldDescriptor) {
        match self.fields.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Attribute (XML) and key (JSON) holding a specialization discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecializationKey {
    pub xml: &'static str,
    pub json: &'static str,
}

impl SpecializationKey {
    pub fn for_format(&self, format: DocumentFormat) -> &'static str {
        match format {
            DocumentFormat::Xml => self.xml,
            DocumentFormat::Json => self.json,
        }
    }
}

/// A registered entity type.
#[derive(Debug, Clone)]
pub struct EntityType {
    name: &'static str,
    base: Option<&'static str>,
    tag: Option<&'static str>,
    json_type: Option<&'static str>,
    schema: Schema,
    remote: bool,
    json_use_parent: bool,
    opaque: bool,
    child_tags: Option<&'static [&'static str]>,
    specialization: Option<SpecializationKey>,
    discriminant: Option<&'static str>,
    finalize: Option<FinalizeFn>,
}

impl EntityType {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            base: None,
            tag: None,
            json_type: None,
            schema: Schema::default(),
            remote: false,
            json_use_parent: false,
            opaque: false,
            child_tags: None,
            specialization: None,
            discriminant: None,
            finalize: None,
        }
    }

    /// Inherit `base`'s schema and loading behavior.
    ///
    /// The tag, specialization table and discriminant are not inherited.
    pub fn extends(mut self, base: &EntityType) -> Self {
        self.base = Some(base.name);
        self.json_type = base.json_type;
        self.remote = base.remote;
        self.json_use_parent = base.json_use_parent;
        self.opaque = base.opaque;
        self.child_tags = base.child_tags;
        self.finalize = base.finalize;
        let own = std::mem::take(&mut self.schema);
        self.schema = base.schema.clone();
        for field in own.fields {
            self.schema.push(field);
        }
        self
    }

    /// A subtype of `base` selected when `base`'s specialization key equals `discriminant`.
    ///
    /// ```rust
    /// use tmxgraph_core::TypeRegistry;
    /// use tmxgraph_core::entities::OBJECT_GROUP;
    /// use tmxgraph_core::schema::{EntityType, FieldDescriptor};
    ///
    /// let mut registry = TypeRegistry::with_defaults();
    /// let base = registry.get(OBJECT_GROUP).unwrap().clone();
    /// registry.register(
    ///     EntityType::specialize(&base, "SpawnGroup", "spawn")
    ///         .field(FieldDescriptor::int("team").default(0)),
    /// );
    /// assert!(registry.is_subtype("SpawnGroup", OBJECT_GROUP));
    /// ```
    pub fn specialize(base: &EntityType, name: &'static str, discriminant: &'static str) -> Self {
        let mut ty = Self::new(name).extends(base);
        ty.discriminant = Some(discriminant);
        ty
    }

    /// XML element name this type is built from.
    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Value of the JSON `type` key identifying this type among polymorphic siblings.
    pub fn json_type(mut self, json_type: &'static str) -> Self {
        self.json_type = Some(json_type);
        self
    }

    /// Allow the definition to live in another file referenced by `source`.
    pub fn remote(mut self) -> Self {
        self.remote = true;
        self
    }

    /// In JSON, build from the parent's node (the payload is flattened into the parent).
    pub fn json_use_parent(mut self) -> Self {
        self.json_use_parent = true;
        self
    }

    /// Keep the element but do not descend into its children.
    pub fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    /// Only descend into XML children with one of these tags. The rest stay in the raw node
    /// for computed fields to read.
    pub fn only_children(mut self, tags: &'static [&'static str]) -> Self {
        self.child_tags = Some(tags);
        self
    }

    /// Enable subtype selection on the given attribute (XML) and key (JSON).
    pub fn specialized_by(mut self, xml: &'static str, json: &'static str) -> Self {
        self.specialization = Some(SpecializationKey { xml, json });
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.schema.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        for field in fields {
            self.schema.push(field);
        }
        self
    }

    pub fn finalize_with(mut self, finalize: FinalizeFn) -> Self {
        self.finalize = Some(finalize);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base(&self) -> Option<&'static str> {
        self.base
    }

    pub fn xml_tag(&self) -> Option<&'static str> {
        self.tag
    }

    pub fn json_discriminant(&self) -> Option<&'static str> {
        self.json_type
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn uses_parent_json(&self) -> bool {
        self.json_use_parent
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Whether an XML child with `tag` is built as an entry of its own.
    pub fn builds_child(&self, tag: &str) -> bool {
        !self.opaque
            && self
                .child_tags
                .is_none_or(|tags| tags.contains(&tag))
    }

    pub fn specialization(&self) -> Option<SpecializationKey> {
        self.specialization
    }

    pub fn discriminant(&self) -> Option<&'static str> {
        self.discriminant
    }

    pub fn finalizer(&self) -> Option<FinalizeFn> {
        self.finalize
    }

    /// Read this type's specialization discriminant from `raw`.
    pub fn discriminant_of<'r>(&self, raw: &'r RawNode) -> Option<std::borrow::Cow<'r, str>> {
        let key = self.specialization?.for_format(raw.format());
        raw.scalar_text(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> EntityType {
        EntityType::new("Layer")
            .remote()
            .field(FieldDescriptor::int("id").default(0))
            .field(FieldDescriptor::float("opacity").default(1.0))
    }

    #[test]
    fn test_extends_inherits_then_appends() {
        let ty = EntityType::new("TileLayer")
            .extends(&layer())
            .field(FieldDescriptor::int("width"));

        let names: Vec<_> = ty.schema().iter().map(FieldDescriptor::name).collect();
        assert_eq!(names, ["id", "opacity", "width"]);
        assert_eq!(ty.base(), Some("Layer"));
        assert!(ty.is_remote());
    }

    #[test]
    fn test_child_tag_filter() {
        let data = EntityType::new("LayerData").only_children(&["chunk"]);
        assert!(data.builds_child("chunk"));
        assert!(!data.builds_child("tile"));
        assert!(layer().builds_child("tile"));
        assert!(!EntityType::new("Settings").opaque().builds_child("chunk"));
    }

    #[test]
    fn test_override_keeps_position() {
        let ty = EntityType::new("Faded")
            .extends(&layer())
            .field(FieldDescriptor::float("opacity").default(0.5));

        let opacity = ty.schema().get("opacity").unwrap();
        assert_eq!(opacity.default_value(), Some(&crate::value::Value::Float(0.5)));
        assert_eq!(ty.schema().iter().position(|f| f.name() == "opacity"), Some(1));
    }

    #[test]
    fn test_specialize_drops_tag() {
        let group = EntityType::new("Group")
            .tag("objectgroup")
            .specialized_by("class", "class");
        let spawn = EntityType::specialize(&group, "Spawn", "spawn");

        assert_eq!(spawn.xml_tag(), None);
        assert_eq!(spawn.discriminant(), Some("spawn"));
        assert_eq!(spawn.specialization(), None);
        assert_eq!(spawn.base(), Some("Group"));
    }

    #[test]
    fn test_discriminant_of() {
        let group = EntityType::new("Group").specialized_by("class", "type");
        let xml = RawNode::Xml(
            tmxgraph_assets::raw::XmlElement::new("objectgroup").with_attr("class", "spawn"),
        );
        let json = RawNode::Json(serde_json::json!({ "type": "spawn", "class": "other" }));

        assert_eq!(group.discriminant_of(&xml).as_deref(), Some("spawn"));
        assert_eq!(group.discriminant_of(&json).as_deref(), Some("spawn"));
    }
}
