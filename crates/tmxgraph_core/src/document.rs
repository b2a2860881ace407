//! The loaded document graph.
//!
//! Entries live in a single arena owned by the [`Document`]; parent and child links are
//! [`EntryId`] indices into it. The root is always the first entry allocated.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tmxgraph_assets::prelude::resolve_relative_path;

use crate::error::{LoadError, LoadResult};
use crate::properties::{PropertyBagBuilder, PropertyValue, Properties};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Index of an entry inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u32);

impl EntryId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of the document graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    kind: &'static str,
    tag: Option<String>,
    parent: Option<EntryId>,
    children: Vec<EntryId>,
    fields: Vec<(&'static str, Value)>,
    source: Option<String>,
    file: Option<PathBuf>,
}

impl Entry {
    pub(crate) fn new(kind: &'static str, tag: Option<String>, parent: Option<EntryId>) -> Self {
        Self {
            kind,
            tag,
            parent,
            children: Vec::new(),
            fields: Vec::new(),
            source: None,
            file: None,
        }
    }

    /// Name of the entity type this entry was built as.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// XML element name the entry was built from, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub fn children(&self) -> &[EntryId] {
        &self.children
    }

    /// The `source` reference this entry was loaded through, as written in the referencing
    /// file (or the load path, for the root).
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Resolved path of the file this entry was read from. Only set on the root and on
    /// entries loaded through `source`.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Fields in extraction order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn get_int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_int)
    }

    pub fn get_float(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_float)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_entry(&self, field: &str) -> Option<EntryId> {
        self.get(field).and_then(Value::as_entry)
    }

    /// Entry ids stored in a child or child-list field.
    pub fn get_entries(&self, field: &str) -> Vec<EntryId> {
        self.get(field).map(Value::entries).unwrap_or_default()
    }

    pub(crate) fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    pub(crate) fn set(&mut self, field: &'static str, value: Value) {
        match self.get_mut(field) {
            Some(slot) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    pub(crate) fn push_child(&mut self, child: EntryId) {
        self.children.push(child);
    }

    pub(crate) fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    pub(crate) fn set_file(&mut self, file: impl Into<PathBuf>) {
        self.file = Some(file.into());
    }
}

/// A fully loaded document.
///
/// Two documents are equal when their entry graphs are equal; the registry they were built
/// with is not compared.
#[derive(Clone)]
pub struct Document {
    registry: Arc<TypeRegistry>,
    entries: Vec<Entry>,
}

impl Document {
    pub(crate) fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            entries: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, entry: Entry) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        if let Some(parent) = entry.parent {
            self.entry_mut(parent).push_child(id);
        }
        self.entries.push(entry);
        id
    }

    pub(crate) fn entry_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id.index()]
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn root(&self) -> EntryId {
        EntryId(0)
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id.index())
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this document.
    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in allocation (pre-order) order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (EntryId(index as u32), entry))
    }

    pub fn field(&self, id: EntryId, field: &str) -> Option<&Value> {
        self.get(id).and_then(|entry| entry.get(field))
    }

    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.get(id).and_then(Entry::parent)
    }

    pub fn children(&self, id: EntryId) -> &[EntryId] {
        self.get(id).map(Entry::children).unwrap_or_default()
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Whether the entry's type is `kind` or one of its subtypes.
    pub fn is_a(&self, id: EntryId, kind: &str) -> bool {
        self.get(id)
            .is_some_and(|entry| self.registry.is_subtype(entry.kind(), kind))
    }

    /// Nearest ancestor (or `id` itself) of type `kind`.
    pub fn find_ancestor(&self, id: EntryId, kind: &str) -> Option<EntryId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|candidate| self.is_a(*candidate, kind))
    }

    /// The nearest recorded source, walking up from `id`.
    pub fn source_of(&self, id: EntryId) -> Option<&str> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|candidate| self.get(candidate).and_then(Entry::source))
    }

    /// The path the document was loaded from.
    pub fn filename(&self) -> Option<&str> {
        self.get(self.root()).and_then(Entry::source)
    }

    /// Resolve `reference` as written inside the file that defines `id`.
    ///
    /// The nearest entry (`id` itself or an ancestor) read from its own file decides the base
    /// directory, so an image referenced from an external tileset resolves against the
    /// tileset's directory, however many `source` hops led there.
    pub fn resource_path(&self, id: EntryId, reference: &str) -> PathBuf {
        let file = std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|candidate| self.get(candidate).and_then(Entry::file))
            .unwrap_or(Path::new("."));
        resolve_relative_path(file, reference)
    }

    fn bag_builder_mut(&mut self, id: EntryId, key: &str) -> LoadResult<&mut PropertyBagBuilder> {
        let missing = || LoadError::MissingRequiredField {
            field: "bag",
            entity: crate::entities::PROPERTIES,
        };
        let entry = self.entries.get_mut(id.index()).ok_or_else(missing)?;
        match entry.get_mut("bag") {
            Some(Value::PropertyBuilder(bag)) => Ok(bag),
            Some(Value::Properties(_)) => Err(LoadError::FrozenMutation {
                key: key.to_string(),
            }),
            _ => Err(missing()),
        }
    }

    /// Set a property on the bag of the Properties entry `id`.
    ///
    /// Bags are frozen by the finalize pass, so this only succeeds from finalize hooks that run
    /// before the bag's own entry is finalized.
    pub fn set_property(
        &mut self,
        id: EntryId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> LoadResult<Option<PropertyValue>> {
        Ok(self.bag_builder_mut(id, key)?.set(key, value))
    }

    pub fn remove_property(&mut self, id: EntryId, key: &str) -> LoadResult<Option<PropertyValue>> {
        Ok(self.bag_builder_mut(id, key)?.remove(key))
    }

    pub fn clear_properties(&mut self, id: EntryId) -> LoadResult<()> {
        self.bag_builder_mut(id, "*")?.clear();
        Ok(())
    }

    pub fn merge_properties(&mut self, id: EntryId, other: &Properties) -> LoadResult<()> {
        self.bag_builder_mut(id, "*")?.merge(other);
        Ok(())
    }

    /// Freeze the bag of Properties entry `id`. Already frozen bags are left untouched.
    pub(crate) fn freeze_properties(&mut self, id: EntryId) {
        let entry = self.entry_mut(id);
        if let Some(slot) = entry.get_mut("bag")
            && let Value::PropertyBuilder(builder) = slot
        {
            let frozen = std::mem::take(builder).freeze();
            *slot = Value::Properties(frozen);
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> (Document, EntryId, EntryId, EntryId) {
        let mut doc = Document::new(Arc::new(TypeRegistry::with_defaults()));

        let mut root = Entry::new("Map", Some("map".into()), None);
        root.set_source("/game/maps/level.tmx");
        root.set_file("/game/maps/level.tmx");
        let root = doc.alloc(root);

        let mut tileset = Entry::new("Tileset", Some("tileset".into()), Some(root));
        tileset.set_source("../tilesets/dungeon.tsx");
        tileset.set_file("/game/tilesets/dungeon.tsx");
        let tileset = doc.alloc(tileset);

        let image = doc.alloc(Entry::new("Image", Some("image".into()), Some(tileset)));
        (doc, root, tileset, image)
    }

    #[test]
    fn test_alloc_links_children() {
        let (doc, root, tileset, image) = document();
        assert_eq!(doc.root(), root);
        assert_eq!(doc.children(root), &[tileset]);
        assert_eq!(doc.parent(image), Some(tileset));
        assert_eq!(doc.ancestors(image).collect::<Vec<_>>(), vec![tileset, root]);
    }

    #[test]
    fn test_source_navigation() {
        let (doc, _, _, image) = document();
        assert_eq!(doc.filename(), Some("/game/maps/level.tmx"));
        assert_eq!(doc.source_of(image), Some("../tilesets/dungeon.tsx"));
        assert_eq!(
            doc.resource_path(image, "dungeon.png"),
            PathBuf::from("/game/tilesets/dungeon.png")
        );
        assert_eq!(
            doc.resource_path(doc.root(), "bg.png"),
            PathBuf::from("/game/maps/bg.png")
        );
    }

    #[test]
    fn test_is_a_and_find_ancestor() {
        let (doc, root, tileset, image) = document();
        assert!(doc.is_a(tileset, "Tileset"));
        assert!(!doc.is_a(tileset, "Map"));
        assert_eq!(doc.find_ancestor(image, "Map"), Some(root));
        assert_eq!(doc.find_ancestor(image, "Image"), Some(image));
    }

    #[test]
    fn test_property_mutation_until_frozen() {
        let (mut doc, root, _, _) = document();
        let mut bag = Entry::new("Properties", None, Some(root));
        bag.set("bag", Value::PropertyBuilder(PropertyBagBuilder::new()));
        let bag = doc.alloc(bag);

        assert_eq!(doc.set_property(bag, "visible", false).unwrap(), None);
        doc.freeze_properties(bag);

        assert!(matches!(
            doc.set_property(bag, "visible", true),
            Err(LoadError::FrozenMutation { key }) if key == "visible"
        ));
        assert!(matches!(
            doc.clear_properties(bag),
            Err(LoadError::FrozenMutation { .. })
        ));
        let frozen = doc.field(bag, "bag").and_then(Value::as_properties).unwrap();
        assert_eq!(frozen["visible"], PropertyValue::Bool(false));
    }

    #[test]
    fn test_field_overwrite() {
        let mut entry = Entry::new("Tile", None, None);
        entry.set("id", Value::Null);
        entry.set("id", Value::Int(4));
        assert_eq!(entry.get_int("id"), Some(4));
        assert_eq!(entry.fields().count(), 1);
    }
}
