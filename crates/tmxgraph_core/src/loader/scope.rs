use std::path::{Path, PathBuf};

use tmxgraph_assets::prelude::{RawNode, resolve_relative_path};

use crate::config::LoaderConfig;
use crate::context::LoaderContext;
use crate::document::{Document, EntryId};
use crate::error::LoadError;
use crate::loader::{Loader, ResourceCallbacks};
use crate::schema::{EntityType, FieldDescriptor};
use crate::value::Value;

/// Everything a computed field can see while it runs.
///
/// The entry's children are complete, and its fields declared earlier in the schema are
/// already populated.
pub struct FieldScope<'a> {
    pub(crate) loader: &'a Loader,
    pub(crate) document: &'a Document,
    pub(crate) context: &'a LoaderContext,
    pub(crate) entry: EntryId,
    pub(crate) entity: &'a EntityType,
    pub(crate) field: &'a FieldDescriptor,
    pub(crate) raw: &'a RawNode,
}

impl<'a> FieldScope<'a> {
    pub fn entry_id(&self) -> EntryId {
        self.entry
    }

    pub fn entity(&self) -> &'a EntityType {
        self.entity
    }

    pub fn field(&self) -> &'a FieldDescriptor {
        self.field
    }

    /// Raw node the entry is being built from.
    pub fn raw(&self) -> &'a RawNode {
        self.raw
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn context(&self) -> &'a LoaderContext {
        self.context
    }

    pub fn config(&self) -> &'a LoaderConfig {
        &self.loader.config
    }

    pub fn callbacks(&self) -> &'a dyn ResourceCallbacks {
        self.loader.callbacks.as_ref()
    }

    /// A sibling field that has already been extracted.
    pub fn value(&self, name: &str) -> Option<&'a Value> {
        self.document.field(self.entry, name)
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.document.parent(self.entry)
    }

    /// Raw node of the parent entry.
    pub fn parent_raw(&self) -> Option<&'a RawNode> {
        self.parent().and_then(|parent| self.context.raw_of(parent))
    }

    /// Children of the entry whose type is `kind` or a subtype of it.
    pub fn children_of(&self, kind: &str) -> Vec<EntryId> {
        self.document
            .children(self.entry)
            .iter()
            .copied()
            .filter(|child| self.document.is_a(*child, kind))
            .collect()
    }

    /// File currently being read.
    pub fn current_path(&self) -> &'a Path {
        self.context.current_path()
    }

    /// Resolve a reference relative to the file currently being read.
    pub fn resolve_path(&self, reference: &str) -> PathBuf {
        resolve_relative_path(self.current_path(), reference)
    }

    /// Error for a raw value this field cannot accept.
    pub fn invalid(&self, value: impl Into<String>, expected: &'static str) -> LoadError {
        LoadError::InvalidValue {
            field: self.field.name(),
            entity: self.entity.name(),
            value: value.into(),
            expected,
        }
    }
}
