use std::path::Path;
use std::rc::Rc;

use serde_json::Value as JsonValue;
use tmxgraph_assets::prelude::RawNode;
use tmxgraph_assets::raw::XmlElement;
use tracing::{trace, warn};

use super::{FieldScope, Loader};
use crate::context::LoaderContext;
use crate::document::{Document, Entry, EntryId};
use crate::entities::GENERIC;
use crate::error::{LoadError, LoadResult};
use crate::registry::TypeRegistry;
use crate::schema::{EntityType, Extraction, FieldDescriptor, JSON_SELF, PARENT};
use crate::value::Value;

/// One load in progress: the document being assembled and its context.
pub(super) struct DocumentBuild<'l> {
    pub(super) loader: &'l Loader,
    pub(super) registry: &'l TypeRegistry,
    pub(super) document: Document,
    pub(super) context: LoaderContext,
}

impl<'l> DocumentBuild<'l> {
    pub(super) fn new(loader: &'l Loader, path: &Path) -> Self {
        Self {
            loader,
            registry: &loader.registry,
            document: Document::new(loader.registry.clone()),
            context: LoaderContext::new(path),
        }
    }

    /// Build the tree under `root_type`, then run the finalize pass.
    pub(super) fn run(mut self, root_type: &'l EntityType, raw: RawNode) -> LoadResult<Document> {
        let root = self.build_node(root_type, Rc::new(raw), None)?;
        let path = self.context.current_path().to_path_buf();
        let entry = self.document.entry_mut(root);
        // The root's source is the load path even when the root file itself points elsewhere
        entry.set_source(path.to_string_lossy().into_owned());
        if entry.file().is_none() {
            entry.set_file(path);
        }
        self.finalize()?;
        Ok(self.document)
    }

    /// Construct one entry (and its subtree) from `raw`.
    pub(super) fn build_node(
        &mut self,
        ty: &'l EntityType,
        raw: Rc<RawNode>,
        parent: Option<EntryId>,
    ) -> LoadResult<EntryId> {
        if ty.is_remote() && raw.has_key("source") {
            return self.build_remote(ty, &raw, parent);
        }

        let registry = self.registry;
        let ty = registry.specialize(ty, &raw);
        let tag = raw.tag().map(str::to_string);
        let id = self.document.alloc(Entry::new(ty.name(), tag, parent));
        self.context.bind_raw(id, Rc::clone(&raw));

        if !ty.is_opaque() {
            match raw.as_ref() {
                RawNode::Xml(element) => self.build_xml_children(ty, id, element)?,
                RawNode::Json(_) => self.build_json_children(ty, id)?,
            }
        }

        for field in ty.schema().iter() {
            if self.document.entry(id).has(field.name()) {
                continue;
            }
            let value = self.extract(ty, field, id, &raw)?;
            self.document.entry_mut(id).set(field.name(), value);
        }

        self.context.record(id);
        Ok(id)
    }

    fn build_xml_children(
        &mut self,
        ty: &EntityType,
        id: EntryId,
        element: &XmlElement,
    ) -> LoadResult<()> {
        let registry = self.registry;
        for child in element.children.iter().filter(|child| ty.builds_child(&child.tag)) {
            match registry.by_tag(&child.tag) {
                Some(child_type) => {
                    self.build_node(child_type, Rc::new(RawNode::Xml(child.clone())), Some(id))?;
                }
                None if self.loader.config.strict => {
                    return Err(LoadError::UnknownTag {
                        tag: child.tag.clone(),
                        path: self.context.current_path().to_path_buf(),
                    });
                }
                None => {
                    warn!(
                        "Unknown tag <{}> in {}, keeping it as a generic entry",
                        child.tag,
                        self.context.current_path().display()
                    );
                    let generic = self.document.alloc(Entry::new(
                        GENERIC,
                        Some(child.tag.clone()),
                        Some(id),
                    ));
                    self.context
                        .bind_raw(generic, Rc::new(RawNode::Xml(child.clone())));
                    self.context.record(generic);
                }
            }
        }
        Ok(())
    }

    /// JSON nodes carry no tags; children are discovered through the type's child fields.
    fn build_json_children(&mut self, ty: &'l EntityType, id: EntryId) -> LoadResult<()> {
        let registry = self.registry;
        let Some(raw) = self.context.raw_rc(id) else {
            return Ok(());
        };
        let Some(json) = raw.as_json() else {
            return Ok(());
        };

        for field in ty.schema().iter() {
            let Extraction::Child { keyed_by } = field.rule() else {
                continue;
            };
            let Some(target_name) = field.target() else {
                continue;
            };
            let target = registry
                .get(target_name)
                .ok_or_else(|| LoadError::UnknownEntityType(target_name.to_string()))?;

            if target.uses_parent_json() {
                if raw.has_key(field.json_key()) {
                    self.build_node(target, Rc::clone(&raw), Some(id))?;
                }
                continue;
            }

            let value = if field.json_key() == JSON_SELF {
                Some(json)
            } else {
                json.get(field.json_key())
            };
            let Some(value) = value.filter(|v| !matches!(v, JsonValue::Null | JsonValue::Bool(false)))
            else {
                continue;
            };

            match (field.is_array(), value, *keyed_by) {
                (true, JsonValue::Array(items), _) => {
                    for item in items {
                        self.build_json_child(ty, field, target, item, id)?;
                    }
                }
                (true, JsonValue::Object(items), Some(key_field)) => {
                    for (key, item) in items {
                        let child = self.build_json_child(ty, field, target, item, id)?;
                        let key = key
                            .parse::<i64>()
                            .map_or_else(|_| Value::Str(key.clone()), Value::Int);
                        self.document.entry_mut(child).set(key_field, key);
                    }
                }
                (true, other, _) => {
                    return Err(LoadError::InvalidValue {
                        field: field.name(),
                        entity: ty.name(),
                        value: other.to_string(),
                        expected: "array",
                    });
                }
                (false, item, _) => {
                    self.build_json_child(ty, field, target, item, id)?;
                }
            }
        }
        Ok(())
    }

    fn build_json_child(
        &mut self,
        owner: &EntityType,
        field: &FieldDescriptor,
        target: &'l EntityType,
        item: &JsonValue,
        parent: EntryId,
    ) -> LoadResult<EntryId> {
        let ty = self.resolve_json_type(owner, field, target, item)?;
        self.build_node(ty, Rc::new(RawNode::Json(item.clone())), Some(parent))
    }

    /// Pick the concrete type of a JSON child.
    ///
    /// With a single candidate no discriminant is consulted; otherwise the node's `type` key
    /// must select exactly one (nodes without the key select untyped candidates).
    fn resolve_json_type(
        &self,
        owner: &EntityType,
        field: &FieldDescriptor,
        target: &'l EntityType,
        item: &JsonValue,
    ) -> LoadResult<&'l EntityType> {
        let registry = self.registry;
        let candidates = registry.candidates(target.name());
        match candidates.as_slice() {
            [] => Ok(target),
            [only] => Ok(*only),
            _ => {
                let discriminant = item.get("type").and_then(JsonValue::as_str);
                let matching: Vec<&'l EntityType> = candidates
                    .iter()
                    .copied()
                    .filter(|candidate| candidate.json_discriminant() == discriminant)
                    .collect();
                match matching.as_slice() {
                    [only] => Ok(*only),
                    [] => Err(LoadError::NoMatchingPolymorphicType {
                        field: field.name(),
                        entity: owner.name(),
                        discriminant: discriminant.map(str::to_string),
                    }),
                    _ => Err(LoadError::AmbiguousPolymorphicType {
                        field: field.name(),
                        entity: owner.name(),
                        candidates: matching.iter().map(|ty| ty.name()).collect(),
                    }),
                }
            }
        }
    }

    fn extract(
        &mut self,
        ty: &EntityType,
        field: &FieldDescriptor,
        id: EntryId,
        raw: &RawNode,
    ) -> LoadResult<Value> {
        match field.rule() {
            Extraction::Attribute => extract_attribute(ty, field, raw),
            Extraction::Text => match raw {
                RawNode::Xml(element) => match &element.text {
                    Some(text) => Ok(Value::Str(text.clone())),
                    None => fallback(ty, field),
                },
                RawNode::Json(_) => extract_attribute(ty, field, raw),
            },
            Extraction::Child { .. } => self.select_children(ty, field, id),
            Extraction::Alias(target) => self.resolve_alias(ty, *target, id, raw),
            Extraction::Computed(compute) => {
                let scope = FieldScope {
                    loader: self.loader,
                    document: &self.document,
                    context: &self.context,
                    entry: id,
                    entity: ty,
                    field,
                    raw,
                };
                compute(&scope)
            }
        }
    }

    fn select_children(
        &self,
        ty: &EntityType,
        field: &FieldDescriptor,
        id: EntryId,
    ) -> LoadResult<Value> {
        let Some(target) = field.target() else {
            return fallback(ty, field);
        };
        let matches: Vec<EntryId> = self
            .document
            .children(id)
            .iter()
            .copied()
            .filter(|child| self.document.is_a(*child, target))
            .collect();

        if field.is_array() {
            return Ok(Value::List(matches.into_iter().map(Value::Entry).collect()));
        }
        match matches.as_slice() {
            [only] => Ok(Value::Entry(*only)),
            [] if field.is_optional() => fallback(ty, field),
            [] => Err(LoadError::NoMatchForRequiredChild {
                field: field.name(),
                entity: ty.name(),
                target,
            }),
            _ => Err(LoadError::MultipleMatchesForSingleChild {
                field: field.name(),
                entity: ty.name(),
                count: matches.len(),
            }),
        }
    }

    /// Forward to another field, extracting and caching it first if needed.
    fn resolve_alias(
        &mut self,
        ty: &EntityType,
        target: &'static str,
        id: EntryId,
        raw: &RawNode,
    ) -> LoadResult<Value> {
        if target == PARENT {
            return Ok(self
                .document
                .parent(id)
                .map_or(Value::Null, Value::Entry));
        }
        if let Some(value) = self.document.entry(id).get(target) {
            return Ok(value.clone());
        }

        let Some(target_field) = ty.schema().get(target) else {
            return Err(LoadError::MissingRequiredField {
                field: target,
                entity: ty.name(),
            });
        };
        let value = self.extract(ty, target_field, id, raw)?;
        self.document
            .entry_mut(id)
            .set(target_field.name(), value.clone());
        Ok(value)
    }

    /// Run every entry's finalize hook in creation order.
    fn finalize(&mut self) -> LoadResult<()> {
        let created = self.context.created().to_vec();
        for id in created {
            let kind = self.document.entry(id).kind();
            if let Some(finalize) = self.registry.get(kind).and_then(EntityType::finalizer) {
                trace!("Finalizing {kind} {id}");
                finalize(&mut self.document, id)?;
            }
        }
        Ok(())
    }
}

fn fallback(ty: &EntityType, field: &FieldDescriptor) -> LoadResult<Value> {
    if let Some(default) = field.default_value() {
        return Ok(default.clone());
    }
    if field.is_optional() {
        return Ok(Value::Null);
    }
    Err(LoadError::MissingRequiredField {
        field: field.name(),
        entity: ty.name(),
    })
}

fn extract_attribute(ty: &EntityType, field: &FieldDescriptor, raw: &RawNode) -> LoadResult<Value> {
    let semantic = field.semantic_type();
    let invalid = |value: String| LoadError::InvalidValue {
        field: field.name(),
        entity: ty.name(),
        value,
        expected: semantic.expected(),
    };

    match raw {
        RawNode::Xml(element) => {
            let Some(text) = element.attr(field.xml_key()) else {
                return fallback(ty, field);
            };
            if field.is_array() {
                return text
                    .split(',')
                    .map(|item| semantic.coerce_text(item).ok_or_else(|| invalid(item.to_string())))
                    .collect::<LoadResult<Vec<_>>>()
                    .map(Value::List);
            }
            semantic
                .coerce_text(text)
                .ok_or_else(|| invalid(text.to_string()))
        }
        RawNode::Json(json) => {
            let key = field.json_key();
            let value = if key == JSON_SELF { Some(json) } else { json.get(key) };
            match value {
                None | Some(JsonValue::Null) => fallback(ty, field),
                Some(JsonValue::Array(items)) if field.is_array() => items
                    .iter()
                    .map(|item| semantic.coerce_json(item).ok_or_else(|| invalid(item.to_string())))
                    .collect::<LoadResult<Vec<_>>>()
                    .map(Value::List),
                Some(value) => semantic
                    .coerce_json(value)
                    .ok_or_else(|| invalid(value.to_string())),
            }
        }
    }
}
