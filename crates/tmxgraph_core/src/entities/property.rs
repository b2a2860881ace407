use tmxgraph_assets::prelude::RawNode;

use super::{PROPERTIES, PROPERTY};
use crate::document::{Document, EntryId};
use crate::error::LoadResult;
use crate::loader::FieldScope;
use crate::properties::{
    Properties, PropertyBagBuilder, PropertyValue, RawProperty, bag_from_json, decode_property,
};
use crate::schema::{EntityType, FieldDescriptor};
use crate::value::Value;

/// `<properties>`. Its bag is filled while loading and frozen in the finalize pass.
pub(super) fn properties_type() -> EntityType {
    EntityType::new(PROPERTIES)
        .tag("properties")
        .json_use_parent()
        .fields([
            FieldDescriptor::children("entries", PROPERTY),
            FieldDescriptor::computed("bag", fill_bag),
        ])
        .finalize_with(freeze_bag)
}

fn freeze_bag(doc: &mut Document, id: EntryId) -> LoadResult<()> {
    doc.freeze_properties(id);
    Ok(())
}

/// `<property>`. Text-valued properties keep their value in the element text.
pub(super) fn property_type() -> EntityType {
    EntityType::new(PROPERTY).tag("property").fields([
        FieldDescriptor::string("name"),
        FieldDescriptor::string("type").default("string"),
        FieldDescriptor::string("propertytype").optional(),
        FieldDescriptor::string("raw").rename("value").optional(),
        FieldDescriptor::text("text").optional(),
        FieldDescriptor::child("members", PROPERTIES).optional(),
        FieldDescriptor::computed("value", decode_value),
    ])
}

fn decode_value(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let text = |name| scope.value(name).and_then(Value::as_str);
    let name = text("name").unwrap_or_default();
    let kind = text("type").unwrap_or("string");

    if kind == "class" {
        let class = text("propertytype").unwrap_or_default();
        return Ok(Value::Property(PropertyValue::Class(class.to_string())));
    }

    let raw = text("raw").or_else(|| text("text")).unwrap_or_default();
    let value = decode_property(name, kind, RawProperty::Text(raw), scope.config().strict)?;
    Ok(Value::Property(value))
}

fn fill_bag(scope: &FieldScope<'_>) -> LoadResult<Value> {
    let bag = match scope.raw() {
        RawNode::Json(json) => bag_from_json(json, scope.config().strict)?,
        RawNode::Xml(_) => {
            let doc = scope.document();
            let mut bag = PropertyBagBuilder::new();
            for entry in scope.value("entries").map(Value::entries).unwrap_or_default() {
                let property = doc.entry(entry);
                if let (Some(name), Some(value)) = (
                    property.get_str("name"),
                    property.get("value").and_then(Value::as_property),
                ) {
                    bag.set(name, value.clone());
                }
            }
            bag
        }
    };
    Ok(Value::PropertyBuilder(bag))
}

/// Frozen properties of `owner` (a map, layer, tile, object, ...).
pub fn properties_of(doc: &Document, owner: EntryId) -> Option<&Properties> {
    let bag = doc.field(owner, "properties").and_then(Value::as_entry)?;
    doc.field(bag, "bag").and_then(Value::as_properties)
}

entity_view! {
    /// A single XML `<property>` element.
    PropertyView => PROPERTY
}

impl<'d> PropertyView<'d> {
    pub fn name(&self) -> &'d str {
        self.entry().get_str("name").unwrap_or_default()
    }

    /// Declared type name, `string` when absent.
    pub fn type_name(&self) -> &'d str {
        self.entry().get_str("type").unwrap_or("string")
    }

    pub fn value(&self) -> Option<&'d PropertyValue> {
        self.entry().get("value").and_then(Value::as_property)
    }

    /// Member values of a `class` property.
    pub fn members(&self) -> Option<&'d Properties> {
        let members = self.entry().get_entry("members")?;
        self.doc.field(members, "bag").and_then(Value::as_properties)
    }
}
