//! Custom properties.
//!
//! A bag is filled through a [`PropertyBagBuilder`] while its entry loads and frozen into
//! [`Properties`] in the finalize pass. Decoding follows the property's declared type.

mod bag;
mod value;

pub use bag::{Properties, PropertyBagBuilder};
pub use value::{PropertyKind, PropertyValue};

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::entities::PROPERTY;
use crate::error::{LoadError, LoadResult};

/// Raw property payload before decoding.
#[derive(Debug, Clone, Copy)]
pub enum RawProperty<'a> {
    Text(&'a str),
    Json(&'a JsonValue),
}

impl RawProperty<'_> {
    fn to_text(self) -> String {
        match self {
            RawProperty::Text(text) => text.to_string(),
            RawProperty::Json(JsonValue::String(text)) => text.clone(),
            RawProperty::Json(other) => other.to_string(),
        }
    }
}

/// Decode one `(name, type, raw)` triple.
///
/// Unrecognized type names are an error in `strict` mode; otherwise the raw text is kept as a
/// string value and a warning is logged.
pub fn decode_property(
    name: &str,
    kind: &str,
    raw: RawProperty<'_>,
    strict: bool,
) -> LoadResult<PropertyValue> {
    let Some(parsed) = PropertyKind::parse(kind) else {
        if strict {
            return Err(LoadError::InvalidPropertyType {
                name: name.to_string(),
                kind: kind.to_string(),
            });
        }
        warn!("Property '{name}' has unrecognized type '{kind}', keeping raw text");
        return Ok(PropertyValue::String(raw.to_text()));
    };

    let decoded = match raw {
        RawProperty::Text(text) => PropertyValue::from_text(parsed, text),
        RawProperty::Json(value) => PropertyValue::from_json(parsed, value),
    };
    decoded.map_err(|value| LoadError::InvalidValue {
        field: "value",
        entity: PROPERTY,
        value,
        expected: parsed.as_str(),
    })
}

/// Fill a builder from the `properties` key of a JSON node.
///
/// Accepts both encodings Tiled has used:
/// - an array of `{ "name", "type", "value" }` objects
/// - a `name -> value` object with a parallel `propertytypes` object (`string` when absent)
pub fn bag_from_json(node: &JsonValue, strict: bool) -> LoadResult<PropertyBagBuilder> {
    let mut bag = PropertyBagBuilder::new();

    match node.get("properties") {
        Some(JsonValue::Array(entries)) => {
            for entry in entries {
                let Some(name) = entry.get("name").and_then(JsonValue::as_str) else {
                    return Err(LoadError::MissingRequiredField {
                        field: "name",
                        entity: PROPERTY,
                    });
                };
                let kind = entry
                    .get("type")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("string");
                let raw = entry.get("value").unwrap_or(&JsonValue::Null);
                let value = match (kind, entry.get("propertytype")) {
                    ("class", Some(JsonValue::String(class))) => {
                        PropertyValue::Class(class.clone())
                    }
                    _ => decode_property(name, kind, RawProperty::Json(raw), strict)?,
                };
                bag.set(name, value);
            }
        }
        Some(JsonValue::Object(values)) => {
            let types = node.get("propertytypes");
            for (name, raw) in values {
                let kind = types
                    .and_then(|types| types.get(name))
                    .and_then(JsonValue::as_str)
                    .unwrap_or("string");
                bag.set(
                    name.as_str(),
                    decode_property(name, kind, RawProperty::Json(raw), strict)?,
                );
            }
        }
        _ => {}
    }

    Ok(bag)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_strict_rejects_unknown_type() {
        let result = decode_property("p", "vector", RawProperty::Text("1,2"), true);
        assert!(matches!(result, Err(LoadError::InvalidPropertyType { .. })));
    }

    #[test]
    fn test_decode_lenient_keeps_text() {
        let value = decode_property("p", "vector", RawProperty::Text("1,2"), false).unwrap();
        assert_eq!(value, PropertyValue::String("1,2".into()));
    }

    #[test]
    fn test_decode_invalid_number() {
        let result = decode_property("hp", "int", RawProperty::Text("lots"), true);
        assert!(matches!(
            result,
            Err(LoadError::InvalidValue { expected: "int", .. })
        ));
    }

    #[test]
    fn test_parallel_maps() {
        let node = json!({
            "properties": { "visible": "false", "hp": 3, "title": "gate" },
            "propertytypes": { "visible": "bool", "hp": "int" }
        });
        let bag = bag_from_json(&node, true).unwrap().freeze();

        assert_eq!(bag["visible"], PropertyValue::Bool(false));
        assert_eq!(bag["hp"], PropertyValue::Int(3));
        assert_eq!(bag["title"], PropertyValue::String("gate".into()));
    }

    #[test]
    fn test_array_form() {
        let node = json!({
            "properties": [
                { "name": "solid", "type": "bool", "value": true },
                { "name": "speed", "type": "float", "value": 1.5 },
                { "name": "target", "type": "object", "value": 12 },
                { "name": "stats", "type": "class", "propertytype": "Stats", "value": {} }
            ]
        });
        let bag = bag_from_json(&node, true).unwrap().freeze();

        assert_eq!(bag["solid"], PropertyValue::Bool(true));
        assert_eq!(bag["speed"], PropertyValue::Float(1.5));
        assert_eq!(bag["target"], PropertyValue::Object(12));
        assert_eq!(bag["stats"], PropertyValue::Class("Stats".into()));
    }

    #[test]
    fn test_no_properties() {
        assert!(bag_from_json(&json!({ "name": "x" }), true).unwrap().is_empty());
    }
}
