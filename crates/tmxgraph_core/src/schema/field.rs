use serde_json::Value as JsonValue;

use crate::error::LoadResult;
use crate::loader::FieldScope;
use crate::value::Value;

/// JSON key meaning "the node itself" rather than one of its keys.
pub const JSON_SELF: &str = ".";

/// Alias target that resolves to the entry's parent.
pub const PARENT: &str = "parent";

/// Computes a field from the partially loaded entry.
pub type ComputeFn = fn(&FieldScope<'_>) -> LoadResult<Value>;

/// Target type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Bool,
    Int,
    Float,
    Str,
    /// A child entry of the named entity type (or any of its subtypes)
    Entity(&'static str),
    /// Whatever a computed field produces
    Any,
}

impl SemanticType {
    /// Coerce attribute text. `None` when the text is not a valid value of this type.
    pub fn coerce_text(&self, text: &str) -> Option<Value> {
        match self {
            SemanticType::Bool => {
                let trimmed = text.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    trimmed.parse::<i64>().ok().map(|n| Value::Bool(n != 0))
                }
            }
            SemanticType::Int => text.trim().parse().ok().map(Value::Int),
            SemanticType::Float => text.trim().parse().ok().map(Value::Float),
            SemanticType::Str | SemanticType::Entity(_) | SemanticType::Any => {
                Some(Value::Str(text.to_string()))
            }
        }
    }

    /// Coerce a JSON value. `None` when the value is not a valid value of this type.
    pub fn coerce_json(&self, value: &JsonValue) -> Option<Value> {
        match (self, value) {
            (_, JsonValue::String(text)) => self.coerce_text(text),
            (SemanticType::Bool, JsonValue::Bool(b)) => Some(Value::Bool(*b)),
            (SemanticType::Bool, JsonValue::Number(n)) => {
                n.as_f64().map(|n| Value::Bool(n != 0.0))
            }
            (SemanticType::Int, JsonValue::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Value::Int),
            (SemanticType::Float, JsonValue::Number(n)) => n.as_f64().map(Value::Float),
            (
                SemanticType::Str | SemanticType::Entity(_) | SemanticType::Any,
                JsonValue::Number(_) | JsonValue::Bool(_),
            ) => Some(Value::Str(value.to_string())),
            _ => None,
        }
    }

    pub fn expected(&self) -> &'static str {
        match self {
            SemanticType::Bool => "bool",
            SemanticType::Int => "integer",
            SemanticType::Float => "number",
            SemanticType::Str => "string",
            SemanticType::Entity(name) => *name,
            SemanticType::Any => "value",
        }
    }
}

/// How a field obtains its value.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Named attribute (XML) or key (JSON)
    Attribute,
    /// Already-built children whose type is a subtype of the field's target.
    ///
    /// In JSON, a child list stored as an object is keyed by the `keyed_by` field, which is
    /// assigned on each child after it is built.
    Child { keyed_by: Option<&'static str> },
    /// Text content of the element (XML); the field's key (JSON)
    Text,
    /// Another field of the same entry, or [`PARENT`]
    Alias(&'static str),
    Computed(ComputeFn),
}

/// Static description of one field of an entity type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    ty: SemanticType,
    array: bool,
    optional: bool,
    default: Option<Value>,
    xml_name: Option<&'static str>,
    json_name: Option<&'static str>,
    rule: Extraction,
}

impl FieldDescriptor {
    pub fn attribute(name: &'static str, ty: SemanticType) -> Self {
        Self {
            name,
            ty,
            array: false,
            optional: false,
            default: None,
            xml_name: None,
            json_name: None,
            rule: Extraction::Attribute,
        }
    }

    pub fn bool(name: &'static str) -> Self {
        Self::attribute(name, SemanticType::Bool)
    }

    pub fn int(name: &'static str) -> Self {
        Self::attribute(name, SemanticType::Int)
    }

    pub fn float(name: &'static str) -> Self {
        Self::attribute(name, SemanticType::Float)
    }

    pub fn string(name: &'static str) -> Self {
        Self::attribute(name, SemanticType::Str)
    }

    /// Single child of type `target`.
    pub fn child(name: &'static str, target: &'static str) -> Self {
        Self {
            rule: Extraction::Child { keyed_by: None },
            ..Self::attribute(name, SemanticType::Entity(target))
        }
    }

    /// Every child of type `target`, in document order.
    pub fn children(name: &'static str, target: &'static str) -> Self {
        Self {
            array: true,
            ..Self::child(name, target)
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self {
            rule: Extraction::Text,
            ..Self::attribute(name, SemanticType::Str)
        }
    }

    pub fn alias(name: &'static str, target: &'static str) -> Self {
        Self {
            rule: Extraction::Alias(target),
            ..Self::attribute(name, SemanticType::Any)
        }
    }

    pub fn computed(name: &'static str, compute: ComputeFn) -> Self {
        Self {
            rule: Extraction::Computed(compute),
            ..Self::attribute(name, SemanticType::Any)
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value used when the field is absent. Implies optional.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Read the field from `key` in both encodings.
    pub fn rename(self, key: &'static str) -> Self {
        self.xml_name(key).json_name(key)
    }

    pub fn xml_name(mut self, key: &'static str) -> Self {
        self.xml_name = Some(key);
        self
    }

    pub fn json_name(mut self, key: &'static str) -> Self {
        self.json_name = Some(key);
        self
    }

    /// In JSON, read the field from the node itself instead of one of its keys.
    pub fn json_self(self) -> Self {
        self.json_name(JSON_SELF)
    }

    /// Accept a JSON object of children keyed by the child's `key` field.
    pub fn keyed_by(mut self, key: &'static str) -> Self {
        if let Extraction::Child { keyed_by } = &mut self.rule {
            *keyed_by = Some(key);
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.ty
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn rule(&self) -> &Extraction {
        &self.rule
    }

    pub fn xml_key(&self) -> &'static str {
        self.xml_name.unwrap_or(self.name)
    }

    pub fn json_key(&self) -> &'static str {
        self.json_name.unwrap_or(self.name)
    }

    /// Target entity type of a child field.
    pub fn target(&self) -> Option<&'static str> {
        match (&self.rule, self.ty) {
            (Extraction::Child { .. }, SemanticType::Entity(target)) => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_implies_optional() {
        let field = FieldDescriptor::float("opacity").default(1.0);
        assert!(field.is_optional());
        assert_eq!(field.default_value(), Some(&Value::Float(1.0)));
        assert!(!FieldDescriptor::int("width").is_optional());
    }

    #[test]
    fn test_independent_renames() {
        let field = FieldDescriptor::string("type")
            .xml_name("class")
            .json_name("type");
        assert_eq!(field.xml_key(), "class");
        assert_eq!(field.json_key(), "type");

        let field = FieldDescriptor::int("width").rename("imagewidth");
        assert_eq!(field.xml_key(), "imagewidth");
        assert_eq!(field.json_key(), "imagewidth");
    }

    #[test]
    fn test_bool_coercion() {
        let ty = SemanticType::Bool;
        assert_eq!(ty.coerce_text("1"), Some(Value::Bool(true)));
        assert_eq!(ty.coerce_text("0"), Some(Value::Bool(false)));
        assert_eq!(ty.coerce_text("False"), Some(Value::Bool(false)));
        assert_eq!(ty.coerce_text("maybe"), None);
        assert_eq!(ty.coerce_json(&json!(0)), Some(Value::Bool(false)));
        assert_eq!(ty.coerce_json(&json!(true)), Some(Value::Bool(true)));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(SemanticType::Int.coerce_text(" 12 "), Some(Value::Int(12)));
        assert_eq!(SemanticType::Int.coerce_text("1.5"), None);
        assert_eq!(SemanticType::Int.coerce_json(&json!(3.0)), Some(Value::Int(3)));
        assert_eq!(SemanticType::Float.coerce_json(&json!(2)), Some(Value::Float(2.0)));
        assert_eq!(SemanticType::Str.coerce_json(&json!(7)), Some(Value::Str("7".into())));
        assert_eq!(SemanticType::Str.coerce_json(&json!([1])), None);
    }

    #[test]
    fn test_child_target() {
        let field = FieldDescriptor::children("tiles", "Tile").keyed_by("id");
        assert_eq!(field.target(), Some("Tile"));
        assert!(field.is_array());
        assert!(matches!(
            field.rule(),
            Extraction::Child { keyed_by: Some("id") }
        ));
        assert_eq!(FieldDescriptor::int("id").target(), None);
    }
}
