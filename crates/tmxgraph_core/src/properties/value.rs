use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value as JsonValue;

/// Declared type of a custom property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Bool,
    Int,
    /// `float`, or `number` in older documents
    Float,
    String,
    /// `#AARRGGBB` or `#RRGGBB`, kept as text
    Color,
    /// Path relative to the declaring file, kept as written
    File,
    /// Id of another object in the map
    Object,
    /// Custom class, the value is the `propertytype` name
    Class,
}

impl PropertyKind {
    /// Parse a Tiled `type` attribute. Returns `None` for names Tiled does not define.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => PropertyKind::Bool,
            "int" => PropertyKind::Int,
            "float" | "number" => PropertyKind::Float,
            "string" => PropertyKind::String,
            "color" => PropertyKind::Color,
            "file" => PropertyKind::File,
            "object" => PropertyKind::Object,
            "class" => PropertyKind::Class,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Float => "float",
            PropertyKind::String => "string",
            PropertyKind::Color => "color",
            PropertyKind::File => "file",
            PropertyKind::Object => "object",
            PropertyKind::Class => "class",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded property value.
///
/// Floats compare and hash by bit pattern so frozen bags can be used as map keys.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Color(String),
    File(String),
    Object(u32),
    Class(String),
}

impl PropertyValue {
    /// Decode property text according to `kind`.
    ///
    /// Booleans are `false` only for the text `false` (any letter case); every other text is
    /// truthy. Returns the offending text when a numeric kind does not parse.
    pub fn from_text(kind: PropertyKind, raw: &str) -> Result<Self, String> {
        let invalid = || raw.to_string();
        Ok(match kind {
            PropertyKind::Bool => PropertyValue::Bool(!raw.trim().eq_ignore_ascii_case("false")),
            PropertyKind::Int => PropertyValue::Int(raw.trim().parse().map_err(|_| invalid())?),
            PropertyKind::Float => {
                PropertyValue::Float(raw.trim().parse().map_err(|_| invalid())?)
            }
            PropertyKind::Object => {
                PropertyValue::Object(raw.trim().parse().map_err(|_| invalid())?)
            }
            PropertyKind::String => PropertyValue::String(raw.to_string()),
            PropertyKind::Color => PropertyValue::Color(raw.to_string()),
            PropertyKind::File => PropertyValue::File(raw.to_string()),
            PropertyKind::Class => PropertyValue::Class(raw.to_string()),
        })
    }

    /// Decode a JSON value according to `kind`.
    ///
    /// Native JSON booleans are taken as is; JSON numbers decode to booleans as zero/nonzero.
    pub fn from_json(kind: PropertyKind, raw: &JsonValue) -> Result<Self, String> {
        match (kind, raw) {
            (PropertyKind::Bool, JsonValue::Bool(b)) => Ok(PropertyValue::Bool(*b)),
            (PropertyKind::Bool, JsonValue::Number(n)) => {
                Ok(PropertyValue::Bool(n.as_f64().is_some_and(|n| n != 0.0)))
            }
            (PropertyKind::Int, JsonValue::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(PropertyValue::Int)
                .ok_or_else(|| n.to_string()),
            (PropertyKind::Float, JsonValue::Number(n)) => n
                .as_f64()
                .map(PropertyValue::Float)
                .ok_or_else(|| n.to_string()),
            (PropertyKind::Object, JsonValue::Number(n)) => n
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .map(PropertyValue::Object)
                .ok_or_else(|| n.to_string()),
            (_, JsonValue::String(text)) => Self::from_text(kind, text),
            (PropertyKind::Class, JsonValue::Object(_)) => {
                Ok(PropertyValue::Class(raw.to_string()))
            }
            (_, JsonValue::Null) => Self::from_text(kind, ""),
            (_, other) => Self::from_text(kind, &other.to_string()),
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Color(_) => PropertyKind::Color,
            PropertyValue::File(_) => PropertyKind::File,
            PropertyValue::Object(_) => PropertyKind::Object,
            PropertyValue::Class(_) => PropertyKind::Class,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            PropertyValue::Object(id) => Some(i64::from(*id)),
            _ => None,
        }
    }

    /// Numeric value; integers widen to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text of string-like kinds (string, color, file, class).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s)
            | PropertyValue::Color(s)
            | PropertyValue::File(s)
            | PropertyValue::Class(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::Int(a), PropertyValue::Int(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropertyValue::Object(a), PropertyValue::Object(b)) => a == b,
            (PropertyValue::String(a), PropertyValue::String(b))
            | (PropertyValue::Color(a), PropertyValue::Color(b))
            | (PropertyValue::File(a), PropertyValue::File(b))
            | (PropertyValue::Class(a), PropertyValue::Class(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropertyValue {}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            PropertyValue::Bool(b) => b.hash(state),
            PropertyValue::Int(i) => i.hash(state),
            PropertyValue::Float(f) => f.to_bits().hash(state),
            PropertyValue::Object(id) => id.hash(state),
            PropertyValue::String(s)
            | PropertyValue::Color(s)
            | PropertyValue::File(s)
            | PropertyValue::Class(s) => s.hash(state),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bool_text() {
        assert_eq!(
            PropertyValue::from_text(PropertyKind::Bool, "false"),
            Ok(PropertyValue::Bool(false))
        );
        assert_eq!(
            PropertyValue::from_text(PropertyKind::Bool, "FALSE"),
            Ok(PropertyValue::Bool(false))
        );
        assert_eq!(
            PropertyValue::from_text(PropertyKind::Bool, "true"),
            Ok(PropertyValue::Bool(true))
        );
        assert_eq!(
            PropertyValue::from_text(PropertyKind::Bool, "0"),
            Ok(PropertyValue::Bool(true))
        );
    }

    #[test]
    fn test_bool_json() {
        assert_eq!(
            PropertyValue::from_json(PropertyKind::Bool, &json!(0)),
            Ok(PropertyValue::Bool(false))
        );
        assert_eq!(
            PropertyValue::from_json(PropertyKind::Bool, &json!(2)),
            Ok(PropertyValue::Bool(true))
        );
        assert_eq!(
            PropertyValue::from_json(PropertyKind::Bool, &json!(false)),
            Ok(PropertyValue::Bool(false))
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            PropertyValue::from_text(PropertyKind::Int, " 42 "),
            Ok(PropertyValue::Int(42))
        );
        assert_eq!(
            PropertyValue::from_text(PropertyKind::Int, "4.5"),
            Err("4.5".to_string())
        );
        assert_eq!(
            PropertyValue::from_json(PropertyKind::Float, &json!(1)),
            Ok(PropertyValue::Float(1.0))
        );
        assert_eq!(PropertyKind::parse("number"), Some(PropertyKind::Float));
        assert_eq!(PropertyKind::parse("vector"), None);
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(PropertyValue::Float(f64::NAN), PropertyValue::Float(f64::NAN));
        assert_ne!(PropertyValue::Float(0.0), PropertyValue::Float(-0.0));
        assert_ne!(
            PropertyValue::String("a".into()),
            PropertyValue::File("a".into())
        );
    }
}
