//! Schema-agnostic raw node model.
//!
//! Both encodings of a Tiled document are read into a [`RawNode`]: XML documents become a tree
//! of [`XmlElement`]s, JSON documents stay as [`serde_json::Value`]s. The core crate decides how
//! each node maps onto an entity.

use std::borrow::Cow;

use serde_json::Value;

use crate::loaders::DocumentFormat;

/// An XML element with ordered attributes, ordered element children and its text payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Element name (local part, namespaces are not used by Tiled)
    pub tag: String,

    /// Attributes in document order
    pub attributes: Vec<(String, String)>,

    /// Element children in document order
    pub children: Vec<XmlElement>,

    /// Concatenated character data directly inside this element.
    ///
    /// `None` when the element has no character data at all.
    pub text: Option<String>,
}

impl XmlElement {
    /// Create an element with no attributes, children or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place to keep attribute order stable.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }
}

/// A node of a raw document in either encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    Xml(XmlElement),
    Json(Value),
}

impl RawNode {
    /// Encoding this node was read from.
    pub fn format(&self) -> DocumentFormat {
        match self {
            RawNode::Xml(_) => DocumentFormat::Xml,
            RawNode::Json(_) => DocumentFormat::Json,
        }
    }

    /// XML element name. JSON nodes carry no tag.
    pub fn tag(&self) -> Option<&str> {
        match self {
            RawNode::Xml(element) => Some(&element.tag),
            RawNode::Json(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            RawNode::Xml(element) => Some(element),
            RawNode::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RawNode::Json(value) => Some(value),
            RawNode::Xml(_) => None,
        }
    }

    /// Whether the node carries the attribute (XML) or key (JSON) `key`.
    pub fn has_key(&self, key: &str) -> bool {
        match self {
            RawNode::Xml(element) => element.attr(key).is_some(),
            RawNode::Json(Value::Object(map)) => map.contains_key(key),
            RawNode::Json(_) => false,
        }
    }

    /// Read an attribute (XML) or scalar key (JSON) as text.
    ///
    /// JSON numbers and booleans are rendered with their JSON spelling; arrays, objects and
    /// `null` yield `None`.
    pub fn scalar_text(&self, key: &str) -> Option<Cow<'_, str>> {
        match self {
            RawNode::Xml(element) => element.attr(key).map(Cow::Borrowed),
            RawNode::Json(Value::Object(map)) => map.get(key).and_then(json_scalar_text),
            RawNode::Json(_) => None,
        }
    }

    /// Remove an attribute (XML) or key (JSON), returning its scalar text if it had one.
    pub fn remove_key(&mut self, key: &str) -> Option<String> {
        match self {
            RawNode::Xml(element) => element.remove_attr(key),
            RawNode::Json(Value::Object(map)) => map
                .shift_remove(key)
                .and_then(|value| json_scalar_text(&value).map(Cow::into_owned)),
            RawNode::Json(_) => None,
        }
    }

    /// Overlay every attribute/key of `referencing` onto this node, `referencing` winning.
    ///
    /// Works across encodings: XML attribute text becomes a JSON string, JSON scalars become
    /// XML attribute text. Non-scalar JSON values (arrays, objects) cannot be expressed as XML
    /// attributes and are skipped when overlaying onto an XML node.
    pub fn overlay(&mut self, referencing: &RawNode) {
        match (self, referencing) {
            (RawNode::Xml(target), RawNode::Xml(source)) => {
                for (key, value) in &source.attributes {
                    target.set_attr(key.clone(), value.clone());
                }
            }
            (RawNode::Xml(target), RawNode::Json(Value::Object(source))) => {
                for (key, value) in source {
                    if let Some(text) = json_scalar_text(value) {
                        target.set_attr(key.clone(), text.into_owned());
                    }
                }
            }
            (RawNode::Json(Value::Object(target)), RawNode::Xml(source)) => {
                for (key, value) in &source.attributes {
                    target.insert(key.clone(), Value::String(value.clone()));
                }
            }
            (RawNode::Json(Value::Object(target)), RawNode::Json(Value::Object(source))) => {
                for (key, value) in source {
                    target.insert(key.clone(), value.clone());
                }
            }
            _ => {}
        }
    }
}

fn json_scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_attr_keeps_order() {
        let mut element = XmlElement::new("tileset")
            .with_attr("firstgid", "1")
            .with_attr("source", "a.tsx");
        element.set_attr("firstgid", "5");

        assert_eq!(element.attributes[0], ("firstgid".into(), "5".into()));
        assert_eq!(element.attr("source"), Some("a.tsx"));
    }

    #[test]
    fn test_overlay_xml_onto_xml() {
        let mut remote = RawNode::Xml(
            XmlElement::new("tileset")
                .with_attr("firstgid", "1")
                .with_attr("tilecount", "4"),
        );
        let referencing = RawNode::Xml(
            XmlElement::new("tileset")
                .with_attr("firstgid", "5")
                .with_attr("source", "tiles.tsx"),
        );

        remote.overlay(&referencing);
        remote.remove_key("source");

        assert_eq!(remote.scalar_text("firstgid").as_deref(), Some("5"));
        assert_eq!(remote.scalar_text("tilecount").as_deref(), Some("4"));
        assert!(!remote.has_key("source"));
    }

    #[test]
    fn test_overlay_json_onto_xml() {
        let mut remote = RawNode::Xml(XmlElement::new("tileset").with_attr("firstgid", "1"));
        let referencing = RawNode::Json(json!({
            "firstgid": 9,
            "source": "tiles.tsx",
            "properties": [1, 2]
        }));

        remote.overlay(&referencing);

        assert_eq!(remote.scalar_text("firstgid").as_deref(), Some("9"));
        assert!(!remote.has_key("properties"));
    }

    #[test]
    fn test_overlay_xml_onto_json() {
        let mut remote = RawNode::Json(json!({ "firstgid": 1, "columns": 8 }));
        let referencing = RawNode::Xml(XmlElement::new("tileset").with_attr("firstgid", "3"));

        remote.overlay(&referencing);

        assert_eq!(remote.as_json(), Some(&json!({ "firstgid": "3", "columns": 8 })));
    }

    #[test]
    fn test_scalar_text_json_kinds() {
        let node = RawNode::Json(json!({ "a": 1.5, "b": true, "c": "x", "d": [1], "e": null }));

        assert_eq!(node.scalar_text("a").as_deref(), Some("1.5"));
        assert_eq!(node.scalar_text("b").as_deref(), Some("true"));
        assert_eq!(node.scalar_text("c").as_deref(), Some("x"));
        assert_eq!(node.scalar_text("d"), None);
        assert_eq!(node.scalar_text("e"), None);
        assert!(node.has_key("e"));
    }
}
