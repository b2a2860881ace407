//! XML to [`XmlElement`] tree conversion.

use std::io::Read;
use std::path::Path;

use xml::reader::{ParserConfig, XmlEvent};

use crate::error::AssetError;
use crate::raw::XmlElement;

/// Parse an XML document into its root element.
///
/// Comments and processing instructions are dropped. Character data (including CDATA and
/// whitespace) is kept verbatim so that multi-line property values and CSV payloads survive.
pub fn parse_element_tree<R: Read>(source: R, path: &Path) -> Result<XmlElement, AssetError> {
    let reader = ParserConfig::new()
        .trim_whitespace(false)
        .whitespace_to_characters(true)
        .cdata_to_characters(true)
        .ignore_comments(true)
        .coalesce_characters(true)
        .create_reader(source);

    // Open elements, innermost last
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    for event in reader {
        let event = event.map_err(|source| AssetError::Xml {
            path: path.to_path_buf(),
            source,
        })?;

        match event {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                let mut element = XmlElement::new(name.local_name);
                element.attributes = attributes
                    .into_iter()
                    .map(|attr| (attr.name.local_name, attr.value))
                    .collect();
                stack.push(element);
            }
            XmlEvent::EndElement { .. } => {
                let Some(element) = stack.pop() else {
                    continue;
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            XmlEvent::Characters(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.get_or_insert_with(String::new).push_str(&text);
                }
            }
            _ => {}
        }
    }

    root.ok_or_else(|| AssetError::EmptyDocument {
        path: path.to_path_buf(),
    })
}
