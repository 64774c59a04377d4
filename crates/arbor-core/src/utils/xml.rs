//! Thin convenience layer over [`xmltree`].
//!
//! All persisted state in this crate (plugin descriptors, requires sidecars,
//! module root layers) is element-tree XML. These helpers keep the call
//! sites terse without hiding the underlying [`Element`] type, which the
//! module extension API exposes directly so unknown state can be carried
//! verbatim.

use xmltree::{Element, EmitterConfig, XMLNode};

pub use xmltree::ParseError;

/// Parses a self-contained XML document from raw bytes.
pub fn parse_bytes(bytes: &[u8]) -> Result<Element, ParseError> {
    Element::parse(bytes)
}

/// Trimmed, non-empty text content of the named child element.
pub fn child_text(element: &Element, name: &str) -> Option<String> {
    let child = element.get_child(name)?;
    text_of(child)
}

/// Trimmed, non-empty text content of an element.
pub fn text_of(element: &Element) -> Option<String> {
    element
        .get_text()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

pub fn attr<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.attributes.get(name).map(String::as_str)
}

/// True when the named attribute is present with the literal value `true`.
pub fn bool_attr(element: &Element, name: &str) -> bool {
    attr(element, name) == Some("true")
}

/// Iterates the element children, skipping text, comments and CDATA.
pub fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(XMLNode::as_element)
}

/// Builds `<name>text</name>`.
pub fn text_element(name: &str, text: &str) -> Element {
    let mut element = Element::new(name);
    element.children.push(XMLNode::Text(text.to_string()));
    element
}

/// Renders an element as an indented document fragment without a declaration.
pub fn to_string(element: &Element) -> String {
    let mut buffer = Vec::new();
    let config = EmitterConfig::new()
        .perform_indent(true)
        .write_document_declaration(false);
    if let Err(error) = element.write_with_config(&mut buffer, config) {
        log::error!("failed to serialize <{}>: {error}", element.name);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
