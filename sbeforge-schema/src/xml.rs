//! XML access layer.
//!
//! Wraps [`xmltree::Element`] with the accessors the schema model needs
//! (attribute lookup, text extraction, element-children iteration) and with
//! synthesis of the implicit nodes the compiler injects during parsing:
//! padding types and members, builtin primitive types, and the message-id
//! enum. Synthesized nodes carry the same attribute set a human-authored
//! equivalent would have, so they travel through the regular parse path.

use xmltree::{Element, XMLNode};

use crate::error::{Result, SchemaError};

/// Convenience accessors over [`Element`].
pub trait ElementExt {
    /// Looks up an attribute value.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Looks up an attribute value, failing when absent.
    fn req_attr(&self, name: &str) -> Result<&str>;

    /// Returns the trimmed text content of the element, empty when none.
    fn text_content(&self) -> String;

    /// Iterates over element children in document order.
    fn element_children(&self) -> impl Iterator<Item = &Element>;

    /// Iterates over element children with the given tag name.
    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element>;
}

impl ElementExt for Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn req_attr(&self, name: &str) -> Result<&str> {
        self.attr(name)
            .ok_or_else(|| SchemaError::missing_attr(self.name.clone(), name))
    }

    fn text_content(&self) -> String {
        self.get_text()
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    }

    fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(XMLNode::as_element)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.element_children().filter(move |e| e.name == name)
    }
}

/// Parses an XML document and returns its root element.
///
/// # Errors
/// Returns [`SchemaError::Xml`] when the document is malformed.
pub fn parse_document(xml: &str) -> Result<Element> {
    Ok(Element::parse(xml.as_bytes())?)
}

fn new_element(name: &str, attrs: &[(&str, &str)]) -> Element {
    let mut e = Element::new(name);
    for (k, v) in attrs {
        e.attributes.insert((*k).to_string(), (*v).to_string());
    }
    e
}

/// Synthesizes a padding member node for a composite offset gap.
///
/// The node is indistinguishable from a hand-written
/// `<type name="pad<idx>_" primitiveType="uint8" length="<len>"/>`.
#[must_use]
pub fn padding_member_node(idx: u32, len: usize) -> Element {
    new_element(
        "type",
        &[
            ("name", &format!("pad{idx}_")),
            ("primitiveType", "uint8"),
            ("length", &len.to_string()),
        ],
    )
}

/// Synthesizes a raw-data padding type of the given byte length.
#[must_use]
pub fn raw_data_type_node(name: &str, len: usize) -> Element {
    new_element(
        "type",
        &[
            ("name", name),
            ("primitiveType", "uint8"),
            ("length", &len.to_string()),
        ],
    )
}

/// Synthesizes a builtin primitive type node, e.g.
/// `<type name="uint8" primitiveType="uint8"/>`.
#[must_use]
pub fn builtin_type_node(name: &str) -> Element {
    new_element("type", &[("name", name), ("primitiveType", name)])
}

/// Synthesizes a padding field node referencing a padding type.
#[must_use]
pub fn padding_field_node(idx: u32, type_name: &str) -> Element {
    new_element(
        "field",
        &[("name", &format!("pad{idx}_")), ("type", type_name)],
    )
}

/// Synthesizes an enum node from `(name, numeric-string)` values, used to
/// transmute the message-header `templateId` member into the message-id enum.
#[must_use]
pub fn enum_node(name: &str, encoding_type: &str, values: &[(String, String)]) -> Element {
    let mut e = new_element("enum", &[("name", name), ("encodingType", encoding_type)]);
    for (value_name, value) in values {
        let mut v = new_element("validValue", &[("name", value_name)]);
        v.children.push(XMLNode::Text(value.clone()));
        e.children.push(XMLNode::Element(v));
    }
    e
}
