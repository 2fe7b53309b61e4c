//! A namespace-aware XML tree.
//!
//! Documents are read whole into an [`Element`] tree and written back from
//! it. Element and attribute names are kept expanded (namespace URI and
//! local name); prefixes are only remembered as hints for output.
//!
//! This module uses [`quick_xml`] under the hood.

mod reader;
mod writer;

use std::fmt;

pub use self::reader::parse;
pub use self::writer::Writer;
use crate::error::ParseError;

/// XML namespace, bound to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Expanded name of an element or an attribute.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name {
    /// Namespace URI, if any.
    pub namespace: Option<String>,
    /// Local name.
    pub local: String,
}

impl Name {
    /// Create a name from a namespace and a local name.
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_owned),
            local: local.into(),
        }
    }

    /// Create a name without namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(None, local)
    }

    /// Check if the name has the given namespace and local name.
    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local == local
    }
}

impl fmt::Display for Name {
    /// Write the name in Clark notation, `{namespace}local`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{namespace}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// An attribute.
#[derive(Clone, Debug)]
pub struct Attribute {
    /// Expanded name.
    pub name: Name,
    /// Prefix found in the source document.
    pub prefix: Option<String>,
    /// Unescaped value.
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    pub fn new(name: Name, value: impl Into<String>) -> Self {
        Self {
            name,
            prefix: None,
            value: value.into(),
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for Attribute {}

/// A child node of an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A child element.
    Element(Element),
    /// Unescaped character data.
    Text(String),
    /// A comment.
    Comment(String),
}

impl Node {
    /// Returns `Some(&Element)` if this is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns `Some(&str)` if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// An element with its attributes and children.
#[derive(Clone, Debug, Default)]
pub struct Element {
    /// Expanded name.
    pub name: Name,
    /// Prefix found in the source document.
    pub prefix: Option<String>,
    /// Namespace declarations carried by this element, as
    /// `(prefix, namespace)` pairs. A `None` prefix is the default
    /// namespace.
    pub namespaces: Vec<(Option<String>, String)>,
    /// Attributes, namespace declarations excluded.
    pub attributes: Vec<Attribute>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element without attributes and children.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Create an element in the given namespace.
    pub fn ns(namespace: &str, local: impl Into<String>) -> Self {
        Self::new(Name::new(Some(namespace), local))
    }

    /// Parse a string containing a single root element.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse(input)
    }

    /// Parse UTF-8 bytes containing a single root element.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, ParseError> {
        let input = std::str::from_utf8(input).map_err(ParseError::syntax)?;
        parse(input)
    }

    /// Add a namespace declaration.
    pub fn declare_namespace(&mut self, prefix: Option<&str>, namespace: &str) {
        self.namespaces
            .retain(|(p, _)| p.as_deref() != prefix);
        self.namespaces
            .push((prefix.map(str::to_owned), namespace.to_owned()));
    }

    /// Set the prefix hint and return `self`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Get an attribute value by expanded name.
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.is(namespace, local))
            .map(|attribute| attribute.value.as_str())
    }

    /// Set an attribute, replacing any attribute with the same name.
    pub fn set_attribute(&mut self, name: Name, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attribute) => attribute.value = value,
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Remove an attribute and return its value.
    pub fn remove_attribute(&mut self, namespace: Option<&str>, local: &str) -> Option<String> {
        let i = self
            .attributes
            .iter()
            .position(|attribute| attribute.name.is(namespace, local))?;
        Some(self.attributes.remove(i).value)
    }

    /// Append a child element.
    pub fn push_element(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Append text, merging it with a preceding text node.
    pub fn push_text(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(Node::Text(last)) => last.push_str(text),
            _ => self.children.push(Node::Text(text.to_owned())),
        }
    }

    /// Append text and return `self`.
    pub fn with_text(mut self, text: impl AsRef<str>) -> Self {
        self.push_text(text);
        self
    }

    /// Iterate over child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Find the first child element with the given name.
    pub fn child(&self, namespace: Option<&str>, local: &str) -> Option<&Element> {
        self.child_elements()
            .find(|element| element.name.is(namespace, local))
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children.iter().filter_map(Node::as_text).collect()
    }

    /// Check if the element has no child element.
    pub fn is_text_only(&self) -> bool {
        self.child_elements().next().is_none()
    }

    /// Serialize the element as a standalone document fragment.
    pub fn to_xml_string(&self) -> String {
        let mut writer = Writer::new();
        writer.write_element(self);
        writer.into_string()
    }

    /// Serialize the children of the element.
    ///
    /// Children in the namespace of `self` are written unprefixed, and
    /// other namespaces are declared where the children need them.
    pub fn inner_xml_string(&self) -> String {
        let mut writer = Writer::new();
        writer.enter_scope(self);
        for child in &self.children {
            writer.write_node(child);
        }
        writer.into_string()
    }
}

impl PartialEq for Element {
    /// Compare names, attributes as a set, and children in order.
    ///
    /// Prefixes and namespace declarations are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|attribute| other.attributes.contains(attribute))
            && self.children == other.children
    }
}

impl Eq for Element {}
