//! Parse and build whole documents.
//!
//! A document root must carry the expanded name declared by the schema of
//! its entity. Written documents declare the namespace of the root as the
//! default namespace. Roots outside the Atom namespace always declare the
//! `atom` prefix, and Atom roots declare `app` when it appears below them.

use std::io::Read;

use tracing::debug;

use crate::{
    error::{ParseError, ValidationError},
    model::{Categories, Entry, Feed, Service},
    schema::{build_entity, parse_entity, Entity},
    xml::{Element, Writer},
    APP_NS, ATOM_NS,
};

/// An entity that can be the root of a document.
pub trait Document: Entity {
    /// Parse a document, resolving relative references against `base`.
    fn parse(input: impl AsRef<[u8]>, base: Option<&str>) -> Result<Self, ParseError> {
        let root = Element::parse_bytes(input.as_ref())?;
        Self::from_root(&root, base)
    }

    /// Read and parse a document.
    fn parse_reader(mut reader: impl Read, base: Option<&str>) -> Result<Self, ParseError> {
        let mut input = Vec::new();
        reader.read_to_end(&mut input).map_err(ParseError::Read)?;
        Self::parse(input, base)
    }

    /// Parse a root element.
    fn from_root(root: &Element, base: Option<&str>) -> Result<Self, ParseError> {
        let expected = Self::schema().name();
        if root.name != expected {
            return Err(ParseError::UnexpectedRoot {
                expected,
                found: root.name.clone(),
            });
        }
        debug!(root = %root.name, ?base, "parsing document");
        parse_entity(root, base)
    }

    /// Build the root element of the document.
    fn to_root(&self) -> Element {
        let name = Self::schema().name();
        debug!(root = %name, "building document");

        let mut root = build_entity(self, name, None);
        root.prefix = None;
        if let Some(namespace) = root.name.namespace.clone() {
            root.declare_namespace(None, &namespace);
        }
        if root.name.namespace.as_deref() != Some(ATOM_NS) {
            root.declare_namespace(Some("atom"), ATOM_NS);
        }
        if root.name.namespace.as_deref() != Some(APP_NS) && uses_namespace(&root, APP_NS) {
            root.declare_namespace(Some("app"), APP_NS);
        }
        root
    }

    /// Serialize the document, optionally preceded by the XML declaration.
    fn to_xml(&self, declaration: bool) -> String {
        write_root(&self.to_root(), declaration)
    }

    /// Serialize the document with the XML declaration.
    fn to_xml_string(&self) -> String {
        self.to_xml(true)
    }
}

/// Check if an element or one of its descendants uses a namespace.
fn uses_namespace(element: &Element, namespace: &str) -> bool {
    element.name.namespace.as_deref() == Some(namespace)
        || element
            .attributes
            .iter()
            .any(|attribute| attribute.name.namespace.as_deref() == Some(namespace))
        || element
            .child_elements()
            .any(|child| uses_namespace(child, namespace))
}

fn write_root(root: &Element, declaration: bool) -> String {
    let mut writer = Writer::new();
    if declaration {
        writer.write_declaration();
    }
    writer.write_element(root);
    writer.into_string()
}

/// A document of any supported kind, detected by its root element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnyDocument {
    /// Atom entry document.
    Entry(Entry),
    /// Atom feed document.
    Feed(Feed),
    /// AtomPub service document.
    Service(Service),
    /// AtomPub category document.
    Categories(Categories),
}

impl AnyDocument {
    /// Parse a document of any supported kind.
    pub fn parse(input: impl AsRef<[u8]>, base: Option<&str>) -> Result<Self, ParseError> {
        let root = Element::parse_bytes(input.as_ref())?;
        let name = &root.name;

        if name.is(Some(ATOM_NS), "entry") {
            Entry::from_root(&root, base).map(Self::Entry)
        } else if name.is(Some(ATOM_NS), "feed") {
            Feed::from_root(&root, base).map(Self::Feed)
        } else if name.is(Some(APP_NS), "service") {
            Service::from_root(&root, base).map(Self::Service)
        } else if name.is(Some(APP_NS), "categories") {
            Categories::from_root(&root, base).map(Self::Categories)
        } else {
            Err(ParseError::UnsupportedRoot(root.name.clone()))
        }
    }

    /// Kind of the document.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Entry(_) => "entry",
            Self::Feed(_) => "feed",
            Self::Service(_) => "service",
            Self::Categories(_) => "categories",
        }
    }

    /// Check the document against RFC 4287 and RFC 5023.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = match self {
            Self::Entry(entry) => return entry.validate(),
            Self::Feed(feed) => return feed.validate(),
            Self::Service(service) => service.missing_field(),
            Self::Categories(categories) => categories.missing_field(),
        };
        match missing {
            Some(name) => Err(ValidationError::new(format!(
                "required element {name} missing"
            ))),
            None => Ok(()),
        }
    }

    /// Serialize the document, optionally preceded by the XML declaration.
    pub fn to_xml(&self, declaration: bool) -> String {
        match self {
            Self::Entry(entry) => entry.to_xml(declaration),
            Self::Feed(feed) => feed.to_xml(declaration),
            Self::Service(service) => service.to_xml(declaration),
            Self::Categories(categories) => categories.to_xml(declaration),
        }
    }
}
