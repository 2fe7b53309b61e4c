//! Read XML documents into [`Element`] trees.

use quick_xml::{
    events::{BytesStart, Event},
    name::{PrefixDeclaration, ResolveResult},
    NsReader,
};

use super::{Attribute, Element, Name, Node, XML_NS};
use crate::error::ParseError;

/// Parse a string containing a single root element.
///
/// The XML declaration, the doctype, processing instructions, and comments
/// outside the root element are dropped. CDATA sections are merged into the
/// surrounding text.
pub fn parse(input: &str) -> Result<Element, ParseError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut reader = NsReader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolve, event) = reader.read_resolved_event().map_err(ParseError::syntax)?;
        let namespace = namespace(resolve)?;

        match event {
            Event::Start(start) => {
                let element = start_element(&reader, namespace, &start)?;
                stack.push(element);
            },
            Event::Empty(start) => {
                let element = start_element(&reader, namespace, &start)?;
                append(&mut stack, &mut root, element)?;
            },
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::syntax("unexpected closing tag"))?;
                append(&mut stack, &mut root, element)?;
            },
            Event::Text(text) => {
                let text = text.unescape().map_err(ParseError::syntax)?;
                match stack.last_mut() {
                    Some(parent) => parent.push_text(text),
                    None if text.trim().is_empty() => {},
                    None => return Err(ParseError::syntax("text outside of the root element")),
                }
            },
            Event::CData(cdata) => {
                let text = String::from_utf8(cdata.into_inner().into_owned())
                    .map_err(ParseError::syntax)?;
                match stack.last_mut() {
                    Some(parent) => parent.push_text(text),
                    None => return Err(ParseError::syntax("CDATA outside of the root element")),
                }
            },
            Event::Comment(comment) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8(comment.into_inner().into_owned())
                        .map_err(ParseError::syntax)?;
                    parent.children.push(Node::Comment(text));
                }
            },
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {},
            Event::Eof => break,
        }
    }

    if let Some(element) = stack.last() {
        return Err(ParseError::syntax(format!(
            "unexpected end of document, <{}> is not closed",
            element.name
        )));
    }

    root.ok_or_else(|| ParseError::syntax("no root element"))
}

/// Convert a resolved namespace to an owned string.
fn namespace(resolve: ResolveResult) -> Result<Option<String>, ParseError> {
    match resolve {
        ResolveResult::Bound(namespace) => std::str::from_utf8(namespace.into_inner())
            .map(|s| Some(s.to_owned()))
            .map_err(ParseError::syntax),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ParseError::syntax(format!(
            "unknown namespace prefix `{}`",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

/// Create an element from a start tag.
fn start_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart,
) -> Result<Element, ParseError> {
    let name = start.name();
    let mut element = Element {
        name: Name {
            namespace,
            local: utf8(name.local_name().into_inner())?,
        },
        prefix: name.prefix().map(|p| utf8(p.into_inner())).transpose()?,
        ..Default::default()
    };

    for attribute in start.attributes() {
        let attribute = attribute.map_err(ParseError::syntax)?;
        let key = attribute.key;
        let value = attribute
            .unescape_value()
            .map_err(ParseError::syntax)?
            .into_owned();

        match key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => {
                element.namespaces.push((None, value));
                continue;
            },
            Some(PrefixDeclaration::Named(prefix)) => {
                element.namespaces.push((Some(utf8(prefix)?), value));
                continue;
            },
            None => {},
        }

        let prefix = key.prefix().map(|p| utf8(p.into_inner())).transpose()?;
        let namespace = if prefix.as_deref() == Some("xml") {
            Some(XML_NS.to_owned())
        } else {
            let (resolve, _) = reader.resolve_attribute(key);
            self::namespace(resolve)?
        };

        element.attributes.push(Attribute {
            name: Name {
                namespace,
                local: utf8(key.local_name().into_inner())?,
            },
            prefix,
            value,
        });
    }

    Ok(element)
}

/// Append a closed element to its parent, or make it the root.
fn append(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(ParseError::syntax("more than one root element")),
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<String, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(ParseError::syntax)
}
