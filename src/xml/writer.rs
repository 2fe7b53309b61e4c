//! Write [`Element`] trees as XML.

use quick_xml::escape::{escape, partial_escape};

use super::{Element, Node, XML_NS};

/// Preamble of an XML document.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Serializes elements, declaring namespaces where they are needed.
///
/// Prefixes minted for attributes are numbered per writer, so concurrent
/// writers never share state.
#[derive(Debug, Default)]
pub struct Writer {
    output: String,
    /// In-scope bindings, innermost last. A `None` prefix is the default
    /// namespace, and a `None` namespace undeclares it.
    bindings: Vec<(Option<String>, Option<String>)>,
    /// Length of `bindings` when each open element was entered.
    frames: Vec<usize>,
    minted: usize,
}

impl Writer {
    /// Create a writer with an empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the XML declaration.
    pub fn write_declaration(&mut self) {
        self.output.push_str(XML_DECLARATION);
    }

    /// Consume the writer and return the output.
    pub fn into_string(self) -> String {
        self.output
    }

    /// Make the namespace of `element` the default one without writing it.
    ///
    /// Prefixes bound on `element` or its ancestors stay unbound, so every
    /// prefix the children use is declared in the output.
    pub(crate) fn enter_scope(&mut self, element: &Element) {
        if self.default_namespace() != element.name.namespace.as_deref() {
            self.bindings.push((None, element.name.namespace.clone()));
        }
    }

    /// Write a node.
    pub fn write_node(&mut self, node: &Node) {
        match node {
            Node::Element(element) => self.write_element(element),
            Node::Text(text) => self.output.push_str(&partial_escape(text.as_str())),
            Node::Comment(comment) => {
                self.output.push_str("<!--");
                self.output.push_str(comment);
                self.output.push_str("-->");
            },
        }
    }

    /// Write an element and its descendants.
    pub fn write_element(&mut self, element: &Element) {
        self.frames.push(self.bindings.len());

        let mut declarations: Vec<(Option<String>, String)> = Vec::new();

        for (prefix, namespace) in &element.namespaces {
            if self.lookup(prefix.as_deref()) != Some(namespace.as_str()) {
                self.bind(prefix.clone(), Some(namespace.clone()));
                declarations.push((prefix.clone(), namespace.clone()));
            }
        }

        let name = self.qualify_element(element, &mut declarations);

        let mut attributes = Vec::with_capacity(element.attributes.len());
        for attribute in &element.attributes {
            let qualified = match attribute.name.namespace.as_deref() {
                None => attribute.name.local.clone(),
                Some(XML_NS) => format!("xml:{}", attribute.name.local),
                Some(namespace) => {
                    let prefix =
                        self.attribute_prefix(namespace, attribute.prefix.as_deref(), &mut declarations);
                    format!("{prefix}:{}", attribute.name.local)
                },
            };
            attributes.push((qualified, attribute.value.as_str()));
        }

        self.output.push('<');
        self.output.push_str(&name);
        for (prefix, namespace) in &declarations {
            match prefix {
                Some(prefix) => {
                    self.output.push_str(" xmlns:");
                    self.output.push_str(prefix);
                },
                None => self.output.push_str(" xmlns"),
            }
            self.output.push_str("=\"");
            self.output.push_str(&escape(namespace.as_str()));
            self.output.push('"');
        }
        for (name, value) in attributes {
            self.output.push(' ');
            self.output.push_str(&name);
            self.output.push_str("=\"");
            self.output.push_str(&escape(value));
            self.output.push('"');
        }

        if element.children.is_empty() {
            self.output.push_str("/>");
        } else {
            self.output.push('>');
            for child in &element.children {
                self.write_node(child);
            }
            self.output.push_str("</");
            self.output.push_str(&name);
            self.output.push('>');
        }

        if let Some(len) = self.frames.pop() {
            self.bindings.truncate(len);
        }
    }

    /// Return the qualified name of an element, declaring its namespace if
    /// needed.
    fn qualify_element(
        &mut self,
        element: &Element,
        declarations: &mut Vec<(Option<String>, String)>,
    ) -> String {
        let local = &element.name.local;

        let Some(namespace) = element.name.namespace.as_deref() else {
            if self.default_namespace().is_some() {
                self.bind(None, None);
                declarations.push((None, String::new()));
            }
            return local.clone();
        };

        if let Some(prefix) = element.prefix.as_deref() {
            if self.lookup(Some(prefix)) == Some(namespace) {
                return format!("{prefix}:{local}");
            }
        }

        if self.default_namespace() == Some(namespace) {
            return local.clone();
        }

        if let Some(prefix) = self.prefix_for(namespace) {
            return format!("{prefix}:{local}");
        }

        match element.prefix.as_deref() {
            Some(prefix) if prefix != "xml" && prefix != "xmlns" => {
                self.bind(Some(prefix.to_owned()), Some(namespace.to_owned()));
                declarations.push((Some(prefix.to_owned()), namespace.to_owned()));
                format!("{prefix}:{local}")
            },
            _ => {
                self.bind(None, Some(namespace.to_owned()));
                declarations.push((None, namespace.to_owned()));
                local.clone()
            },
        }
    }

    /// Return a prefix bound to `namespace` for an attribute, declaring one
    /// if needed.
    fn attribute_prefix(
        &mut self,
        namespace: &str,
        hint: Option<&str>,
        declarations: &mut Vec<(Option<String>, String)>,
    ) -> String {
        if let Some(prefix) = self.prefix_for(namespace) {
            return prefix.to_owned();
        }

        let prefix = match hint {
            Some(hint)
                if hint != "xml"
                    && hint != "xmlns"
                    && self.lookup(Some(hint)).is_none() =>
            {
                hint.to_owned()
            },
            _ => loop {
                let prefix = format!("ns{}", self.minted);
                self.minted += 1;
                if self.lookup(Some(&prefix)).is_none() {
                    break prefix;
                }
            },
        };

        self.bind(Some(prefix.clone()), Some(namespace.to_owned()));
        declarations.push((Some(prefix.clone()), namespace.to_owned()));
        prefix
    }

    fn bind(&mut self, prefix: Option<String>, namespace: Option<String>) {
        self.bindings.push((prefix, namespace));
    }

    /// Namespace bound to `prefix`, `None` if unbound.
    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .and_then(|(_, namespace)| namespace.as_deref())
    }

    fn default_namespace(&self) -> Option<&str> {
        self.lookup(None)
    }

    /// A named prefix currently bound to `namespace`.
    fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .filter_map(|(prefix, ns)| Some((prefix.as_deref()?, ns.as_deref()?)))
            .find(|(prefix, ns)| *ns == namespace && self.lookup(Some(prefix)) == Some(namespace))
            .map(|(prefix, _)| prefix)
    }
}
