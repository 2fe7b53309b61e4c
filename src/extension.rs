//! Storage for XML content that an entity does not declare.

use crate::xml::{Attribute, Element, Name};

/// Extension elements and attributes of an entity.
///
/// Filled while parsing with every child element and attribute that the
/// entity schema does not claim, and written back verbatim after the
/// declared fields.
#[derive(Clone, Debug, Default, Eq)]
pub struct Extensions {
    /// Extension elements, in document order.
    pub elements: Vec<Element>,
    /// Extension attributes.
    pub attributes: Vec<Attribute>,
}

impl Extensions {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the bucket holds nothing.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.attributes.is_empty()
    }

    /// Find the first extension element with the given name.
    pub fn element(&self, namespace: Option<&str>, local: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|element| element.name.is(namespace, local))
    }

    /// Iterate over the extension elements with the given name.
    pub fn elements_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.elements
            .iter()
            .filter(move |element| element.name.is(namespace, local))
    }

    /// Append an extension element.
    pub fn push_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Remove every extension element with the given name.
    pub fn remove_elements(&mut self, namespace: Option<&str>, local: &str) -> Vec<Element> {
        let (removed, kept) = std::mem::take(&mut self.elements)
            .into_iter()
            .partition(|element| element.name.is(namespace, local));
        self.elements = kept;
        removed
    }

    /// Get an extension attribute value.
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.is(namespace, local))
            .map(|attribute| attribute.value.as_str())
    }

    /// Set an extension attribute, replacing any with the same name.
    pub fn set_attribute(&mut self, name: Name, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attribute) => attribute.value = value,
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Copy the bucket into an element being built.
    ///
    /// Attributes already set on the element win over extension attributes
    /// with the same name.
    pub(crate) fn write_into(&self, element: &mut Element) {
        for child in &self.elements {
            element.push_element(child.clone());
        }
        for attribute in &self.attributes {
            if element.attribute(attribute.name.namespace.as_deref(), &attribute.name.local).is_none() {
                element.attributes.push(attribute.clone());
            }
        }
    }
}

impl PartialEq for Extensions {
    /// Elements compare in order, attributes as a set.
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|attribute| other.attributes.contains(attribute))
    }
}

#[cfg(test)]
mod tests {
    use super::Extensions;
    use crate::xml::{Element, Name};

    #[test]
    fn write_into() {
        let mut extensions = Extensions::new();
        extensions.push_element(Element::ns("urn:ex", "a"));
        extensions.set_attribute(Name::new(Some("urn:ex"), "b"), "1");
        extensions.set_attribute(Name::local("rel"), "ignored");

        let mut element = Element::new(Name::local("link"));
        element.set_attribute(Name::local("rel"), "edit");
        extensions.write_into(&mut element);

        assert_eq!(element.attribute(None, "rel"), Some("edit"));
        assert_eq!(element.attribute(Some("urn:ex"), "b"), Some("1"));
        assert!(element.child(Some("urn:ex"), "a").is_some());
    }

    #[test]
    fn attributes_compare_as_set() {
        let mut a = Extensions::new();
        a.set_attribute(Name::local("x"), "1");
        a.set_attribute(Name::local("y"), "2");
        let mut b = Extensions::new();
        b.set_attribute(Name::local("y"), "2");
        b.set_attribute(Name::local("x"), "1");
        assert_eq!(a, b);

        b.push_element(Element::ns("urn:ex", "a"));
        assert_ne!(a, b);
        assert_eq!(b.remove_elements(Some("urn:ex"), "a").len(), 1);
        assert_eq!(a, b);
    }
}
