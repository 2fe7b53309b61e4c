use once_cell::sync::Lazy;

use crate::{
    extension::Extensions,
    schema::{lens, Entity, Schema},
    ATOM_NS,
};

/// Person construct, used for authors and contributors.
///
/// ```text
/// atomPersonConstruct =
///    atomCommonAttributes,
///    (element atom:name { text }
///     & element atom:uri { atomUri }?
///     & element atom:email { atomEmailAddress }?
///     & extensionElement*)
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Person {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension elements and attributes.
    pub extensions: Extensions,
    /// Human-readable name.
    pub name: Option<String>,
    /// IRI associated with the person.
    pub uri: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
}

impl Person {
    /// Create a person.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

impl Entity for Person {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Person>> = Lazy::new(|| {
            Schema::new(ATOM_NS, "author", lens!(Person, base), lens!(Person, extensions))
                .string(ATOM_NS, "name", lens!(Person, name))
                .required()
                .string(ATOM_NS, "uri", lens!(Person, uri))
                .string(ATOM_NS, "email", lens!(Person, email))
        });
        &SCHEMA
    }
}
