use once_cell::sync::Lazy;

use crate::{
    extension::Extensions,
    schema::{lens, Entity, Schema},
    ATOM_NS,
};

/// Generator.
///
/// ```text
/// atomGenerator = element atom:generator {
///    atomCommonAttributes,
///    attribute uri { atomUri }?,
///    attribute version { text }?,
///    text
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Generator {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension attributes.
    pub extensions: Extensions,
    /// IRI of the generating agent.
    pub uri: Option<String>,
    /// Version of the generating agent.
    pub version: Option<String>,
    /// Human-readable name.
    pub name: String,
}

impl Generator {
    /// Create a generator.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Entity for Generator {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Generator>> = Lazy::new(|| {
            Schema::new(
                ATOM_NS,
                "generator",
                lens!(Generator, base),
                lens!(Generator, extensions),
            )
            .attribute("uri", lens!(Generator, uri))
            .attribute("version", lens!(Generator, version))
            .body(lens!(Generator, name))
        });
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::Generator;
    use crate::{schema::Entity, xml::Element};

    #[test]
    fn parse_body() {
        let element = Element::parse(concat!(
            "<generator xmlns=\"http://www.w3.org/2005/Atom\" ",
            "uri=\"http://www.example.com/\" version=\"1.0\">",
            "Example Toolkit",
            "</generator>"
        ))
        .unwrap();

        let generator = Generator::from_element(&element, None).unwrap();
        assert_eq!(generator.name, "Example Toolkit");
        assert_eq!(generator.version.as_deref(), Some("1.0"));
        assert_eq!(generator.uri.as_deref(), Some("http://www.example.com/"));

        let output = generator.to_element();
        assert_eq!(output, element);
        assert_eq!(Generator::from_element(&output, None).unwrap(), generator);
    }
}
