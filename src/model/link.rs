use once_cell::sync::Lazy;

use crate::{
    extension::Extensions,
    schema::{lens, Entity, Schema},
    ATOM_NS,
};

/// Link.
///
/// ```text
/// atomLink =
///    element atom:link {
///       atomCommonAttributes,
///       attribute href { atomUri },
///       attribute rel { atomNCName | atomUri }?,
///       attribute type { atomMediaType }?,
///       attribute hreflang { atomLanguageTag }?,
///       attribute title { text }?,
///       attribute length { text }?,
///       undefinedContent
///   }
/// ```
///
/// `href` is resolved against the base of the link when parsed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Link {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension attributes and undefined content.
    pub extensions: Extensions,
    /// Referenced IRI.
    pub href: Option<String>,
    /// Link relation type, `alternate` when absent.
    pub rel: Option<String>,
    /// Advisory media type.
    pub media_type: Option<String>,
    /// Language of the referenced resource.
    pub hreflang: Option<String>,
    /// Human-readable title.
    pub title: Option<String>,
    /// Advisory length in octets.
    pub length: Option<String>,
}

impl Link {
    /// Create a link to `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Default::default()
        }
    }

    /// Create a link to `href` with a relation type.
    pub fn with_rel(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            rel: Some(rel.into()),
            ..Self::new(href)
        }
    }

    /// Relation type, defaulting to `alternate`.
    pub fn rel(&self) -> &str {
        self.rel.as_deref().unwrap_or("alternate")
    }

    /// Check the relation type.
    pub fn is_rel(&self, rel: &str) -> bool {
        self.rel() == rel
    }

    /// Referenced IRI, or an empty string.
    pub fn href(&self) -> &str {
        self.href.as_deref().unwrap_or_default()
    }
}

impl Entity for Link {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Link>> = Lazy::new(|| {
            Schema::new(ATOM_NS, "link", lens!(Link, base), lens!(Link, extensions))
                .uri_attribute("href", lens!(Link, href))
                .required()
                .attribute("rel", lens!(Link, rel))
                .attribute("type", lens!(Link, media_type))
                .attribute("hreflang", lens!(Link, hreflang))
                .attribute("title", lens!(Link, title))
                .attribute("length", lens!(Link, length))
        });
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::Link;
    use crate::{schema::Entity, xml::Element};

    #[test]
    fn parse() {
        let element = Element::parse(concat!(
            "<link xmlns=\"http://www.w3.org/2005/Atom\" xml:base=\"/b/\" href=\"c\" ",
            "type=\"text/html\" foo=\"bar\"/>"
        ))
        .unwrap();
        let link = Link::from_element(&element, Some("http://example.org/a/")).unwrap();

        assert_eq!(link.href(), "http://example.org/b/c");
        assert_eq!(link.rel(), "alternate");
        assert!(link.rel.is_none());
        assert_eq!(link.media_type.as_deref(), Some("text/html"));
        assert_eq!(link.extensions.attribute(None, "foo"), Some("bar"));
    }

    #[test]
    fn missing_href() {
        assert_eq!(Link::default().missing_field(), Some("href"));
        assert_eq!(Link::with_rel("x", "edit").missing_field(), None);
    }
}
