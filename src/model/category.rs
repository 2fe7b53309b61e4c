use once_cell::sync::Lazy;

use crate::{
    extension::Extensions,
    schema::{lens, Entity, Schema},
    ATOM_NS,
};

/// Category.
///
/// ```text
/// atomCategory =
///    element atom:category {
///       atomCommonAttributes,
///       attribute term { text },
///       attribute scheme { atomUri }?,
///       attribute label { text }?,
///       undefinedContent
///    }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Category {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension attributes and undefined content.
    pub extensions: Extensions,
    /// Category identifier.
    pub term: Option<String>,
    /// Categorization scheme.
    pub scheme: Option<String>,
    /// Human-readable label.
    pub label: Option<String>,
}

impl Category {
    /// Create a category.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Default::default()
        }
    }

    /// Category identifier, or an empty string.
    pub fn term(&self) -> &str {
        self.term.as_deref().unwrap_or_default()
    }
}

impl Entity for Category {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Category>> = Lazy::new(|| {
            Schema::new(
                ATOM_NS,
                "category",
                lens!(Category, base),
                lens!(Category, extensions),
            )
            .attribute("term", lens!(Category, term))
            .required()
            .attribute("scheme", lens!(Category, scheme))
            .attribute("label", lens!(Category, label))
        });
        &SCHEMA
    }
}
