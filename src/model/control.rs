use once_cell::sync::Lazy;

use crate::{
    extension::Extensions,
    schema::{lens, Entity, Schema},
    APP_NS,
};

/// Publishing control.
///
/// ```text
/// pubControl =
///    element app:control {
///       atomCommonAttributes,
///       pubDraft?
///       & extensionElement
///    }
///
/// pubDraft =
///    element app:draft { "yes" | "no" }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Control {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension elements and attributes.
    pub extensions: Extensions,
    /// Value of `app:draft`.
    pub draft: Option<String>,
}

impl Control {
    /// Check if `app:draft` is `yes`.
    pub fn is_draft(&self) -> bool {
        self.draft.as_deref().map(str::trim) == Some("yes")
    }

    /// Check if the control holds nothing.
    pub fn is_empty(&self) -> bool {
        self.draft.is_none() && self.extensions.is_empty()
    }
}

impl Entity for Control {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Control>> = Lazy::new(|| {
            Schema::new(APP_NS, "control", lens!(Control, base), lens!(Control, extensions))
                .string(APP_NS, "draft", lens!(Control, draft))
        });
        &SCHEMA
    }
}
