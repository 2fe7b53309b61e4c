use http::StatusCode;
use once_cell::sync::Lazy;

use super::{Category, Control, Link, Person};
use crate::{
    document::Document,
    error::{Result, ValidationError},
    extension::Extensions,
    http::{expect_content_type, expect_status, get, Client, ATOM_MEDIA_TYPE},
    schema::{lens, Entity, Schema},
    text::{Content, Text},
    util::date_time::DateTime,
    APP_NS, ATOM_NS,
};

/// Entry.
///
/// ```text
/// atomEntry =
///    element atom:entry {
///       atomCommonAttributes,
///       (atomAuthor*
///        & atomCategory*
///        & atomContent?
///        & atomContributor*
///        & atomId
///        & atomLink*
///        & atomPublished?
///        & atomRights?
///        & atomSource?
///        & atomSummary?
///        & atomTitle
///        & atomUpdated
///        & pubEdited?
///        & pubControl?
///        & extensionElement*)
///    }
/// ```
///
/// `atom:source` is kept as an extension element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension elements and attributes.
    pub extensions: Extensions,
    /// Permanent identifier.
    pub id: Option<String>,
    /// Title.
    pub title: Option<Text>,
    /// Content.
    pub content: Option<Content>,
    /// Rights held in and over the entry.
    pub rights: Option<Text>,
    /// Authors.
    pub authors: Vec<Person>,
    /// Contributors.
    pub contributors: Vec<Person>,
    /// Categories.
    pub categories: Vec<Category>,
    /// Links.
    pub links: Vec<Link>,
    /// Instant of the first publication.
    pub published: Option<DateTime>,
    /// Instant of the last significant modification.
    pub updated: Option<DateTime>,
    /// Summary.
    pub summary: Option<Text>,
    /// Instant of the last modification, as seen by an AtomPub server.
    pub edited: Option<DateTime>,
    /// AtomPub publishing control.
    pub control: Option<Control>,
}

impl Entry {
    /// Create an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an entry document.
    pub fn fetch(client: &impl Client, url: &str) -> Result<Self> {
        let response = get(client, url, ATOM_MEDIA_TYPE, Default::default())?;
        expect_status(url, &response, &[StatusCode::OK])?;
        expect_content_type(url, &response, &[ATOM_MEDIA_TYPE])?;
        Ok(Self::parse(response.body(), Some(url))?)
    }

    /// Add categories from a string of tags separated by `delimiter`.
    ///
    /// Blank tags and tags already present as a category term are skipped.
    /// An empty delimiter splits on whitespace.
    pub fn tag_with(&mut self, tags: &str, delimiter: &str) {
        if delimiter.is_empty() {
            self.tag_with_list(tags.split_whitespace());
        } else {
            self.tag_with_list(tags.split(delimiter));
        }
    }

    /// Add categories from a list of tags.
    pub fn tag_with_list<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() || self.categories.iter().any(|c| c.term() == tag) {
                continue;
            }
            self.categories.push(Category::new(tag));
        }
    }

    /// Iterate over the links with the given relation type.
    pub fn links_with_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |link| link.is_rel(rel))
    }

    /// URL of the first `alternate` link.
    pub fn alternate_url(&self) -> Option<&str> {
        self.links_with_rel("alternate")
            .find_map(|link| link.href.as_deref())
    }

    /// URL of the `edit` link.
    pub fn edit_url(&self) -> Option<&str> {
        self.links_with_rel("edit")
            .find_map(|link| link.href.as_deref())
    }

    /// Set the URL of the `edit` link, creating the link if needed.
    pub fn set_edit_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        match self.links.iter_mut().find(|link| link.is_rel("edit")) {
            Some(link) => link.href = Some(url),
            None => self.links.push(Link::with_rel(url, "edit")),
        }
    }

    /// URL of the `edit-media` link.
    pub fn edit_media_url(&self) -> Option<&str> {
        self.links_with_rel("edit-media")
            .find_map(|link| link.href.as_deref())
    }

    /// Check if `app:control/app:draft` is `yes`.
    pub fn is_draft(&self) -> bool {
        self.control.as_ref().is_some_and(Control::is_draft)
    }

    /// Set or clear the draft flag.
    ///
    /// `app:control` is created when needed and dropped once it holds
    /// nothing else.
    pub fn set_draft(&mut self, draft: bool) {
        if draft {
            self.control.get_or_insert_with(Control::default).draft = Some("yes".to_owned());
        } else if let Some(control) = &mut self.control {
            control.draft = None;
            if control.is_empty() {
                self.control = None;
            }
        }
    }

    /// Mark the entry as a draft.
    pub fn mark_draft(&mut self) {
        self.set_draft(true);
    }

    /// Set `updated` to the current time.
    pub fn touch_updated(&mut self) {
        self.updated = Some(DateTime::now());
    }

    /// Set `app:edited` to the current time.
    pub fn touch_edited(&mut self) {
        self.edited = Some(DateTime::now());
    }

    /// Check the entry against the constraints of RFC 4287.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_with(true)
    }

    /// Check the entry, requiring an author unless the containing feed has
    /// one.
    pub(crate) fn validate_with(&self, need_author: bool) -> Result<(), ValidationError> {
        if let Some(name) = self.missing_field() {
            return Err(ValidationError::new(format!(
                "required element atom:{name} missing"
            )));
        }

        if need_author && self.authors.is_empty() {
            return Err(ValidationError::new("required element atom:author missing"));
        }

        let alternates: Vec<&Link> = self.links_with_rel("alternate").collect();

        if self.content.is_none() && alternates.is_empty() {
            return Err(ValidationError::new(
                "no atom:content or atom:link[rel='alternate']",
            ));
        }

        for (i, link) in alternates.iter().enumerate() {
            let ambiguous = alternates[i + 1..]
                .iter()
                .any(|other| other.media_type == link.media_type && other.hreflang == link.hreflang);
            if ambiguous {
                return Err(ValidationError::new(concat!(
                    "more than one atom:link with a rel attribute value of \"alternate\" ",
                    "that has the same combination of type and hreflang attribute values"
                )));
            }
        }

        if let Some(content) = &self.content {
            if (content.is_out_of_line() || content.is_binary()) && self.summary.is_none() {
                return Err(ValidationError::new(
                    "out-of-line or base64ed atom:content and no atom:summary",
                ));
            }
        }

        Ok(())
    }
}

impl Entity for Entry {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Entry>> = Lazy::new(|| {
            Schema::new(ATOM_NS, "entry", lens!(Entry, base), lens!(Entry, extensions))
                .string(ATOM_NS, "id", lens!(Entry, id))
                .required()
                .text(ATOM_NS, "title", lens!(Entry, title))
                .required()
                .content(ATOM_NS, "content", lens!(Entry, content))
                .text(ATOM_NS, "rights", lens!(Entry, rights))
                .many(ATOM_NS, "author", lens!(Entry, authors))
                .many(ATOM_NS, "contributor", lens!(Entry, contributors))
                .many(ATOM_NS, "category", lens!(Entry, categories))
                .many(ATOM_NS, "link", lens!(Entry, links))
                .timestamp(ATOM_NS, "published", lens!(Entry, published))
                .timestamp(ATOM_NS, "updated", lens!(Entry, updated))
                .required()
                .text(ATOM_NS, "summary", lens!(Entry, summary))
                .timestamp(APP_NS, "edited", lens!(Entry, edited))
                .one(APP_NS, "control", lens!(Entry, control))
        });
        &SCHEMA
    }
}

impl Document for Entry {}

#[cfg(test)]
mod tests {
    use super::Entry;
    use crate::{
        document::Document,
        model::{Link, Person},
        text::Content,
    };

    #[test]
    fn tag_with() {
        let mut entry = Entry::new();
        entry.tag_with("foo bar foo", " ");
        let terms: Vec<_> = entry.categories.iter().map(|c| c.term()).collect();
        assert_eq!(terms, ["foo", "bar"]);

        entry.tag_with("  bar   baz ", " ");
        entry.tag_with("baz,qux, ,foo", ",");
        let terms: Vec<_> = entry.categories.iter().map(|c| c.term()).collect();
        assert_eq!(terms, ["foo", "bar", "baz", "qux"]);

        entry.tag_with_list(["qux", "", "quux"]);
        assert_eq!(entry.categories.len(), 5);
    }

    #[test]
    fn edit_url() {
        let mut entry = Entry::new();
        assert_eq!(entry.edit_url(), None);

        entry.set_edit_url("http://example.org/1");
        entry.set_edit_url("http://example.org/2");
        assert_eq!(entry.edit_url(), Some("http://example.org/2"));
        assert_eq!(entry.links.len(), 1);
        assert_eq!(entry.alternate_url(), None);
    }

    #[test]
    fn draft() {
        let mut entry = Entry::new();
        assert!(!entry.is_draft());

        entry.mark_draft();
        assert!(entry.is_draft());
        let xml = entry.to_xml_string();
        assert!(xml.contains("<app:control><app:draft>yes</app:draft></app:control>"), "{xml}");

        entry.set_draft(false);
        assert!(!entry.is_draft());
        assert!(entry.control.is_none());
    }

    #[test]
    fn draft_keeps_other_control_children() {
        let mut entry = Entry::parse(
            concat!(
                "<entry xmlns=\"http://www.w3.org/2005/Atom\" xmlns:app=\"http://www.w3.org/2007/app\">",
                "<app:control><app:draft>yes</app:draft><x xmlns=\"urn:x\"/></app:control>",
                "</entry>"
            ),
            None,
        )
        .unwrap();
        assert!(entry.is_draft());

        entry.set_draft(false);
        assert!(!entry.is_draft());
        let control = entry.control.as_ref().unwrap();
        assert_eq!(control.extensions.elements.len(), 1);
    }

    #[test]
    fn validate() {
        let mut entry = Entry::new();
        assert_eq!(
            entry.validate().unwrap_err().to_string(),
            "required element atom:id missing"
        );

        entry.id = Some("tag:x,1".to_owned());
        entry.title = Some("T".into());
        entry.touch_updated();
        assert_eq!(
            entry.validate().unwrap_err().to_string(),
            "required element atom:author missing"
        );

        entry.authors.push(Person::new("A"));
        assert!(entry.validate().is_err());

        entry.links.push(Link::new("http://example.org/"));
        assert_eq!(entry.validate(), Ok(()));

        entry.links.push(Link::with_rel("http://example.org/2", "alternate"));
        assert!(entry.validate().is_err());
        entry.links.pop();

        entry.content = Some(Content::linked("http://example.org/a.png", "image/png").unwrap());
        assert!(entry.validate().is_err());
        entry.summary = Some("S".into());
        assert_eq!(entry.validate(), Ok(()));
    }
}
