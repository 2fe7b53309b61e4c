use std::collections::HashSet;

use http::{
    header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED},
    HeaderMap, StatusCode,
};
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use super::{Category, Entry, Generator, Link, Person};
use crate::{
    document::Document,
    error::{Error, Result, ValidationError},
    extension::Extensions,
    http::{
        expect_content_type, expect_status, get, header, insert_header, Client, ATOM_MEDIA_TYPE,
    },
    schema::{lens, Entity, Schema},
    text::Text,
    util::date_time::DateTime,
    ATOM_NS,
};

/// Feed.
///
/// ```text
/// atomFeed =
///    element atom:feed {
///       atomCommonAttributes,
///       (atomAuthor*
///        & atomCategory*
///        & atomContributor*
///        & atomGenerator?
///        & atomIcon?
///        & atomId
///        & atomLink*
///        & atomLogo?
///        & atomRights?
///        & atomSubtitle?
///        & atomTitle
///        & atomUpdated
///        & extensionElement*),
///       atomEntry*
///    }
/// ```
///
/// Entries are keyed by `id`: see [`Feed::push`]. A feed fetched over HTTP
/// remembers its location and caching tokens, and the neighbouring pages of
/// its history ([RFC 5005](https://www.rfc-editor.org/rfc/rfc5005)).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Feed {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension elements and attributes.
    pub extensions: Extensions,
    /// Permanent identifier.
    pub id: Option<String>,
    /// Title.
    pub title: Option<Text>,
    /// Subtitle.
    pub subtitle: Option<Text>,
    /// Instant of the last significant modification.
    pub updated: Option<DateTime>,
    /// Links.
    pub links: Vec<Link>,
    /// Categories.
    pub categories: Vec<Category>,
    /// Authors.
    pub authors: Vec<Person>,
    /// Contributors.
    pub contributors: Vec<Person>,
    /// Generating agent.
    pub generator: Option<Generator>,
    /// IRI of a small image.
    pub icon: Option<String>,
    /// IRI of a large image.
    pub logo: Option<String>,
    /// Rights held in and over the feed.
    pub rights: Option<Text>,
    /// Entries.
    pub entries: Vec<Entry>,
    /// Location of the feed document.
    pub uri: Option<String>,
    /// `ETag` of the last fetched document.
    pub etag: Option<String>,
    /// `Last-Modified` of the last fetched document.
    pub last_modified: Option<String>,
    /// Previous page of the feed history.
    pub prev: Option<Box<Feed>>,
    /// Next page of the feed history.
    pub next: Option<Box<Feed>>,
}

impl Feed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty feed located at `uri`.
    pub fn with_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            base: Some(uri.clone()),
            uri: Some(uri),
            ..Default::default()
        }
    }

    /// Fetch a feed document.
    pub fn fetch(client: &impl Client, url: &str) -> Result<Self> {
        let mut feed = Self::with_uri(url);
        feed.update(client)?;
        Ok(feed)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the feed has no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Find an entry by `id`.
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.id.as_deref() == Some(id))
    }

    /// Find an entry by `id`, mutably.
    pub fn entry_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id.as_deref() == Some(id))
    }

    /// Add an entry.
    ///
    /// An entry whose `id` is already present replaces the existing one, in
    /// place, only if it was updated strictly later or if the existing one
    /// has no `updated`. Entries without `id` are always appended.
    pub fn push(&mut self, entry: Entry) {
        let existing = entry.id.as_deref().and_then(|id| {
            self.entries
                .iter()
                .position(|e| e.id.as_deref() == Some(id))
        });

        match existing {
            Some(i) => {
                let replace = match (self.entries[i].updated, entry.updated) {
                    (None, _) => true,
                    (Some(current), Some(incoming)) => incoming > current,
                    (Some(_), None) => false,
                };
                if replace {
                    self.entries[i] = entry;
                }
            },
            None => self.entries.push(entry),
        }
    }

    /// Merge another feed into this one.
    ///
    /// Metadata set in `other` overwrites this feed's, `updated` keeps the
    /// later instant, missing authors, contributors, and categories are
    /// appended, and entries are added with [`Feed::push`].
    pub fn merge(&mut self, other: &Feed) {
        fn replace<T: Clone>(field: &mut Option<T>, other: &Option<T>) {
            if other.is_some() {
                field.clone_from(other);
            }
        }

        fn append<T: Clone + PartialEq>(items: &mut Vec<T>, other: &[T]) {
            for item in other {
                if !items.contains(item) {
                    items.push(item.clone());
                }
            }
        }

        if self.base.is_none() {
            self.base.clone_from(&other.base);
        }
        replace(&mut self.id, &other.id);
        replace(&mut self.title, &other.title);
        replace(&mut self.subtitle, &other.subtitle);
        replace(&mut self.generator, &other.generator);
        replace(&mut self.icon, &other.icon);
        replace(&mut self.logo, &other.logo);
        replace(&mut self.rights, &other.rights);
        self.updated = self.updated.max(other.updated);

        append(&mut self.authors, &other.authors);
        append(&mut self.contributors, &other.contributors);
        append(&mut self.categories, &other.categories);

        for entry in &other.entries {
            self.push(entry.clone());
        }
    }

    /// Fetch the feed again from its location and merge it in.
    ///
    /// Sends the stored caching tokens. Returns `false` when the server
    /// answers `304 Not Modified` or when the fetched feed was not updated
    /// later than this one.
    pub fn update(&mut self, client: &impl Client) -> Result<bool> {
        let uri = self.uri.clone().ok_or(Error::MissingUrl("feed"))?;

        let mut headers = HeaderMap::new();
        if let Some(etag) = &self.etag {
            insert_header(&mut headers, IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &self.last_modified {
            insert_header(&mut headers, IF_MODIFIED_SINCE, last_modified);
        }

        let response = get(client, &uri, ATOM_MEDIA_TYPE, headers)?;

        if response.status() == StatusCode::NOT_MODIFIED {
            debug!(%uri, "feed not modified");
            return Ok(false);
        }

        expect_status(&uri, &response, &[StatusCode::OK])?;
        expect_content_type(&uri, &response, &[ATOM_MEDIA_TYPE])?;

        let fetched = Self::parse(response.body(), Some(&uri))?;

        self.etag = header(&response, ETAG.as_str()).map(str::to_owned);
        self.last_modified = header(&response, LAST_MODIFIED.as_str()).map(str::to_owned);

        if let (Some(current), Some(fetched)) = (self.updated, fetched.updated) {
            if current >= fetched {
                debug!(%uri, "feed not updated");
                return Ok(false);
            }
        }

        self.prev = history_link(&fetched, &["previous", "prev-archive"])
            .map(|href| Box::new(Self::with_uri(href)));
        self.next = history_link(&fetched, &["next", "next-archive"])
            .map(|href| Box::new(Self::with_uri(href)));

        if self.id.is_none() && self.entries.is_empty() {
            let prev = self.prev.take();
            let next = self.next.take();
            *self = Self {
                uri: self.uri.take(),
                etag: self.etag.take(),
                last_modified: self.last_modified.take(),
                prev,
                next,
                ..fetched
            };
        } else {
            self.merge(&fetched);
        }

        Ok(true)
    }

    /// Fetch the whole logical feed.
    ///
    /// Updates this feed, then walks the previous pages and the next pages,
    /// merging each one. A page that was already visited ends the walk.
    pub fn get_everything(&mut self, client: &impl Client) -> Result<()> {
        self.update(client)?;

        let mut visited: HashSet<String> = self.uri.iter().cloned().collect();

        for backward in [true, false] {
            let mut page = if backward {
                self.prev.clone()
            } else {
                self.next.clone()
            };

            while let Some(mut feed) = page {
                let Some(uri) = feed.uri.clone() else {
                    break;
                };
                if !visited.insert(uri.clone()) {
                    warn!(%uri, "feed history revisits a page");
                    break;
                }

                feed.update(client)?;
                self.merge(&feed);

                page = if backward {
                    feed.prev.take()
                } else {
                    feed.next.take()
                };
            }
        }

        Ok(())
    }

    /// Check the feed and its entries against the constraints of RFC 4287.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.missing_field() {
            return Err(ValidationError::new(format!(
                "required element atom:{name} missing"
            )));
        }

        for entry in &self.entries {
            entry.validate_with(self.authors.is_empty())?;
        }

        Ok(())
    }
}

/// Location of a feed history page, from the first link with one of `rels`.
fn history_link(feed: &Feed, rels: &[&str]) -> Option<String> {
    feed.links
        .iter()
        .filter(|link| {
            link.media_type
                .as_deref()
                .map_or(true, |media_type| media_type.starts_with(ATOM_MEDIA_TYPE))
        })
        .find(|link| rels.contains(&link.rel()))
        .and_then(|link| link.href.clone())
}

impl<'a> IntoIterator for &'a Feed {
    type IntoIter = std::slice::Iter<'a, Entry>;
    type Item = &'a Entry;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Entity for Feed {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Feed>> = Lazy::new(|| {
            Schema::new(ATOM_NS, "feed", lens!(Feed, base), lens!(Feed, extensions))
                .string(ATOM_NS, "id", lens!(Feed, id))
                .required()
                .text(ATOM_NS, "title", lens!(Feed, title))
                .required()
                .text(ATOM_NS, "subtitle", lens!(Feed, subtitle))
                .timestamp(ATOM_NS, "updated", lens!(Feed, updated))
                .required()
                .many(ATOM_NS, "link", lens!(Feed, links))
                .many(ATOM_NS, "category", lens!(Feed, categories))
                .many(ATOM_NS, "author", lens!(Feed, authors))
                .many(ATOM_NS, "contributor", lens!(Feed, contributors))
                .one(ATOM_NS, "generator", lens!(Feed, generator))
                .string(ATOM_NS, "icon", lens!(Feed, icon))
                .string(ATOM_NS, "logo", lens!(Feed, logo))
                .text(ATOM_NS, "rights", lens!(Feed, rights))
                .many(ATOM_NS, "entry", lens!(Feed, entries))
        });
        &SCHEMA
    }
}

impl Document for Feed {}

#[cfg(test)]
mod tests {
    use super::Feed;
    use crate::{
        model::{Entry, Person},
        util::date_time::DateTime,
    };

    fn entry(id: &str, updated: Option<&str>) -> Entry {
        Entry {
            id: Some(id.to_owned()),
            updated: updated.map(|s| DateTime::parse(s).unwrap()),
            ..Default::default()
        }
    }

    const T1: &str = "2005-07-31T12:29:29Z";
    const T2: &str = "2006-07-31T12:29:29Z";

    #[test]
    fn push_keeps_newest() {
        const CASES: [(Option<&str>, Option<&str>, Option<&str>); 5] = [
            (Some(T1), Some(T2), Some(T2)),
            (Some(T2), Some(T1), Some(T2)),
            (Some(T1), Some(T1), Some(T1)),
            (None, Some(T1), Some(T1)),
            (Some(T1), None, Some(T1)),
        ];

        for (current, incoming, expected) in CASES {
            let mut feed = Feed::new();
            feed.push(entry("x", current));
            feed.push(entry("y", None));
            feed.push(entry("x", incoming));

            assert_eq!(feed.len(), 2);
            assert_eq!(feed.entries[0].id.as_deref(), Some("x"));
            let output = feed.entry("x").unwrap().updated.map(|t| t.to_string());
            assert_eq!(
                output.as_deref(),
                expected,
                "\npush({current:?} then {incoming:?}) expected {expected:?} but received {output:?}"
            );
        }
    }

    #[test]
    fn merge_twice() {
        let mut a = Feed::new();
        a.push(entry("x", Some(T1)));
        let mut b = Feed::new();
        b.id = Some("tag:b".to_owned());
        b.authors.push(Person::new("B"));
        b.updated = Some(DateTime::parse(T2).unwrap());
        b.push(entry("x", Some(T2)));

        a.merge(&b);
        a.merge(&b);

        assert_eq!(a.len(), 1);
        assert_eq!(
            a.entry("x").unwrap().updated,
            Some(DateTime::parse(T2).unwrap())
        );
        assert_eq!(a.id.as_deref(), Some("tag:b"));
        assert_eq!(a.authors.len(), 1);
        assert_eq!(a.updated, b.updated);
    }

    #[test]
    fn merge_is_order_independent() {
        let older = {
            let mut feed = Feed::new();
            feed.push(entry("x", Some(T1)));
            feed
        };
        let newer = {
            let mut feed = Feed::new();
            feed.push(entry("x", Some(T2)));
            feed
        };

        let mut a = Feed::new();
        a.merge(&older);
        a.merge(&newer);
        let mut b = Feed::new();
        b.merge(&newer);
        b.merge(&older);

        assert_eq!(a.entries, b.entries);
        assert_eq!(a.entries[0].updated, Some(DateTime::parse(T2).unwrap()));
    }

    #[test]
    fn validate() {
        let mut feed = Feed::new();
        assert!(feed.validate().is_err());

        feed.id = Some("tag:f".to_owned());
        feed.title = Some("F".into());
        feed.updated = Some(DateTime::now());
        assert_eq!(feed.validate(), Ok(()));

        let mut e = entry("x", Some(T1));
        e.title = Some("E".into());
        e.content = Some("C".into());
        feed.push(e);
        assert_eq!(
            feed.validate().unwrap_err().to_string(),
            "required element atom:author missing"
        );

        feed.authors.push(Person::new("A"));
        assert_eq!(feed.validate(), Ok(()));
    }
}
