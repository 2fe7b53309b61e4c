use http::{header::LOCATION, HeaderMap, HeaderName, Method, Response, StatusCode};
use once_cell::sync::Lazy;

use super::{Category, Entry, Feed};
use crate::{
    document::Document,
    error::{Error, Result},
    extension::Extensions,
    http::{
        essence, expect_content_type, expect_status, get, header, insert_header, send,
        send_body, Client, ATOM_MEDIA_TYPE, CATEGORIES_MEDIA_TYPE, ENTRY_MEDIA_TYPE,
    },
    schema::{lens, Entity, Schema},
    text::Text,
    APP_NS, ATOM_NS,
};

/// Media ranges accepted by a collection without `app:accept`.
pub const DEFAULT_ACCEPT: &str = ENTRY_MEDIA_TYPE;

/// Collection.
///
/// ```text
/// appCollection =
///    element app:collection {
///       appCommonAttributes,
///       attribute href { atomURI  },
///       ( atomTitle
///         & appAccept*
///         & appCategories*
///         & extensionSansTitleElement* )
///    }
/// ```
///
/// `href` is resolved against the base of the collection, itself inherited
/// from the workspace and the service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collection {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension elements and attributes.
    pub extensions: Extensions,
    /// IRI of the collection.
    pub href: Option<String>,
    /// Title.
    pub title: Option<Text>,
    /// Accepted media ranges.
    pub accept: Vec<String>,
    /// Allowed categories.
    pub categories: Vec<Categories>,
}

impl Collection {
    /// Create a collection located at `href`.
    pub fn new(href: impl Into<String>, title: impl Into<Text>) -> Self {
        Self {
            href: Some(href.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Accepted media ranges, defaulting to Atom entries.
    pub fn accepts(&self) -> Vec<&str> {
        if self.accept.is_empty() {
            vec![DEFAULT_ACCEPT]
        } else {
            self.accept.iter().map(|accept| accept.trim()).collect()
        }
    }

    /// Check if a media type matches one of the accepted media ranges.
    ///
    /// Ranges may use `type/*` and `*/*` wildcards. Parameters are ignored,
    /// except that a range restricted to `type=entry` rejects other Atom
    /// document types.
    pub fn accepts_media_type(&self, media_type: &str) -> bool {
        self.accepts()
            .into_iter()
            .any(|range| media_range_matches(range, media_type))
    }

    /// Feed of the collection.
    pub fn feed(&self) -> Result<Feed> {
        let href = self.href()?;
        Ok(Feed::with_uri(href))
    }

    /// Publish an entry, returning the entry created by the server.
    pub fn post(&self, client: &impl Client, entry: &Entry, slug: Option<&str>) -> Result<Entry> {
        let href = self.href()?;
        let response = send_body(
            client,
            Method::POST,
            href,
            ENTRY_MEDIA_TYPE,
            slug_header(slug),
            entry.to_xml_string().into_bytes(),
        )?;
        expect_status(href, &response, &[StatusCode::CREATED])?;
        created_entry(href, &response, Some(entry))
    }

    /// Publish a media resource, returning the media link entry created by
    /// the server.
    pub fn post_media(
        &self,
        client: &impl Client,
        data: Vec<u8>,
        content_type: &str,
        slug: Option<&str>,
    ) -> Result<Entry> {
        let href = self.href()?;
        let response = send_body(
            client,
            Method::POST,
            href,
            content_type,
            slug_header(slug),
            data,
        )?;
        expect_status(href, &response, &[StatusCode::CREATED])?;
        created_entry(href, &response, None)
    }

    /// Replace an entry at its `edit` URL.
    pub fn put(&self, client: &impl Client, entry: &Entry) -> Result<()> {
        let url = entry.edit_url().ok_or(Error::MissingUrl("entry"))?;
        let response = send_body(
            client,
            Method::PUT,
            url,
            ENTRY_MEDIA_TYPE,
            HeaderMap::new(),
            entry.to_xml_string().into_bytes(),
        )?;
        expect_status(url, &response, &[StatusCode::OK, StatusCode::NO_CONTENT])
    }

    /// Delete an entry at its `edit` URL.
    pub fn delete(&self, client: &impl Client, entry: &Entry) -> Result<()> {
        let url = entry.edit_url().ok_or(Error::MissingUrl("entry"))?;
        let request = http::Request::builder()
            .method(Method::DELETE)
            .uri(url)
            .body(Vec::new())?;
        let response = send(client, request)?;
        expect_status(url, &response, &[StatusCode::OK, StatusCode::NO_CONTENT])
    }

    fn href(&self) -> Result<&str> {
        self.href.as_deref().ok_or(Error::MissingUrl("collection"))
    }
}

impl Entity for Collection {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Collection>> = Lazy::new(|| {
            Schema::new(
                APP_NS,
                "collection",
                lens!(Collection, base),
                lens!(Collection, extensions),
            )
            .uri_attribute("href", lens!(Collection, href))
            .required()
            .text(ATOM_NS, "title", lens!(Collection, title))
            .required()
            .strings(APP_NS, "accept", lens!(Collection, accept))
            .many(APP_NS, "categories", lens!(Collection, categories))
        });
        &SCHEMA
    }
}

/// Categories allowed in a collection, inline or out of line.
///
/// ```text
/// appInlineCategories =
///    element app:categories {
///        attribute fixed { "yes" | "no" }?,
///        attribute scheme { atomURI }?,
///        (atomCategory*,
///        undefinedContent)
///    }
///
/// appOutOfLineCategories =
///    element app:categories {
///        attribute href { atomURI },
///        undefinedContent
///    }
/// ```
///
/// Also the root of category documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Categories {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension elements and attributes.
    pub extensions: Extensions,
    /// `yes` when the list is closed.
    pub fixed: Option<String>,
    /// Default scheme of the categories.
    pub scheme: Option<String>,
    /// IRI of a category document.
    pub href: Option<String>,
    /// Categories.
    pub categories: Vec<Category>,
}

impl Categories {
    /// Check if the list is closed.
    pub fn is_fixed(&self) -> bool {
        self.fixed.as_deref().map(str::trim) == Some("yes")
    }

    /// Check if the categories are in a separate document.
    pub fn is_out_of_line(&self) -> bool {
        self.href.is_some()
    }

    /// Fetch a category document.
    pub fn fetch(client: &impl Client, url: &str) -> Result<Self> {
        let response = get(client, url, CATEGORIES_MEDIA_TYPE, HeaderMap::new())?;
        expect_status(url, &response, &[StatusCode::OK])?;
        expect_content_type(url, &response, &[CATEGORIES_MEDIA_TYPE])?;
        Ok(Self::parse(response.body(), Some(url))?)
    }
}

impl Entity for Categories {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Categories>> = Lazy::new(|| {
            Schema::new(
                APP_NS,
                "categories",
                lens!(Categories, base),
                lens!(Categories, extensions),
            )
            .attribute("fixed", lens!(Categories, fixed))
            .attribute("scheme", lens!(Categories, scheme))
            .uri_attribute("href", lens!(Categories, href))
            .many(ATOM_NS, "category", lens!(Categories, categories))
        });
        &SCHEMA
    }
}

impl Document for Categories {}

fn slug_header(slug: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(slug) = slug {
        insert_header(&mut headers, HeaderName::from_static("slug"), slug);
    }
    headers
}

/// Read the entry of a `201 Created` response.
///
/// Without a body, the posted entry is returned with its `edit` link set to
/// the `Location` of the response.
fn created_entry(
    href: &str,
    response: &Response<Vec<u8>>,
    posted: Option<&Entry>,
) -> Result<Entry> {
    let location = header(response, LOCATION.as_str());

    if response.body().iter().all(u8::is_ascii_whitespace) {
        let mut entry = posted.cloned().unwrap_or_default();
        if let Some(location) = location {
            entry.set_edit_url(location);
        }
        return Ok(entry);
    }

    expect_content_type(href, response, &[ATOM_MEDIA_TYPE])?;
    Ok(Entry::parse(response.body(), Some(location.unwrap_or(href)))?)
}

/// Match a media type against a media range.
fn media_range_matches(range: &str, media_type: &str) -> bool {
    let range_essence = essence(range);
    let type_essence = essence(media_type);

    let essence_matches = match range_essence.split_once('/') {
        Some(("*", "*")) => true,
        Some((main, "*")) => type_essence
            .split_once('/')
            .is_some_and(|(type_main, _)| type_main == main),
        _ => range_essence == type_essence,
    };

    let type_parameter = |value: &str| {
        value
            .split(';')
            .skip(1)
            .filter_map(|parameter| parameter.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("type"))
            .map(|(_, value)| value.trim().trim_matches('"').to_ascii_lowercase())
    };

    essence_matches
        && match (type_parameter(range), type_parameter(media_type)) {
            (Some(expected), Some(found)) => expected == found,
            _ => true,
        }
}
