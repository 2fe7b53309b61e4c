use http::{HeaderMap, StatusCode};
use once_cell::sync::Lazy;

use super::Collection;
use crate::{
    document::Document,
    error::Result,
    extension::Extensions,
    http::{expect_content_type, expect_status, get, Client, SERVICE_MEDIA_TYPE},
    schema::{lens, Entity, Schema},
    text::Text,
    APP_NS, ATOM_NS,
};

/// Service document.
///
/// ```text
/// appService =
///    element app:service {
///       appCommonAttributes,
///       ( appWorkspace+
///         & extensionElement* )
///    }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Service {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension elements and attributes.
    pub extensions: Extensions,
    /// Workspaces.
    pub workspaces: Vec<Workspace>,
}

impl Service {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a service document.
    pub fn fetch(client: &impl Client, url: &str) -> Result<Self> {
        let response = get(client, url, SERVICE_MEDIA_TYPE, HeaderMap::new())?;
        expect_status(url, &response, &[StatusCode::OK])?;
        expect_content_type(url, &response, &[SERVICE_MEDIA_TYPE])?;
        Ok(Self::parse(response.body(), Some(url))?)
    }

    /// Iterate over the collections of every workspace.
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.workspaces
            .iter()
            .flat_map(|workspace| workspace.collections.iter())
    }

    /// Find a collection by `href`.
    pub fn collection(&self, href: &str) -> Option<&Collection> {
        self.collections()
            .find(|collection| collection.href.as_deref() == Some(href))
    }
}

impl Entity for Service {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Service>> = Lazy::new(|| {
            Schema::new(APP_NS, "service", lens!(Service, base), lens!(Service, extensions))
                .many(APP_NS, "workspace", lens!(Service, workspaces))
                .required()
        });
        &SCHEMA
    }
}

impl Document for Service {}

/// Workspace.
///
/// ```text
/// appWorkspace =
///    element app:workspace {
///       appCommonAttributes,
///       ( atomTitle
///         & appCollection*
///         & extensionSansTitleElement* )
///    }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Workspace {
    /// Effective base URI.
    pub base: Option<String>,
    /// Extension elements and attributes.
    pub extensions: Extensions,
    /// Title.
    pub title: Option<Text>,
    /// Collections.
    pub collections: Vec<Collection>,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new(title: impl Into<Text>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

impl Entity for Workspace {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Workspace>> = Lazy::new(|| {
            Schema::new(
                APP_NS,
                "workspace",
                lens!(Workspace, base),
                lens!(Workspace, extensions),
            )
            .text(ATOM_NS, "title", lens!(Workspace, title))
            .required()
            .many(APP_NS, "collection", lens!(Workspace, collections))
        });
        &SCHEMA
    }
}
