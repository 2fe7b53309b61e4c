//! Library errors.

use std::fmt::Display;

use thiserror::Error;

use crate::xml::Name;

/// Boxed error returned by an HTTP [`Client`](crate::http::Client).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type of this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Enumerates library errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a valid document.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A field or attribute that the entity does not declare.
    #[error("{entity} has no field or attribute `{name}`")]
    Schema {
        /// Local name of the entity.
        entity: &'static str,
        /// Requested name.
        name: String,
    },
    /// The HTTP client failed.
    #[error("HTTP request failed")]
    Transport(#[source] BoxError),
    /// The server answered with an unexpected status.
    #[error("unexpected HTTP status {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status.
        status: http::StatusCode,
    },
    /// The server answered with an unexpected media type.
    #[error("unexpected Content-Type {content_type:?} from {url}, expected one of {expected:?}")]
    ContentType {
        /// Requested URL.
        url: String,
        /// Response media type, if any.
        content_type: Option<String>,
        /// Accepted media types.
        expected: &'static [&'static str],
    },
    /// An operation needs a URL that the entity does not have.
    #[error("{0} has no URL")]
    MissingUrl(&'static str),
    /// The request could not be built.
    #[error("invalid HTTP request")]
    Request(#[from] http::Error),
}

/// Errors raised while parsing a document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed XML.
    #[error("malformed XML: {message}")]
    Syntax {
        /// Message of the XML parser.
        message: String,
    },
    /// The root element is not the expected one.
    #[error("expected root element {expected}, found {found}")]
    UnexpectedRoot {
        /// Expected root element.
        expected: Name,
        /// Actual root element.
        found: Name,
    },
    /// Content typed `xhtml` is not well-formed.
    #[error("{content:?} can't be parsed as XHTML: {message}")]
    Xhtml {
        /// Offending content.
        content: String,
        /// Message of the XML parser.
        message: String,
    },
    /// Meaningless text construct type.
    #[error("text construct type {0:?} is meaningless")]
    InvalidType(String),
    /// Unparsable date construct.
    #[error("invalid date {0:?}")]
    Timestamp(String),
    /// The root element is not an Atom or AtomPub document.
    #[error("{0} is not the root of a supported document")]
    UnsupportedRoot(Name),
    /// The document could not be read.
    #[error("failed to read document")]
    Read(#[source] std::io::Error),
}

impl ParseError {
    /// Create a syntax error from any message.
    pub fn syntax(message: impl Display) -> Self {
        Self::Syntax {
            message: message.to_string(),
        }
    }
}

/// Reason why an entity is not valid Atom.
///
/// Returned by `validate` methods; parsing and building never check
/// validity.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    /// Create a validation error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
