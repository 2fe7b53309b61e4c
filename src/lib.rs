//! Atom Syndication Format and Atom Publishing Protocol object model.
//!
//! Atom tools can be used as both a CLI and a library.
//!
//! Entities such as [`Entry`] or [`Feed`] describe their XML shape with a
//! [`Schema`](schema::Schema). Documents are parsed into typed values,
//! keeping unknown elements and attributes in an
//! [`Extensions`](extension::Extensions) bucket, and written back with
//! the same content.
//!
//! ```
//! use atom_tools::{Document, Entry};
//!
//! let mut entry = Entry::parse(
//!     r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>Hi</title></entry>"#,
//!     None,
//! )
//! .unwrap();
//!
//! entry.tag_with("news rust", " ");
//! assert_eq!(entry.categories.len(), 2);
//! assert!(entry.to_xml_string().contains("<category term=\"rust\"/>"));
//! ```

#![warn(missing_docs)]

extern crate self as atom_tools;

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod extension;
pub mod http;
pub mod model;
pub mod schema;
pub mod text;
pub mod util;
pub mod xml;

pub use config::Config;
pub use document::{AnyDocument, Document};
pub use error::{Error, ParseError, Result, ValidationError};
pub use model::{
    Categories, Category, Collection, Control, Entry, Feed, Generator, Link, Person, Service,
    Workspace,
};
pub use text::{Content, Text, TextType};
pub use util::{date_time::DateTime, url::Url};

/// Namespace of the Atom Syndication Format.
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Namespace of the Atom Publishing Protocol.
pub const APP_NS: &str = "http://www.w3.org/2007/app";

/// Namespace of XHTML.
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
