//! Atom and AtomPub entities.
//!
//! The entities follow [RFC 4287](https://www.rfc-editor.org/rfc/rfc4287)
//! and [RFC 5023](https://www.rfc-editor.org/rfc/rfc5023). Every entity
//! implements [`Entity`](crate::schema::Entity): elements and attributes
//! that it does not declare are kept in its extensions.

mod category;
mod collection;
mod control;
mod entry;
mod feed;
mod generator;
mod link;
mod person;
mod service;

pub use self::{
    category::Category,
    collection::{Categories, Collection, DEFAULT_ACCEPT},
    control::Control,
    entry::Entry,
    feed::Feed,
    generator::Generator,
    link::Link,
    person::Person,
    service::{Service, Workspace},
};
