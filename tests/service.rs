//! Service and collection tests.

use std::cell::RefCell;

use atom_tools::{
    error::BoxError, http::Client, schema::Entity, xml::Element, AnyDocument, Categories,
    Collection, Document, Entry, Error, Service,
};
use http::{header::CONTENT_TYPE, Method, Request, Response, StatusCode};

const SERVICE: &str = concat!(
    "<service xmlns=\"http://www.w3.org/2007/app\" xmlns:atom=\"http://www.w3.org/2005/Atom\" ",
    "xml:base=\"http://example.org/\">",
    "<workspace>",
    "<atom:title>Main Site</atom:title>",
    "<collection href=\"blog/main\">",
    "<atom:title>My Blog Entries</atom:title>",
    "<categories href=\"cats/main\"/>",
    "</collection>",
    "<collection xml:base=\"media/\" href=\"pic\">",
    "<atom:title>Pictures</atom:title>",
    "<accept>image/png</accept>",
    "<accept>image/*</accept>",
    "</collection>",
    "</workspace>",
    "<workspace>",
    "<atom:title>Sidebar</atom:title>",
    "<collection href=\"http://other.example.org/links\">",
    "<atom:title>Links</atom:title>",
    "<accept/>",
    "<categories fixed=\"yes\" scheme=\"urn:scheme\">",
    "<atom:category term=\"a\"/><atom:category term=\"b\" scheme=\"urn:other\"/>",
    "</categories>",
    "</collection>",
    "</workspace>",
    "</service>"
);

/// Answers every request with the same response and records requests.
struct MockClient {
    status: StatusCode,
    headers: Vec<(&'static str, &'static str)>,
    body: &'static str,
    requests: RefCell<Vec<Request<Vec<u8>>>>,
}

impl MockClient {
    fn new(
        status: StatusCode,
        headers: &[(&'static str, &'static str)],
        body: &'static str,
    ) -> Self {
        Self {
            status,
            headers: headers.to_vec(),
            body,
            requests: RefCell::default(),
        }
    }
}

impl Client for MockClient {
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, BoxError> {
        self.requests.borrow_mut().push(request);

        let mut response = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            response = response.header(*name, *value);
        }
        Ok(response.body(self.body.as_bytes().to_vec())?)
    }
}

#[test]
fn parse_service() {
    let service = Service::parse(SERVICE, None).unwrap();

    assert_eq!(service.workspaces.len(), 2);
    assert_eq!(
        service.workspaces[0].title.as_ref().unwrap().to_string(),
        "Main Site"
    );

    let hrefs: Vec<_> = service
        .collections()
        .filter_map(|collection| collection.href.as_deref())
        .collect();
    assert_eq!(
        hrefs,
        [
            "http://example.org/blog/main",
            "http://example.org/media/pic",
            "http://other.example.org/links",
        ]
    );

    let blog = service.collection("http://example.org/blog/main").unwrap();
    assert!(blog.categories[0].is_out_of_line());
    assert_eq!(
        blog.categories[0].href.as_deref(),
        Some("http://example.org/cats/main")
    );

    let pictures = service.collection("http://example.org/media/pic").unwrap();
    assert_eq!(pictures.accepts(), ["image/png", "image/*"]);
    assert!(pictures.accepts_media_type("image/jpeg"));
    assert!(!pictures.accepts_media_type("application/atom+xml;type=entry"));

    let links = service.collection("http://other.example.org/links").unwrap();
    assert_eq!(links.accepts(), [""]);
    assert!(!links.accepts_media_type("application/atom+xml;type=entry"));
    assert!(links.categories[0].is_fixed());
    assert_eq!(links.categories[0].categories.len(), 2);
}

#[test]
fn default_accept() {
    let element = Element::parse(concat!(
        "<collection xmlns=\"http://www.w3.org/2007/app\" href=\"http://example.org/c\">",
        "<title xmlns=\"http://www.w3.org/2005/Atom\">C</title>",
        "</collection>"
    ))
    .unwrap();
    let collection = Collection::from_element(&element, None).unwrap();

    assert!(collection.accept.is_empty());
    assert_eq!(collection.accepts(), ["application/atom+xml;type=entry"]);
}

#[test]
fn round_trip() {
    let service = Service::parse(SERVICE, None).unwrap();
    let xml = service.to_xml_string();
    let parsed = Service::parse(&xml, None).unwrap();

    assert_eq!(parsed, service, "\n{xml}");
    assert!(xml.contains("<atom:title>Main Site</atom:title>"), "{xml}");
    assert!(xml.contains("xml:base=\"http://example.org/media/\""), "{xml}");
}

#[test]
fn category_document() {
    const INPUT: &str = concat!(
        "<app:categories xmlns:app=\"http://www.w3.org/2007/app\" ",
        "xmlns=\"http://www.w3.org/2005/Atom\" fixed=\"no\" scheme=\"urn:s\">",
        "<category term=\"x\"/>",
        "</app:categories>"
    );

    let categories = Categories::parse(INPUT, None).unwrap();
    assert!(!categories.is_fixed());
    assert_eq!(categories.scheme.as_deref(), Some("urn:s"));
    assert_eq!(categories.categories[0].term(), "x");

    match AnyDocument::parse(INPUT, None).unwrap() {
        AnyDocument::Categories(other) => assert_eq!(other, categories),
        other => panic!("unexpected document {}", other.kind()),
    }
}

#[test]
fn post_entry() {
    let client = MockClient::new(
        StatusCode::CREATED,
        &[
            ("content-type", "application/atom+xml;type=entry"),
            ("location", "http://example.org/blog/main/1"),
        ],
        concat!(
            "<entry xmlns=\"http://www.w3.org/2005/Atom\">",
            "<id>tag:example.org,2005:1</id><title>Hello</title>",
            "<link rel=\"edit\" href=\"1.atom\"/>",
            "</entry>"
        ),
    );

    let collection = Collection::new("http://example.org/blog/main", "Blog");
    let mut entry = Entry::new();
    entry.title = Some("Hello".into());

    let created = collection.post(&client, &entry, Some("hello")).unwrap();
    assert_eq!(created.id.as_deref(), Some("tag:example.org,2005:1"));
    assert_eq!(created.edit_url(), Some("http://example.org/blog/main/1.atom"));

    let requests = client.requests.borrow();
    let request = &requests[0];
    assert_eq!(request.method(), Method::POST);
    assert_eq!(request.uri(), "http://example.org/blog/main");
    assert_eq!(
        request.headers().get(CONTENT_TYPE).unwrap(),
        "application/atom+xml;type=entry"
    );
    assert_eq!(request.headers().get("slug").unwrap(), "hello");

    let posted = Entry::parse(request.body(), None).unwrap();
    assert_eq!(posted, entry);
}

#[test]
fn post_without_body() {
    let client = MockClient::new(
        StatusCode::CREATED,
        &[("location", "http://example.org/blog/main/2")],
        "",
    );

    let collection = Collection::new("http://example.org/blog/main", "Blog");
    let mut entry = Entry::new();
    entry.title = Some("Bodiless".into());

    let created = collection.post(&client, &entry, None).unwrap();
    assert_eq!(created.title, entry.title);
    assert_eq!(created.edit_url(), Some("http://example.org/blog/main/2"));
    assert!(client.requests.borrow()[0].headers().get("slug").is_none());
}

#[test]
fn post_media() {
    let client = MockClient::new(
        StatusCode::CREATED,
        &[("content-type", "application/atom+xml")],
        concat!(
            "<entry xmlns=\"http://www.w3.org/2005/Atom\">",
            "<link rel=\"edit-media\" href=\"pic/1.png\"/>",
            "<content type=\"image/png\" src=\"pic/1.png\"/>",
            "</entry>"
        ),
    );

    let collection = Collection::new("http://example.org/media/", "Pictures");
    let created = collection
        .post_media(&client, vec![0x89, b'P', b'N', b'G'], "image/png", Some("logo"))
        .unwrap();

    assert_eq!(
        created.edit_media_url(),
        Some("http://example.org/media/pic/1.png")
    );
    assert!(created.content.as_ref().unwrap().is_out_of_line());

    let requests = client.requests.borrow();
    assert_eq!(requests[0].headers().get(CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(requests[0].body(), &[0x89, b'P', b'N', b'G']);
}

#[test]
fn put_and_delete() {
    let collection = Collection::new("http://example.org/blog/main", "Blog");
    let mut entry = Entry::new();

    let client = MockClient::new(StatusCode::NO_CONTENT, &[], "");
    assert!(matches!(
        collection.put(&client, &entry),
        Err(Error::MissingUrl(_))
    ));
    assert!(matches!(
        collection.delete(&client, &entry),
        Err(Error::MissingUrl(_))
    ));
    assert!(client.requests.borrow().is_empty());

    entry.set_edit_url("http://example.org/blog/main/1");
    collection.put(&client, &entry).unwrap();
    collection.delete(&client, &entry).unwrap();

    let requests = client.requests.borrow();
    assert_eq!(requests[0].method(), Method::PUT);
    assert_eq!(requests[1].method(), Method::DELETE);
    assert_eq!(requests[1].uri(), "http://example.org/blog/main/1");

    let client = MockClient::new(StatusCode::FORBIDDEN, &[], "");
    assert!(matches!(
        collection.delete(&client, &entry),
        Err(Error::Status { status, .. }) if status == StatusCode::FORBIDDEN
    ));
}

#[test]
fn fetch_service() {
    let client = MockClient::new(
        StatusCode::OK,
        &[("content-type", "application/atomsvc+xml")],
        concat!(
            "<service xmlns=\"http://www.w3.org/2007/app\">",
            "<workspace><title xmlns=\"http://www.w3.org/2005/Atom\">W</title>",
            "<collection href=\"entries\">",
            "<title xmlns=\"http://www.w3.org/2005/Atom\">E</title>",
            "</collection>",
            "</workspace>",
            "</service>"
        ),
    );

    let service = Service::fetch(&client, "http://example.org/app/service").unwrap();
    assert!(service
        .collection("http://example.org/app/entries")
        .is_some());

    let requests = client.requests.borrow();
    assert_eq!(
        requests[0].headers().get("accept").unwrap(),
        "application/atomsvc+xml"
    );

    let client = MockClient::new(
        StatusCode::OK,
        &[("content-type", "text/plain")],
        "<service xmlns=\"http://www.w3.org/2007/app\"/>",
    );
    assert!(matches!(
        Service::fetch(&client, "http://example.org/app/service"),
        Err(Error::ContentType { .. })
    ));
}
