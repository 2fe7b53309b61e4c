//! Boundary with an HTTP client.
//!
//! Entities that fetch or publish documents take a [`Client`] for each
//! call. Transport, authentication, and retries belong to the client.

use http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderMap, HeaderValue, Method, Request, Response, StatusCode,
};
use tracing::debug;

use crate::error::{BoxError, Error, Result};

/// Media type of Atom documents.
pub const ATOM_MEDIA_TYPE: &str = "application/atom+xml";

/// Media type of Atom entry documents.
pub const ENTRY_MEDIA_TYPE: &str = "application/atom+xml;type=entry";

/// Media type of AtomPub service documents.
pub const SERVICE_MEDIA_TYPE: &str = "application/atomsvc+xml";

/// Media type of AtomPub category documents.
pub const CATEGORIES_MEDIA_TYPE: &str = "application/atomcat+xml";

/// Sends HTTP requests.
pub trait Client {
    /// Send a request and return the response, whatever its status.
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, BoxError>;
}

impl<C: Client + ?Sized> Client for &C {
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, BoxError> {
        (**self).send(request)
    }
}

/// Send a request through a client.
pub(crate) fn send(client: &impl Client, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
    debug!(method = %request.method(), uri = %request.uri(), "sending request");
    let response = client.send(request).map_err(Error::Transport)?;
    debug!(status = %response.status(), "received response");
    Ok(response)
}

/// Send a `GET` request with an `Accept` header and extra headers.
pub(crate) fn get(
    client: &impl Client,
    url: &str,
    accept: &str,
    headers: HeaderMap,
) -> Result<Response<Vec<u8>>> {
    let mut request = Request::builder()
        .method(Method::GET)
        .uri(url)
        .header(ACCEPT, accept)
        .body(Vec::new())?;
    request.headers_mut().extend(headers);
    send(client, request)
}

/// Send a request with a body.
pub(crate) fn send_body(
    client: &impl Client,
    method: Method,
    url: &str,
    content_type: &str,
    headers: HeaderMap,
    body: Vec<u8>,
) -> Result<Response<Vec<u8>>> {
    let mut request = Request::builder()
        .method(method)
        .uri(url)
        .header(CONTENT_TYPE, content_type)
        .body(body)?;
    request.headers_mut().extend(headers);
    send(client, request)
}

/// Fail unless the response has one of the given statuses.
pub(crate) fn expect_status(
    url: &str,
    response: &Response<Vec<u8>>,
    expected: &[StatusCode],
) -> Result<()> {
    if expected.contains(&response.status()) {
        Ok(())
    } else {
        Err(Error::Status {
            url: url.to_owned(),
            status: response.status(),
        })
    }
}

/// Fail unless the response media type is one of `expected`.
///
/// Parameters are ignored on both sides.
pub(crate) fn expect_content_type(
    url: &str,
    response: &Response<Vec<u8>>,
    expected: &'static [&'static str],
) -> Result<()> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let found = content_type.map(essence);
    if found.is_some_and(|found| expected.iter().any(|e| essence(e) == found)) {
        Ok(())
    } else {
        Err(Error::ContentType {
            url: url.to_owned(),
            content_type: content_type.map(str::to_owned),
            expected,
        })
    }
}

/// Value of a response header as a string.
pub(crate) fn header<'a>(response: &'a Response<Vec<u8>>, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

/// Insert a header, skipping values that are not valid header values.
pub(crate) fn insert_header(headers: &mut HeaderMap, name: http::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

/// Lowercase media type without parameters.
pub(crate) fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use http::{header::CONTENT_TYPE, Response, StatusCode};

    use super::{essence, expect_content_type, expect_status, ATOM_MEDIA_TYPE};
    use crate::error::Error;

    #[test]
    fn media_type_essence() {
        const CASES: [(&str, &str); 3] = [
            ("application/atom+xml", "application/atom+xml"),
            ("Application/Atom+XML; charset=utf-8", "application/atom+xml"),
            ("application/atom+xml;type=entry", "application/atom+xml"),
        ];

        for (input, expected) in CASES {
            let output = essence(input);
            assert_eq!(
                output, expected,
                "\nessence({input:?}) expected {expected:?} but received {output:?}"
            );
        }
    }

    #[test]
    fn check_response() {
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/atom+xml;type=feed")
            .body(Vec::new())
            .unwrap();

        assert!(expect_status("u", &response, &[StatusCode::OK]).is_ok());
        assert!(matches!(
            expect_status("u", &response, &[StatusCode::CREATED]),
            Err(Error::Status { .. })
        ));
        assert!(expect_content_type("u", &response, &[ATOM_MEDIA_TYPE]).is_ok());
        assert!(matches!(
            expect_content_type("u", &response, &["text/html"]),
            Err(Error::ContentType { .. })
        ));
    }
}
