//! Parse and resolve URLs.
//!
//! This module provides the [`Url`] type, used to resolve `xml:base`
//! attributes and relative references as described in
//! [RFC 3986](https://www.rfc-editor.org/rfc/rfc3986#section-5.2).

pub use self::path::Path as UrlPath;

/// An owned URL (or URL reference).
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct Url(String);

impl Url {
    /// Create an empty URL.
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Return a reference to the inner [`str`] slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the [`Url`] and return the inner [`String`].
    pub fn into_string(self) -> String {
        self.0
    }

    /// Return an iterator over the [`Component`]s of the URL.
    pub fn components(&self) -> Components {
        Components {
            url: self.0.trim(),
            state: State::Start,
        }
    }

    /// Return the scheme component, if any.
    pub fn scheme(&self) -> Option<&str> {
        self.components().find_map(|component| match component {
            Component::Scheme(s) => Some(s),
            _ => None,
        })
    }

    /// Return the authority component, if any.
    pub fn authority(&self) -> Option<&str> {
        self.components().find_map(|component| match component {
            Component::Authority(s) => Some(s),
            _ => None,
        })
    }

    /// Return the path component.
    pub fn path(&self) -> &str {
        self.components()
            .find_map(|component| match component {
                Component::Path(s) => Some(s),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Return the query component, if any.
    pub fn query(&self) -> Option<&str> {
        self.components().find_map(|component| match component {
            Component::Query(s) => Some(s),
            _ => None,
        })
    }

    /// Return the fragment component, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.components().find_map(|component| match component {
            Component::Fragment(s) => Some(s),
            _ => None,
        })
    }

    /// Check if the URL has a scheme.
    pub fn is_absolute(&self) -> bool {
        self.scheme().is_some()
    }

    /// Resolve a reference against `self`, taken as the base URL.
    pub fn resolve(&self, reference: impl AsRef<str>) -> Self {
        let reference = Url::from(reference.as_ref());

        if self.0.trim().is_empty() {
            return reference;
        }

        let mut parts = Parts::default();

        if let Some(scheme) = reference.scheme() {
            parts.scheme = Some(scheme);
            parts.authority = reference.authority();
            parts.path = UrlPath::from(reference.path()).remove_dot_segments();
            parts.query = reference.query();
        } else {
            parts.scheme = self.scheme();
            if let Some(authority) = reference.authority() {
                parts.authority = Some(authority);
                parts.path = UrlPath::from(reference.path()).remove_dot_segments();
                parts.query = reference.query();
            } else {
                parts.authority = self.authority();
                if reference.path().is_empty() {
                    parts.path = UrlPath::from(self.path());
                    parts.query = reference.query().or_else(|| self.query());
                } else {
                    parts.path = if reference.path().starts_with('/') {
                        UrlPath::from(reference.path())
                    } else {
                        UrlPath::from(self.path())
                            .merge(reference.path(), self.authority().is_some())
                    }
                    .remove_dot_segments();
                    parts.query = reference.query();
                }
            }
        }

        parts.fragment = reference.fragment();

        Self(parts.to_string())
    }
}

/// Components of a resolved URL, recomposed by [`Url::resolve`].
#[derive(Default)]
struct Parts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: UrlPath,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl std::fmt::Display for Parts<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(scheme) = self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(authority) = self.authority {
            write!(f, "//{authority}")?;
        }
        write!(f, "{}", self.path)?;
        if let Some(query) = self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

/// Resolve `reference` against an optional base.
///
/// Without a base, the reference is returned unchanged.
pub fn resolve(base: Option<&str>, reference: &str) -> String {
    match base {
        Some(base) => Url::from(base).resolve(reference).into_string(),
        None => reference.to_owned(),
    }
}

impl std::fmt::Display for Url {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Url {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<T> From<T> for Url
where
    T: Into<String>,
{
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

/// An iterator over the [`Component`]s of a [`Url`].
#[derive(Debug)]
pub struct Components<'a> {
    url: &'a str,
    state: State,
}

/// A URL component.
#[derive(Debug, PartialEq)]
pub enum Component<'a> {
    /// A scheme.
    Scheme(&'a str),
    /// An authority.
    Authority(&'a str),
    /// A path.
    Path(&'a str),
    /// A query.
    Query(&'a str),
    /// A fragment.
    Fragment(&'a str),
}

/// URL parse state.
#[derive(Debug)]
enum State {
    /// Parsing the scheme, the authority, or the path component.
    Start,
    /// Parsing the authority component.
    Authority,
    /// Parsing the path component.
    Path,
    /// Parsing the query component.
    Query,
    /// Parsing the fragment component.
    Fragment,
    /// Finished parsing.
    End,
}

impl<'a> Components<'a> {
    /// Parse the URL until the predicate returns true.
    ///
    /// Returns a triplet `(position, char, component_str)`.
    fn parse_until(&self, predicate: impl Fn(&usize, &char) -> bool) -> (usize, char, &'a str) {
        self.url
            .char_indices()
            .find(|(i, c)| (predicate)(i, c))
            .map(|(i, c)| (i, c, &self.url[..i]))
            .unwrap_or((self.url.len(), '\0', self.url))
    }

    /// Parse the scheme, the authority, or the path component.
    fn parse_start(&mut self) -> Option<Component<'a>> {
        let (i, c, component) = self.parse_until(|i, c| match i {
            0 => !c.is_ascii_alphabetic(),
            _ => !c.is_ascii_alphanumeric() && !['+', '-', '.'].contains(c),
        });

        match c {
            ':' if i > 0 => {
                self.url = &self.url[i + 1..];
                if self.url.starts_with("//") {
                    self.url = &self.url[2..];
                    self.state = State::Authority;
                } else {
                    self.state = State::Path;
                }
                Some(Component::Scheme(component))
            },
            '/' if i == 0 && self.url.starts_with("//") => {
                self.url = &self.url[2..];
                self.parse_authority()
            },
            '\0' => {
                self.state = State::End;
                Some(Component::Path(self.url))
            },
            _ => self.parse_path(),
        }
    }

    /// Parse the authority component.
    fn parse_authority(&mut self) -> Option<Component<'a>> {
        let (i, c, component) = self.parse_until(|_, c| ['/', '?', '#'].contains(c));

        match c {
            '/' => {
                self.url = &self.url[i..];
                self.state = State::Path;
            },
            '?' | '#' => {
                // Empty path, the next state parses it.
                self.url = &self.url[i..];
                self.state = State::Path;
            },
            _ => {
                self.url = &self.url[self.url.len()..];
                self.state = State::Path;
            },
        }

        Some(Component::Authority(component))
    }

    /// Parse the path component.
    fn parse_path(&mut self) -> Option<Component<'a>> {
        let (i, c, component) = self.parse_until(|_, c| ['?', '#'].contains(c));

        match c {
            '?' => {
                self.url = &self.url[i + 1..];
                self.state = State::Query;
            },
            '#' => {
                self.url = &self.url[i + 1..];
                self.state = State::Fragment;
            },
            _ => self.state = State::End,
        }

        Some(Component::Path(component))
    }

    /// Parse the query component.
    fn parse_query(&mut self) -> Option<Component<'a>> {
        let (i, c, component) = self.parse_until(|_, c| *c == '#');

        match c {
            '#' => {
                self.url = &self.url[i + 1..];
                self.state = State::Fragment;
            },
            _ => self.state = State::End,
        }

        Some(Component::Query(component))
    }

    /// Parse the fragment component.
    fn parse_fragment(&mut self) -> Option<Component<'a>> {
        self.state = State::End;
        Some(Component::Fragment(self.url))
    }
}

impl<'a> Iterator for Components<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Start => self.parse_start(),
            State::Authority => self.parse_authority(),
            State::Path => self.parse_path(),
            State::Query => self.parse_query(),
            State::Fragment => self.parse_fragment(),
            State::End => None,
        }
    }
}

impl Component<'_> {
    /// Return the component as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheme(s) => s,
            Self::Authority(s) => s,
            Self::Path(s) => s,
            Self::Query(s) => s,
            Self::Fragment(s) => s,
        }
    }
}

pub mod path;

#[cfg(test)]
mod tests {
    use super::{Component, Url};

    #[test]
    fn url_components() {
        const CASES: [(&str, &[Component]); 6] = [
            (
                "http://a/b/c/d;p?q",
                &[
                    Component::Scheme("http"),
                    Component::Authority("a"),
                    Component::Path("/b/c/d;p"),
                    Component::Query("q"),
                ],
            ),
            (
                "tag:example.org,2003:3",
                &[
                    Component::Scheme("tag"),
                    Component::Path("example.org,2003:3"),
                ],
            ),
            (
                "//g",
                &[Component::Authority("g"), Component::Path("")],
            ),
            (
                "http://example.org?x#y",
                &[
                    Component::Scheme("http"),
                    Component::Authority("example.org"),
                    Component::Path(""),
                    Component::Query("x"),
                    Component::Fragment("y"),
                ],
            ),
            ("#s", &[Component::Path(""), Component::Fragment("s")]),
            ("", &[Component::Path("")]),
        ];

        for (input, expected) in CASES {
            let url = Url::from(input);
            let result: Vec<Component> = url.components().collect();
            assert_eq!(result, expected, "\ncomponents of {input:?}");
        }
    }

    #[test]
    fn resolve_reference() {
        // RFC 3986, section 5.4
        const BASE: &str = "http://a/b/c/d;p?q";
        const CASES: [(&str, &str); 26] = [
            ("g:h", "g:h"),
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            ("g?y#s", "http://a/b/c/g?y#s"),
            (";x", "http://a/b/c/;x"),
            ("g;x", "http://a/b/c/g;x"),
            ("", "http://a/b/c/d;p?q"),
            (".", "http://a/b/c/"),
            ("./", "http://a/b/c/"),
            ("..", "http://a/b/"),
            ("../", "http://a/b/"),
            ("../g", "http://a/b/g"),
            ("../..", "http://a/"),
            ("../../", "http://a/"),
            ("../../g", "http://a/g"),
            ("../../../g", "http://a/g"),
            ("/./g", "http://a/g"),
            ("g/../h", "http://a/b/c/h"),
            ("g;x=1/../y", "http://a/b/c/y"),
        ];

        let base = Url::from(BASE);
        for (reference, expected) in CASES {
            let result = base.resolve(reference);
            assert_eq!(
                result.as_str(),
                expected,
                "\nresolving {reference:?} against {BASE:?}"
            );
        }
    }

    #[test]
    fn resolve_against_authority_only() {
        assert_eq!(
            Url::from("http://example.org").resolve("feed.atom").as_str(),
            "http://example.org/feed.atom"
        );
    }

    #[test]
    fn resolve_without_base() {
        assert_eq!(super::resolve(None, "foo/bar"), "foo/bar");
        assert_eq!(Url::new().resolve("foo/bar").as_str(), "foo/bar");
    }
}
