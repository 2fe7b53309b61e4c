//! Atom text constructs and content.
//!
//! A [`Text`] holds a string or an XHTML fragment, discriminated by its
//! [`TextType`]. [`Content`] extends it with arbitrary media types and
//! out-of-line content referenced by `src`.
//!
//! ```
//! use atom_tools::text::Content;
//!
//! let mut content = Content::from("<p>hi</p>");
//! content.set_type("xhtml").unwrap();
//! assert_eq!(content.to_string(), "<p>hi</p>");
//! ```

use std::{fmt, ops::Deref};

use quick_xml::escape::partial_escape;

use crate::{
    error::ParseError,
    extension::Extensions,
    schema::{new_element, resolve_base},
    util::url,
    xml::{self, Element, Name, Node, Writer, XML_NS},
    XHTML_NS,
};

/// Type of a text construct.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextType {
    /// Plain text.
    #[default]
    Text,
    /// Escaped HTML.
    Html,
    /// An XHTML `div` element.
    Xhtml,
    /// A media type, for content only.
    Media(String),
}

impl TextType {
    /// Parse a `type` attribute value.
    ///
    /// Media types, recognized by a `/`, are only accepted when `media` is
    /// true.
    fn parse(value: &str, media: bool) -> Result<Self, ParseError> {
        match value {
            "text" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            "xhtml" => Ok(Self::Xhtml),
            value if media && value.contains('/') => Ok(Self::Media(value.to_owned())),
            value => Err(ParseError::InvalidType(value.to_owned())),
        }
    }

    /// Return the attribute value of the type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Xhtml => "xhtml",
            Self::Media(media_type) => media_type,
        }
    }

    /// Check if the type is an XML media type.
    pub fn is_xml(&self) -> bool {
        match self {
            Self::Xhtml => true,
            Self::Media(media_type) => {
                let essence = media_type.split(';').next().unwrap_or_default().trim();
                essence.ends_with("+xml") || essence.ends_with("/xml")
            },
            _ => false,
        }
    }
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Value {
    Plain(String),
    /// Wrapper `div` in the XHTML namespace.
    Xhtml(Element),
    /// Inline XML of a media type.
    Markup(Vec<Node>),
}

impl Default for Value {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

/// An Atom text construct (`title`, `subtitle`, `summary`, `rights`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Text {
    kind: TextType,
    value: Value,
    /// Base URI set by an `xml:base` attribute on the construct itself.
    pub base: Option<String>,
    /// Extension attributes such as `xml:lang`, and stray child elements.
    pub extensions: Extensions,
}

impl Text {
    /// Create a plain text construct.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Value::Plain(value.into()),
            ..Default::default()
        }
    }

    /// Create an HTML text construct.
    pub fn html(value: impl Into<String>) -> Self {
        Self {
            kind: TextType::Html,
            ..Self::new(value)
        }
    }

    /// Create an XHTML text construct from markup.
    pub fn xhtml(markup: &str) -> Result<Self, ParseError> {
        Ok(Self {
            kind: TextType::Xhtml,
            value: Value::Xhtml(parse_xhtml(markup)?),
            ..Default::default()
        })
    }

    /// Type of the construct.
    pub fn text_type(&self) -> &TextType {
        &self.kind
    }

    /// Change the type.
    ///
    /// Accepts `text`, `html` and `xhtml`. Switching to `xhtml` parses the
    /// current value as markup; on failure, the construct is left
    /// unchanged.
    pub fn set_type(&mut self, value: &str) -> Result<(), ParseError> {
        let kind = TextType::parse(value, false)?;
        self.transition(kind)
    }

    fn transition(&mut self, kind: TextType) -> Result<(), ParseError> {
        let value = match (&self.value, &kind) {
            (Value::Xhtml(_), TextType::Xhtml) => None,
            (_, TextType::Xhtml) => Some(Value::Xhtml(parse_xhtml(&self.to_string())?)),
            (Value::Plain(_), _) => None,
            (Value::Markup(_), TextType::Media(_)) => None,
            (Value::Xhtml(_) | Value::Markup(_), _) => Some(Value::Plain(self.to_string())),
        };
        if let Some(value) = value {
            self.value = value;
        }
        self.kind = kind;
        Ok(())
    }

    /// Replace the value, keeping the type.
    ///
    /// For `xhtml`, the value is parsed as markup; on failure, the construct
    /// is left unchanged.
    pub fn set_value(&mut self, value: impl Into<String>) -> Result<(), ParseError> {
        let value = value.into();
        self.value = match self.kind {
            TextType::Xhtml => Value::Xhtml(parse_xhtml(&value)?),
            _ => Value::Plain(value),
        };
        Ok(())
    }

    /// Wrapper `div` of an `xhtml` construct.
    pub fn xhtml_div(&self) -> Option<&Element> {
        match &self.value {
            Value::Xhtml(div) => Some(div),
            _ => None,
        }
    }

    /// Check if the value is empty.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Plain(value) => value.is_empty(),
            Value::Xhtml(div) => div.children.is_empty(),
            Value::Markup(nodes) => nodes.is_empty(),
        }
    }

    /// Render the value so that it can be embedded in an HTML document.
    ///
    /// HTML and XHTML are passed through, anything else is escaped.
    pub fn render_html(&self) -> String {
        match self.kind {
            TextType::Html | TextType::Xhtml => self.to_string(),
            _ => partial_escape(self.to_string().as_str()).into_owned(),
        }
    }

    /// Parse a text construct element.
    pub fn from_element(element: &Element, base: Option<&str>) -> Result<Self, ParseError> {
        read(element, base, false)
    }

    /// Build a text construct element.
    pub fn to_element(&self, name: Name, parent_base: Option<&str>) -> Element {
        let mut element = new_element(name);
        if self.kind != TextType::Text {
            element.set_attribute(Name::local("type"), self.kind.as_str());
        }
        self.write_value(&mut element);
        self.write_meta(&mut element, parent_base);
        element
    }

    fn write_value(&self, element: &mut Element) {
        match &self.value {
            Value::Plain(value) => element.push_text(value),
            Value::Xhtml(div) => element.push_element(div.clone()),
            Value::Markup(nodes) => element.children.extend(nodes.iter().cloned()),
        }
    }

    fn write_meta(&self, element: &mut Element, parent_base: Option<&str>) {
        self.extensions.write_into(element);
        if let Some(base) = &self.base {
            if parent_base != Some(base.as_str()) {
                element.set_attribute(Name::new(Some(XML_NS), "base"), base.as_str());
            }
        }
    }
}

impl fmt::Display for Text {
    /// Write the raw value, or the inner markup of the `div` for `xhtml`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Plain(value) => f.write_str(value),
            Value::Xhtml(div) => f.write_str(&div.inner_xml_string()),
            Value::Markup(nodes) => {
                let mut writer = Writer::new();
                for node in nodes {
                    writer.write_node(node);
                }
                f.write_str(&writer.into_string())
            },
        }
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Content of an entry.
///
/// Dereferences to [`Text`] for read access. Besides the text construct
/// types, it accepts media types and out-of-line content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Content {
    text: Text,
    src: Option<String>,
}

impl Content {
    /// Create plain text content.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            text: Text::new(value),
            src: None,
        }
    }

    /// Create HTML content.
    pub fn html(value: impl Into<String>) -> Self {
        Self {
            text: Text::html(value),
            src: None,
        }
    }

    /// Create XHTML content from markup.
    pub fn xhtml(markup: &str) -> Result<Self, ParseError> {
        Ok(Self {
            text: Text::xhtml(markup)?,
            src: None,
        })
    }

    /// Create out-of-line content.
    pub fn linked(src: impl Into<String>, media_type: &str) -> Result<Self, ParseError> {
        let mut content = Self {
            text: Text::default(),
            src: Some(src.into()),
        };
        content.set_type(media_type)?;
        Ok(content)
    }

    /// Change the type.
    ///
    /// Accepts `text`, `html`, `xhtml`, and any media type containing a `/`.
    pub fn set_type(&mut self, value: &str) -> Result<(), ParseError> {
        let kind = TextType::parse(value, true)?;
        self.text.transition(kind)
    }

    /// Replace the value, keeping the type.
    pub fn set_value(&mut self, value: impl Into<String>) -> Result<(), ParseError> {
        self.text.set_value(value)
    }

    /// URI of out-of-line content.
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Set the URI of out-of-line content.
    pub fn set_src(&mut self, src: Option<String>) {
        self.src = src;
    }

    /// Mutable access to the base and extensions of the construct.
    pub fn text_mut(&mut self) -> &mut Text {
        &mut self.text
    }

    /// Check if the content is out of line.
    pub fn is_out_of_line(&self) -> bool {
        self.src.is_some()
    }

    /// Check if the content is base64-encoded, i.e. of a media type that is
    /// neither XML nor `text/*`.
    pub fn is_binary(&self) -> bool {
        match &self.text.kind {
            TextType::Media(media_type) => {
                !self.text.kind.is_xml() && !media_type.to_ascii_lowercase().starts_with("text/")
            },
            _ => false,
        }
    }

    /// Render the value so that it can be embedded in an HTML document.
    ///
    /// Out-of-line content renders empty.
    pub fn render_html(&self) -> String {
        if self.src.is_some() {
            return String::new();
        }
        self.text.render_html()
    }

    /// Parse a content element.
    pub fn from_element(element: &Element, base: Option<&str>) -> Result<Self, ParseError> {
        let mut text = read(element, base, true)?;
        let src = match text.extensions.attributes.iter().position(|a| a.name.is(None, "src")) {
            Some(i) => {
                let src = text.extensions.attributes.remove(i).value;
                let base = resolve_base(element, base);
                Some(url::resolve(base.as_deref(), &src))
            },
            None => None,
        };
        Ok(Self { text, src })
    }

    /// Build a content element.
    ///
    /// Out-of-line content has no children.
    pub fn to_element(&self, name: Name, parent_base: Option<&str>) -> Element {
        let mut element = new_element(name);
        if self.text.kind != TextType::Text {
            element.set_attribute(Name::local("type"), self.text.kind.as_str());
        }
        match &self.src {
            Some(src) => element.set_attribute(Name::local("src"), src.as_str()),
            None => self.text.write_value(&mut element),
        }
        self.text.write_meta(&mut element, parent_base);
        element
    }
}

impl Deref for Content {
    type Target = Text;

    fn deref(&self) -> &Self::Target {
        &self.text
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text.fmt(f)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Read a text construct or content element.
fn read(element: &Element, base: Option<&str>, media: bool) -> Result<Text, ParseError> {
    let kind = match element.attribute(None, "type") {
        Some(value) => TextType::parse(value, media)?,
        None => TextType::Text,
    };

    let mut text = Text {
        base: element
            .attribute(Some(XML_NS), "base")
            .and_then(|_| resolve_base(element, base)),
        ..Default::default()
    };

    for attribute in &element.attributes {
        if !attribute.name.is(None, "type") && !attribute.name.is(Some(XML_NS), "base") {
            text.extensions.attributes.push(attribute.clone());
        }
    }

    text.value = match &kind {
        TextType::Xhtml => {
            let mut elements = element.child_elements();
            match (elements.next(), elements.next()) {
                (Some(div), None) if div.name.is(Some(XHTML_NS), "div") => Value::Xhtml(div.clone()),
                _ => {
                    let mut div = Element::ns(XHTML_NS, "div");
                    div.children = element.children.clone();
                    Value::Xhtml(div)
                },
            }
        },
        TextType::Media(_) if !element.is_text_only() => Value::Markup(element.children.clone()),
        _ => {
            text.extensions
                .elements
                .extend(element.child_elements().cloned());
            Value::Plain(element.text())
        },
    };
    text.kind = kind;

    Ok(text)
}

/// Parse markup into a wrapper `div` in the XHTML namespace.
///
/// Markup that already consists of a single XHTML `div` is not wrapped
/// again.
fn parse_xhtml(markup: &str) -> Result<Element, ParseError> {
    let wrapped = format!("<div xmlns=\"{XHTML_NS}\">{markup}</div>");
    let div = xml::parse(&wrapped).map_err(|error| ParseError::Xhtml {
        content: markup.to_owned(),
        message: error.to_string(),
    })?;

    let only_child = {
        let mut elements = div.child_elements();
        match (elements.next(), elements.next()) {
            (Some(inner), None) if inner.name.is(Some(XHTML_NS), "div") => Some(inner.clone()),
            _ => None,
        }
    };
    let blank = div
        .children
        .iter()
        .filter_map(Node::as_text)
        .all(|text| text.trim().is_empty());

    match only_child {
        Some(inner) if blank => Ok(inner),
        _ => Ok(div),
    }
}

#[cfg(test)]
mod tests {
    use super::{Content, Text, TextType};
    use crate::{
        error::ParseError,
        xml::{Element, Name},
        ATOM_NS, XHTML_NS,
    };

    #[test]
    fn set_type_xhtml() {
        let mut content = Content::from("<p>hi</p>");
        content.set_type("xhtml").unwrap();

        assert_eq!(*content.text_type(), TextType::Xhtml);
        assert_eq!(content.to_string(), "<p>hi</p>");

        let element = content.to_element(Name::new(Some(ATOM_NS), "content"), None);
        assert_eq!(
            element.to_xml_string(),
            concat!(
                "<atom:content xmlns:atom=\"http://www.w3.org/2005/Atom\" type=\"xhtml\">",
                "<div xmlns=\"http://www.w3.org/1999/xhtml\"><p>hi</p></div>",
                "</atom:content>"
            )
        );
    }

    #[test]
    fn set_type_keeps_existing_div() {
        let mut text = Text::new("<div xmlns=\"http://www.w3.org/1999/xhtml\"><b>x</b></div>");
        text.set_type("xhtml").unwrap();
        let div = text.xhtml_div().unwrap();
        assert!(div.child(Some(XHTML_NS), "b").is_some());
        assert_eq!(text.to_string(), "<b>x</b>");
    }

    #[test]
    fn set_type_invalid() {
        const CASES: [&str; 4] = ["bogus", "", "image/png", "XHTML"];

        for input in CASES {
            let mut text = Text::new("T");
            assert!(
                matches!(text.set_type(input), Err(ParseError::InvalidType(_))),
                "\nText::set_type({input:?}) expected an error"
            );
            assert_eq!(text, Text::new("T"));
        }

        let mut content = Content::new("T");
        assert!(content.set_type("bogus").is_err());
        assert_eq!(*content.text_type(), TextType::Text);
        content.set_type("image/png").unwrap();
        assert_eq!(*content.text_type(), TextType::Media("image/png".to_owned()));
        assert!(content.is_binary());
    }

    #[test]
    fn set_type_malformed_xhtml() {
        let mut text = Text::new("<p>unclosed");
        assert!(matches!(
            text.set_type("xhtml"),
            Err(ParseError::Xhtml { .. })
        ));
        assert_eq!(*text.text_type(), TextType::Text);
        assert_eq!(text.to_string(), "<p>unclosed");
    }

    #[test]
    fn leave_xhtml() {
        let mut text = Text::xhtml("a <em>b</em>").unwrap();
        text.set_type("html").unwrap();
        assert_eq!(*text.text_type(), TextType::Html);
        assert_eq!(text.to_string(), "a <em>b</em>");
        assert!(text.xhtml_div().is_none());
    }

    #[test]
    fn render_prefixed_div() {
        let entry = Element::parse(concat!(
            "<entry xmlns=\"http://www.w3.org/2005/Atom\" ",
            "xmlns:h=\"http://www.w3.org/1999/xhtml\">",
            "<content type=\"xhtml\"><h:div><h:p>hi <h:em>there</h:em></h:p></h:div></content>",
            "</entry>"
        ))
        .unwrap();
        let element = entry.child(Some(ATOM_NS), "content").unwrap();

        let mut content = Content::from_element(element, None).unwrap();
        assert_eq!(content.to_string(), "<p>hi <em>there</em></p>");

        content.set_type("html").unwrap();
        assert_eq!(content.to_string(), "<p>hi <em>there</em></p>");
        content.set_type("xhtml").unwrap();
        let div = content.xhtml_div().unwrap();
        assert!(div.child(Some(XHTML_NS), "p").is_some());
    }

    #[test]
    fn render_html() {
        const CASES: [(&str, &str, &str); 3] = [
            ("text", "a < b & c", "a &lt; b &amp; c"),
            ("html", "a <em>b</em>", "a <em>b</em>"),
            ("xhtml", "a <em>b</em>", "a <em>b</em>"),
        ];

        for (kind, input, expected) in CASES {
            let mut text = Text::new(input);
            text.set_type(kind).unwrap();
            let output = text.render_html();
            assert_eq!(
                output, expected,
                "\nrender_html({kind:?}, {input:?}) expected {expected:?} but received {output:?}"
            );
        }

        let content = Content::linked("http://example.org/a.png", "image/png").unwrap();
        assert_eq!(content.render_html(), "");
    }

    #[test]
    fn parse_text() {
        let element = Element::parse(concat!(
            "<title xmlns=\"http://www.w3.org/2005/Atom\" type=\"html\" xml:lang=\"en\">",
            "A &lt;em&gt;lot&lt;/em&gt;",
            "</title>"
        ))
        .unwrap();
        let text = Text::from_element(&element, None).unwrap();
        assert_eq!(*text.text_type(), TextType::Html);
        assert_eq!(text.to_string(), "A <em>lot</em>");
        assert_eq!(text.extensions.attributes.len(), 1);

        let bad = Element::parse("<title type=\"image/png\">x</title>").unwrap();
        assert!(Text::from_element(&bad, None).is_err());
    }

    #[test]
    fn parse_out_of_line_content() {
        let element = Element::parse(concat!(
            "<content xmlns=\"http://www.w3.org/2005/Atom\" xml:base=\"media/\" ",
            "type=\"image/png\" src=\"a.png\"/>"
        ))
        .unwrap();
        let content = Content::from_element(&element, Some("http://example.org/")).unwrap();
        assert_eq!(content.src(), Some("http://example.org/media/a.png"));
        assert!(content.is_out_of_line());
        assert_eq!(content.base.as_deref(), Some("http://example.org/media/"));

        let built = content.to_element(Name::new(Some(ATOM_NS), "content"), None);
        assert!(built.children.is_empty());
        assert_eq!(built.attribute(None, "src"), Some("http://example.org/media/a.png"));
        assert_eq!(built.attribute(None, "type"), Some("image/png"));
    }

    #[test]
    fn parse_inline_xml_content() {
        let element = Element::parse(concat!(
            "<content xmlns=\"http://www.w3.org/2005/Atom\" type=\"application/xml\">",
            "<x xmlns=\"urn:x\">1</x>",
            "</content>"
        ))
        .unwrap();
        let content = Content::from_element(&element, None).unwrap();
        assert!(!content.is_binary());
        assert_eq!(content.to_string(), "<x xmlns=\"urn:x\">1</x>");
    }
}
