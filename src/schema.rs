//! Declarative mapping between entities and XML elements.
//!
//! Every entity type describes its XML shape once, as a [`Schema`] table
//! built on first use. The same table drives [`parse_entity`] and
//! [`build_entity`], so reading and writing never disagree on element
//! names, order, or cardinality.
//!
//! ```
//! use atom_tools::{model::Link, schema::Entity};
//!
//! let mut link = Link::new("http://example.org/");
//! link.set_field("rel", Some("edit")).unwrap();
//! assert_eq!(link.field("rel").unwrap().as_deref(), Some("edit"));
//! assert!(link.field("colour").is_err());
//! ```

use tracing::trace;

use crate::{
    error::{Error, ParseError},
    extension::Extensions,
    text::{Content, Text},
    util::{date_time::DateTime, url},
    xml::{Element, Name, Node, XML_NS},
    APP_NS, ATOM_NS,
};

/// A type described by a [`Schema`].
pub trait Entity: Default + Sized + 'static {
    /// Return the schema of the type.
    fn schema() -> &'static Schema<Self>;

    /// Effective base URI of the entity.
    fn base(&self) -> Option<&str> {
        Self::schema().base.get(self).as_deref()
    }

    /// Set the base URI of the entity.
    fn set_base(&mut self, base: Option<String>) {
        *Self::schema().base.get_mut(self) = base;
    }

    /// Extension elements and attributes of the entity.
    fn extensions(&self) -> &Extensions {
        Self::schema().extensions.get(self)
    }

    /// Mutable extension elements and attributes of the entity.
    fn extensions_mut(&mut self) -> &mut Extensions {
        Self::schema().extensions.get_mut(self)
    }

    /// Parse the entity from an element, whatever its name.
    fn from_element(element: &Element, base: Option<&str>) -> Result<Self, ParseError> {
        parse_entity(element, base)
    }

    /// Build an element named after the schema.
    fn to_element(&self) -> Element {
        build_entity(self, Self::schema().name(), None)
    }

    /// Get a scalar field or attribute by its local name.
    fn field(&self, name: &str) -> Result<Option<String>, Error> {
        Self::schema().get(self, name)
    }

    /// Set a scalar field or attribute by its local name.
    fn set_field(&mut self, name: &str, value: Option<&str>) -> Result<(), Error> {
        Self::schema().set(self, name, value)
    }

    /// Local name of the first required field that is not set.
    fn missing_field(&self) -> Option<&'static str> {
        Self::schema().missing(self)
    }
}

/// Accessors for one field of an entity.
pub struct Lens<T, V> {
    getter: fn(&T) -> &V,
    setter: fn(&mut T) -> &mut V,
}

impl<T, V> Lens<T, V> {
    /// Create a lens from a getter and a mutable getter.
    pub const fn new(getter: fn(&T) -> &V, setter: fn(&mut T) -> &mut V) -> Self {
        Self { getter, setter }
    }

    /// Borrow the field.
    pub fn get<'a>(&self, entity: &'a T) -> &'a V {
        (self.getter)(entity)
    }

    /// Borrow the field mutably.
    pub fn get_mut<'a>(&self, entity: &'a mut T) -> &'a mut V {
        (self.setter)(entity)
    }
}

impl<T, V> Clone for Lens<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Lens<T, V> {}

/// Create a [`Lens`] on a field of a struct.
macro_rules! lens {
    ($entity:ty, $field:ident) => {
        $crate::schema::Lens::new(
            |entity: &$entity| &entity.$field,
            |entity: &mut $entity| &mut entity.$field,
        )
    };
}

pub(crate) use lens;

/// The XML shape of an entity type.
pub struct Schema<T: 'static> {
    namespace: &'static str,
    local: &'static str,
    base: Lens<T, Option<String>>,
    extensions: Lens<T, Extensions>,
    fields: Vec<Field<T>>,
}

/// A binding between a field and an attribute or child elements.
pub struct Field<T: 'static> {
    namespace: Option<&'static str>,
    local: &'static str,
    required: bool,
    kind: Kind<T>,
}

enum Kind<T: 'static> {
    Attribute {
        lens: Lens<T, Option<String>>,
        absolute: bool,
    },
    Body(Lens<T, String>),
    String(Lens<T, Option<String>>),
    Strings(Lens<T, Vec<String>>),
    Timestamp(Lens<T, Option<DateTime>>),
    Text(Lens<T, Option<Text>>),
    Content(Lens<T, Option<Content>>),
    Entity(Box<dyn Nested<T>>),
}

/// A field holding one or several nested entities.
trait Nested<T>: Send + Sync {
    fn parse(&self, entity: &mut T, element: &Element, base: Option<&str>)
        -> Result<(), ParseError>;

    fn build(&self, entity: &T, name: &Name, base: Option<&str>, parent: &mut Element);

    fn is_set(&self, entity: &T) -> bool;

    fn is_repeated(&self) -> bool;
}

struct One<T, C> {
    lens: Lens<T, Option<C>>,
}

struct Many<T, C> {
    lens: Lens<T, Vec<C>>,
}

impl<T: 'static, C: Entity> Nested<T> for One<T, C> {
    fn parse(
        &self,
        entity: &mut T,
        element: &Element,
        base: Option<&str>,
    ) -> Result<(), ParseError> {
        *self.lens.get_mut(entity) = Some(parse_entity(element, base)?);
        Ok(())
    }

    fn build(&self, entity: &T, name: &Name, base: Option<&str>, parent: &mut Element) {
        if let Some(child) = self.lens.get(entity) {
            parent.push_element(build_entity(child, name.clone(), base));
        }
    }

    fn is_set(&self, entity: &T) -> bool {
        self.lens.get(entity).is_some()
    }

    fn is_repeated(&self) -> bool {
        false
    }
}

impl<T: 'static, C: Entity> Nested<T> for Many<T, C> {
    fn parse(
        &self,
        entity: &mut T,
        element: &Element,
        base: Option<&str>,
    ) -> Result<(), ParseError> {
        self.lens.get_mut(entity).push(parse_entity(element, base)?);
        Ok(())
    }

    fn build(&self, entity: &T, name: &Name, base: Option<&str>, parent: &mut Element) {
        for child in self.lens.get(entity) {
            parent.push_element(build_entity(child, name.clone(), base));
        }
    }

    fn is_set(&self, entity: &T) -> bool {
        !self.lens.get(entity).is_empty()
    }

    fn is_repeated(&self) -> bool {
        true
    }
}

impl<T: Entity> Schema<T> {
    /// Create a schema for elements named `{namespace}local`.
    pub fn new(
        namespace: &'static str,
        local: &'static str,
        base: Lens<T, Option<String>>,
        extensions: Lens<T, Extensions>,
    ) -> Self {
        Self {
            namespace,
            local,
            base,
            extensions,
            fields: Vec::new(),
        }
    }

    fn field(mut self, namespace: Option<&'static str>, local: &'static str, kind: Kind<T>) -> Self {
        self.fields.push(Field {
            namespace,
            local,
            required: false,
            kind,
        });
        self
    }

    /// Bind an unqualified attribute.
    pub fn attribute(self, local: &'static str, lens: Lens<T, Option<String>>) -> Self {
        self.field(
            None,
            local,
            Kind::Attribute {
                lens,
                absolute: false,
            },
        )
    }

    /// Bind an attribute in `namespace`.
    pub fn attribute_ns(
        self,
        namespace: &'static str,
        local: &'static str,
        lens: Lens<T, Option<String>>,
    ) -> Self {
        self.field(
            Some(namespace),
            local,
            Kind::Attribute {
                lens,
                absolute: false,
            },
        )
    }

    /// Bind an unqualified attribute holding a URI, resolved against the
    /// entity base when parsed.
    pub fn uri_attribute(self, local: &'static str, lens: Lens<T, Option<String>>) -> Self {
        self.field(
            None,
            local,
            Kind::Attribute {
                lens,
                absolute: true,
            },
        )
    }

    /// Bind the character data of the element itself.
    pub fn body(self, lens: Lens<T, String>) -> Self {
        self.field(None, "", Kind::Body(lens))
    }

    /// Bind a child element holding a string.
    pub fn string(
        self,
        namespace: &'static str,
        local: &'static str,
        lens: Lens<T, Option<String>>,
    ) -> Self {
        self.field(Some(namespace), local, Kind::String(lens))
    }

    /// Bind repeated child elements holding strings.
    pub fn strings(
        self,
        namespace: &'static str,
        local: &'static str,
        lens: Lens<T, Vec<String>>,
    ) -> Self {
        self.field(Some(namespace), local, Kind::Strings(lens))
    }

    /// Bind a child element holding a date construct.
    pub fn timestamp(
        self,
        namespace: &'static str,
        local: &'static str,
        lens: Lens<T, Option<DateTime>>,
    ) -> Self {
        self.field(Some(namespace), local, Kind::Timestamp(lens))
    }

    /// Bind a child element holding a text construct.
    pub fn text(
        self,
        namespace: &'static str,
        local: &'static str,
        lens: Lens<T, Option<Text>>,
    ) -> Self {
        self.field(Some(namespace), local, Kind::Text(lens))
    }

    /// Bind a child element holding content.
    pub fn content(
        self,
        namespace: &'static str,
        local: &'static str,
        lens: Lens<T, Option<Content>>,
    ) -> Self {
        self.field(Some(namespace), local, Kind::Content(lens))
    }

    /// Bind a child element holding a nested entity.
    pub fn one<C: Entity>(
        self,
        namespace: &'static str,
        local: &'static str,
        lens: Lens<T, Option<C>>,
    ) -> Self {
        self.field(
            Some(namespace),
            local,
            Kind::Entity(Box::new(One { lens })),
        )
    }

    /// Bind repeated child elements holding nested entities.
    pub fn many<C: Entity>(
        self,
        namespace: &'static str,
        local: &'static str,
        lens: Lens<T, Vec<C>>,
    ) -> Self {
        self.field(
            Some(namespace),
            local,
            Kind::Entity(Box::new(Many { lens })),
        )
    }

    /// Mark the last bound field as required.
    pub fn required(mut self) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.required = true;
        }
        self
    }

    /// Expanded name of the element.
    pub fn name(&self) -> Name {
        Name::new(Some(self.namespace), self.local)
    }

    /// Field bindings in build order.
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Local name of the first required field that is not set.
    pub fn missing(&self, entity: &T) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|field| field.required && !field.is_set(entity))
            .map(|field| field.local)
    }

    /// Get a scalar field or attribute by its local name.
    pub fn get(&self, entity: &T, name: &str) -> Result<Option<String>, Error> {
        let field = self.lookup(name)?;
        match &field.kind {
            Kind::Attribute { lens, .. } | Kind::String(lens) => Ok(lens.get(entity).clone()),
            Kind::Timestamp(lens) => Ok(lens.get(entity).map(|t| t.to_string())),
            Kind::Text(lens) => Ok(lens.get(entity).as_ref().map(ToString::to_string)),
            Kind::Content(lens) => Ok(lens.get(entity).as_ref().map(ToString::to_string)),
            _ => Err(self.schema_error(name)),
        }
    }

    /// Set a scalar field or attribute by its local name.
    ///
    /// Text fields are set as plain text.
    pub fn set(&self, entity: &mut T, name: &str, value: Option<&str>) -> Result<(), Error> {
        let field = self.lookup(name)?;
        match &field.kind {
            Kind::Attribute { lens, .. } | Kind::String(lens) => {
                *lens.get_mut(entity) = value.map(str::to_owned);
            },
            Kind::Timestamp(lens) => {
                *lens.get_mut(entity) = value
                    .map(|value| {
                        DateTime::parse(value)
                            .map_err(|_| ParseError::Timestamp(value.to_owned()))
                    })
                    .transpose()?;
            },
            Kind::Text(lens) => *lens.get_mut(entity) = value.map(Text::new),
            Kind::Content(lens) => *lens.get_mut(entity) = value.map(Content::new),
            _ => return Err(self.schema_error(name)),
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<&Field<T>, Error> {
        self.fields
            .iter()
            .find(|field| !field.local.is_empty() && field.local == name)
            .ok_or_else(|| self.schema_error(name))
    }

    fn schema_error(&self, name: &str) -> Error {
        Error::Schema {
            entity: self.local,
            name: name.to_owned(),
        }
    }
}

impl<T: 'static> Field<T> {
    /// Expanded name of the attribute or child element.
    pub fn name(&self) -> Name {
        Name::new(self.namespace, self.local)
    }

    /// Check if the field is required for the entity to be valid.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Check if the field maps an attribute.
    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, Kind::Attribute { .. })
    }

    /// Check if the field maps repeated child elements.
    pub fn is_repeated(&self) -> bool {
        match &self.kind {
            Kind::Strings(_) => true,
            Kind::Entity(nested) => nested.is_repeated(),
            _ => false,
        }
    }

    fn is_set(&self, entity: &T) -> bool {
        match &self.kind {
            Kind::Attribute { lens, .. } | Kind::String(lens) => lens.get(entity).is_some(),
            Kind::Body(lens) => !lens.get(entity).is_empty(),
            Kind::Strings(lens) => !lens.get(entity).is_empty(),
            Kind::Timestamp(lens) => lens.get(entity).is_some(),
            Kind::Text(lens) => lens.get(entity).is_some(),
            Kind::Content(lens) => lens.get(entity).is_some(),
            Kind::Entity(nested) => nested.is_set(entity),
        }
    }

    /// Fill the field from a matching child element.
    fn parse_child(
        &self,
        entity: &mut T,
        child: &Element,
        base: Option<&str>,
    ) -> Result<(), ParseError> {
        match &self.kind {
            Kind::Attribute { .. } | Kind::Body(_) => {},
            Kind::String(lens) => *lens.get_mut(entity) = Some(child.text()),
            Kind::Strings(lens) => lens.get_mut(entity).push(child.text()),
            Kind::Timestamp(lens) => {
                let text = child.text();
                let timestamp =
                    DateTime::parse(&text).map_err(|_| ParseError::Timestamp(text.clone()))?;
                *lens.get_mut(entity) = Some(timestamp);
            },
            Kind::Text(lens) => *lens.get_mut(entity) = Some(Text::from_element(child, base)?),
            Kind::Content(lens) => {
                *lens.get_mut(entity) = Some(Content::from_element(child, base)?)
            },
            Kind::Entity(nested) => nested.parse(entity, child, base)?,
        }
        Ok(())
    }

    /// Append the field to an element being built.
    fn build(&self, entity: &T, base: Option<&str>, element: &mut Element) {
        match &self.kind {
            Kind::Attribute { lens, .. } => {
                if let Some(value) = lens.get(entity) {
                    element.set_attribute(self.name(), value.as_str());
                }
            },
            Kind::Body(lens) => element.push_text(lens.get(entity)),
            Kind::String(lens) => {
                if let Some(value) = lens.get(entity) {
                    element.push_element(new_element(self.name()).with_text(value));
                }
            },
            Kind::Strings(lens) => {
                for value in lens.get(entity) {
                    element.push_element(new_element(self.name()).with_text(value));
                }
            },
            Kind::Timestamp(lens) => {
                if let Some(value) = lens.get(entity) {
                    element.push_element(new_element(self.name()).with_text(value.to_string()));
                }
            },
            Kind::Text(lens) => {
                if let Some(text) = lens.get(entity) {
                    element.push_element(text.to_element(self.name(), base));
                }
            },
            Kind::Content(lens) => {
                if let Some(content) = lens.get(entity) {
                    element.push_element(content.to_element(self.name(), base));
                }
            },
            Kind::Entity(nested) => nested.build(entity, &self.name(), base, element),
        }
    }
}

/// Create an element, hinting the usual prefix of Atom and AtomPub names.
pub(crate) fn new_element(name: Name) -> Element {
    let prefix = match name.namespace.as_deref() {
        Some(ATOM_NS) => Some("atom"),
        Some(APP_NS) => Some("app"),
        _ => None,
    };
    let mut element = Element::new(name);
    element.prefix = prefix.map(str::to_owned);
    element
}

/// Resolve the `xml:base` attribute of an element against an inherited base.
pub(crate) fn resolve_base(element: &Element, base: Option<&str>) -> Option<String> {
    match element.attribute(Some(XML_NS), "base") {
        Some(href) => {
            let resolved = url::resolve(base, href);
            trace!(href, base = resolved.as_str(), "resolved xml:base");
            Some(resolved)
        },
        None => base.map(str::to_owned),
    }
}

/// Parse an entity from an element.
///
/// The element name itself is not checked. Children and attributes that no
/// field claims are collected as extensions. When a singular field matches
/// several children, the first one wins and the others become extensions.
pub fn parse_entity<T: Entity>(element: &Element, base: Option<&str>) -> Result<T, ParseError> {
    let schema = T::schema();
    let mut entity = T::default();

    let base = resolve_base(element, base);
    let base = base.as_deref();

    let mut claimed_attributes: Vec<bool> = element
        .attributes
        .iter()
        .map(|attribute| attribute.name.is(Some(XML_NS), "base"))
        .collect();
    let mut claimed_children = vec![false; element.children.len()];

    for field in &schema.fields {
        match &field.kind {
            Kind::Attribute { lens, absolute } => {
                let found = element
                    .attributes
                    .iter()
                    .enumerate()
                    .find(|(i, attribute)| {
                        !claimed_attributes[*i] && attribute.name.is(field.namespace, field.local)
                    });
                if let Some((i, attribute)) = found {
                    claimed_attributes[i] = true;
                    let value = if *absolute {
                        url::resolve(base, &attribute.value)
                    } else {
                        attribute.value.clone()
                    };
                    *lens.get_mut(&mut entity) = Some(value);
                }
            },
            Kind::Body(lens) => *lens.get_mut(&mut entity) = element.text(),
            _ => {
                for (i, child) in element.children.iter().enumerate() {
                    let Node::Element(child) = child else {
                        continue;
                    };
                    if claimed_children[i] || !child.name.is(field.namespace, field.local) {
                        continue;
                    }
                    claimed_children[i] = true;
                    field.parse_child(&mut entity, child, base)?;
                    if !field.is_repeated() {
                        break;
                    }
                }
            },
        }
    }

    *schema.base.get_mut(&mut entity) = base.map(str::to_owned);

    let extensions = schema.extensions.get_mut(&mut entity);

    for (attribute, claimed) in element.attributes.iter().zip(claimed_attributes) {
        if !claimed {
            trace!(name = %attribute.name, "extension attribute");
            extensions.attributes.push(attribute.clone());
        }
    }

    for (child, claimed) in element.children.iter().zip(claimed_children) {
        if let (Node::Element(child), false) = (child, claimed) {
            trace!(name = %child.name, "extension element");
            extensions.elements.push(child.clone());
        }
    }

    Ok(entity)
}

/// Build an element named `name` from an entity.
///
/// Fields are written in declared order, then extensions. `xml:base` is
/// written when the entity base differs from `parent_base`.
pub fn build_entity<T: Entity>(entity: &T, name: Name, parent_base: Option<&str>) -> Element {
    let schema = T::schema();
    let base = schema.base.get(entity).as_deref();

    let mut element = new_element(name);

    for field in &schema.fields {
        field.build(entity, base, &mut element);
    }

    schema.extensions.get(entity).write_into(&mut element);

    if let Some(base) = base {
        if parent_base != Some(base) {
            element.set_attribute(Name::new(Some(XML_NS), "base"), base);
        }
    }

    element
}
