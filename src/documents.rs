//! XML document tree
//!
//! Inventory documents are loaded into a generic, mutable element tree. No
//! typed network/station/stream model is built here: roles are recognized
//! by local name at traversal time, which keeps the tree tolerant of the
//! loosely structured input the repair pass has to deal with.

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, NamespaceScope, QName};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{Cursor, Write};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes, in document order
    pub attributes: IndexMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations made on this element
    pub namespaces: NamespaceContext,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// Get the local name of the element, as written
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Check the element's role by case-insensitive local name
    pub fn is_named(&self, name: &str) -> bool {
        self.qname.matches(name)
    }

    /// Get an attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    fn append_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    /// Trimmed text content, empty if there is none
    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }

    /// First direct child with the given local name
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is_named(name))
    }

    /// First direct child with the given local name, mutably
    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.is_named(name))
    }

    /// First direct child with the given local name, created if missing.
    ///
    /// A created child is appended and shares this element's namespace and
    /// prefix, so it stays valid inside a namespaced document.
    pub fn ensure_child(&mut self, name: &str) -> &mut Element {
        let idx = match self.children.iter().position(|c| c.is_named(name)) {
            Some(idx) => idx,
            None => {
                self.children
                    .push(Element::new(self.qname.with_local_name(name)));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    /// Trimmed text of the first child with the given local name
    pub fn child_text(&self, name: &str) -> &str {
        text_of(self.find_child(name))
    }

    /// Direct children with the given local name
    pub fn find_children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.is_named(name))
    }

    /// Direct children with the given local name, mutably
    pub fn find_children_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.children.iter_mut().filter(move |c| c.is_named(name))
    }
}

/// Trimmed text of an optional element, empty when absent
pub fn text_of(element: Option<&Element>) -> &str {
    element.map(Element::trimmed_text).unwrap_or("")
}

/// XML Document representation
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root element of the document
    pub root: Element,
}

impl Document {
    /// Wrap a root element
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes with default limits
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        let xml = xml.strip_prefix(UTF8_BOM).unwrap_or(xml);
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut scope = NamespaceScope::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    if element_stack.is_empty() && root.is_some() {
                        return Err(at(&reader, "more than one root element"));
                    }
                    let element = Self::open_element(&e, &mut scope, limits)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    scope.pop();
                    if let Some(current) = element_stack.pop() {
                        match element_stack.last_mut() {
                            Some(parent) => parent.add_child(current),
                            None => root = Some(current),
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    if element_stack.is_empty() && root.is_some() {
                        return Err(at(&reader, "more than one root element"));
                    }
                    let element = Self::open_element(&e, &mut scope, limits)?;
                    scope.pop();
                    match element_stack.last_mut() {
                        Some(parent) => parent.add_child(element),
                        None => root = Some(element),
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| {
                        ParseError::new(format!("failed to unescape text: {}", err))
                            .with_location(reader.buffer_position())
                    })?;
                    match element_stack.last_mut() {
                        Some(current) => current.append_text(&text),
                        None => return Err(at(&reader, "text outside the root element")),
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8(e.into_inner().into_owned()).map_err(|err| {
                        ParseError::new(format!("invalid UTF-8 in CDATA: {}", err))
                    })?;
                    if let Some(current) = element_stack.last_mut() {
                        current.append_text(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ParseError::new(e.to_string())
                        .with_location(reader.buffer_position())
                        .into())
                }
                _ => {} // Declarations, comments, processing instructions, DOCTYPE
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(at(
                &reader,
                &format!("unexpected end of document inside <{}>", open.qname.prefixed()),
            ));
        }

        root.map(Document::new)
            .ok_or_else(|| ParseError::new("no root element").into())
    }

    /// Build an element from a start tag, pushing its declarations onto `scope`
    fn open_element(
        start: &BytesStart<'_>,
        scope: &mut NamespaceScope,
        limits: &Limits,
    ) -> Result<Element> {
        let mut namespaces = NamespaceContext::new();
        let mut attributes = IndexMap::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| ParseError::new(format!("failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| ParseError::new(format!("invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| ParseError::new(format!("failed to unescape attribute value: {}", e)))?
                .into_owned();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, attr_value);
            } else {
                attributes.insert(attr_name, attr_value);
            }
        }
        limits.check_attributes(attributes.len())?;

        scope.push(namespaces.clone());

        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| ParseError::new(format!("invalid element name: {}", e)))?;

        let mut element = Element::new(scope.resolve(name)?);
        element.attributes = attributes;
        element.namespaces = namespaces;
        Ok(element)
    }

    /// Serialize with an XML declaration and UTF-8 encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        write_element(&mut writer, &self.root)?;

        let mut bytes = writer.into_inner().into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Serialize to a string
    pub fn to_xml_string(&self) -> Result<String> {
        String::from_utf8(self.to_bytes()?)
            .map_err(|e| Error::Resource(format!("serialized document is not UTF-8: {}", e)))
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let name = element.qname.prefixed();
    let mut start = BytesStart::new(name.as_str());
    for (key, value) in element.namespaces.declarations() {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = element.text.as_deref().filter(|t| !t.is_empty());
    if text.is_none() && element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(write_error)
}

fn write_error(err: quick_xml::Error) -> Error {
    Error::Resource(format!("failed to serialize XML: {}", err))
}

fn at(reader: &Reader<&[u8]>, message: &str) -> Error {
    ParseError::new(message)
        .with_location(reader.buffer_position())
        .into()
}
