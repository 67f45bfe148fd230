//! Structured content: a small owned XML node tree.
//!
//! Delivery information, persisted projects and exported DocBook documents
//! all share this representation. Parsing and writing go through
//! `quick-xml`; element-only content is indented on output while mixed
//! content is written inline so that text survives a round-trip unchanged.

use crate::error::{DeliveryError, PersistenceErrorKind, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::io::Write as _;

/// A node in a content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// The element inside this node, if any
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            Self::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder-style text append; empty text adds no node
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
        self
    }

    /// Get an attribute value
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value in place
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.attributes.push((key, value));
        }
    }

    /// Append a child node
    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Iterate over child elements
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Iterate mutably over child elements
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Iterate over child elements with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// First child element with the given name
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// First child element with the given name, mutably
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// First child element with the given name, created if missing
    pub fn child_or_insert(&mut self, name: &str) -> &mut Element {
        let position = self
            .children
            .iter()
            .position(|n| n.as_element().is_some_and(|e| e.name == name));
        let index = position.unwrap_or_else(|| {
            self.children.push(Node::Element(Self::new(name)));
            self.children.len() - 1
        });
        match &mut self.children[index] {
            Node::Element(e) => e,
            Node::Text(_) => unreachable!("index points at an element"),
        }
    }

    /// Concatenated text of all descendant text nodes
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Whether the element has neither children nor attributes
    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.children.is_empty() && self.attributes.is_empty()
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    /// Parse a document with a single root element.
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with(xml, Layout::Strip)
    }

    fn parse_with(xml: &str, root_layout: Layout) -> Result<Self> {
        let mut nodes = parse_nodes(xml, root_layout)?;
        let mut roots = nodes.drain(..).filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        });
        let root = roots
            .next()
            .ok_or_else(|| DeliveryError::invalid_xml("parsing document", "no root element"))?;
        if roots.next().is_some() {
            return Err(DeliveryError::invalid_xml(
                "parsing document",
                "more than one root element",
            ));
        }
        Ok(root)
    }

    /// Parse a fragment that may contain several top-level nodes.
    ///
    /// Whitespace between top-level nodes is kept as written. Fails on
    /// anything that is not well-formed.
    pub fn parse_fragment(xml: &str) -> Result<Vec<Node>> {
        let wrapped = format!("<fragment>{xml}</fragment>");
        Ok(Self::parse_with(&wrapped, Layout::Keep)?.children)
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Serialize as an XML document with declaration and indentation.
    pub fn to_xml_document(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        writer.get_mut().push(b'\n');
        self.write_to(&mut writer, 0)?;
        writer.get_mut().push(b'\n');
        into_string(writer.into_inner())
    }

    /// Serialize this element alone, without declaration.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_to(&mut writer, 0)?;
        into_string(writer.into_inner())
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>, depth: usize) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        let element_only = self.children.iter().all(|c| matches!(c, Node::Element(_)));
        for child in &self.children {
            match child {
                Node::Element(e) => {
                    if element_only {
                        write_indent(writer, depth + 1)?;
                    }
                    e.write_to(writer, depth + 1)?;
                }
                Node::Text(t) => {
                    writer
                        .write_event(Event::Text(BytesText::new(t)))
                        .map_err(write_error)?;
                }
            }
        }
        if element_only {
            write_indent(writer, depth)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)
    }
}

fn write_indent(writer: &mut Writer<Vec<u8>>, depth: usize) -> Result<()> {
    let sink = writer.get_mut();
    sink.push(b'\n');
    sink.write_all(&b" ".repeat(depth * 2))?;
    Ok(())
}

fn write_error(err: impl std::fmt::Display) -> DeliveryError {
    DeliveryError::persistence("writing XML", PersistenceErrorKind::Write(err.to_string()))
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(write_error)
}

/// Treatment of indentation inside the outermost element.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Layout {
    Strip,
    Keep,
}

/// Parse a sequence of nodes.
///
/// Text is kept as written, except line-breaking whitespace between the
/// children of element-only parents, which is indentation.
fn parse_nodes(xml: &str, root_layout: Layout) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut top: Vec<Node> = Vec::new();

    fn attach(stack: &mut [Element], top: &mut Vec<Node>, node: Node) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => top.push(node),
        }
    }

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event().map_err(|e| {
            DeliveryError::invalid_xml(format!("at byte {position}"), e.to_string())
        })?;
        match event {
            Event::Start(ref e) => stack.push(start_element(e)?),
            Event::Empty(ref e) => {
                let element = start_element(e)?;
                attach(&mut stack, &mut top, Node::Element(element));
            }
            Event::End(_) => {
                let mut element = stack.pop().ok_or_else(|| {
                    DeliveryError::invalid_xml("parsing", "unexpected closing tag")
                })?;
                if !stack.is_empty() || root_layout == Layout::Strip {
                    strip_indentation(&mut element);
                }
                attach(&mut stack, &mut top, Node::Element(element));
            }
            Event::Text(t) => {
                let raw = std::str::from_utf8(&t)
                    .map_err(|e| DeliveryError::invalid_xml("decoding text", e.to_string()))?;
                let text = quick_xml::escape::unescape(raw)
                    .map_err(|e| DeliveryError::invalid_xml("unescaping text", e.to_string()))?;
                push_text(&mut stack, &mut top, &text);
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                push_text(&mut stack, &mut top, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DeliveryError::invalid_xml(
            "parsing",
            format!("unclosed element <{}>", open.name),
        ));
    }
    Ok(top)
}

/// Drop indentation from an element whose only text is indentation.
fn strip_indentation(element: &mut Element) {
    let is_indent = |t: &str| t.contains('\n') && t.trim().is_empty();
    let has_elements = element.elements().next().is_some();
    let only_indent = element.children.iter().all(|c| match c {
        Node::Text(t) => is_indent(t),
        Node::Element(_) => true,
    });
    if has_elements && only_indent {
        element.children.retain(|c| matches!(c, Node::Element(_)));
    }
}

/// Append text, merging with a preceding text node.
fn push_text(stack: &mut [Element], top: &mut Vec<Node>, text: &str) {
    let children = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => top,
    };
    if let Some(Node::Text(prev)) = children.last_mut() {
        prev.push_str(text);
    } else {
        children.push(Node::Text(text.to_string()));
    }
}

fn start_element(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DeliveryError::invalid_xml("reading attribute", e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| DeliveryError::invalid_xml("reading attribute", e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}
