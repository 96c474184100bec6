//! A small owned XML element tree with resolved namespaces.
//!
//! Only what marshalling needs is kept: element names, attributes, text and
//! child order. Comments, processing instructions and the XML declaration are
//! dropped while parsing.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use soapwire_schema::{MarshalError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str;

/// A child of an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    prefix: Option<String>,
    local_name: String,
    /// namespace URI bound to `prefix` (or the default namespace) where the
    /// element was parsed
    namespace: Option<String>,
    /// attributes in document order, by qualified name
    attributes: Vec<(String, String)>,
    /// namespace URIs of the prefixes used by attribute names
    attribute_namespaces: BTreeMap<String, String>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: None,
            attributes: Vec::new(),
            attribute_namespaces: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Parse a complete document into its root element.
    pub fn parse(xml: &str) -> Result<Element> {
        Parser::default().parse(xml)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `prefix:local` or just `local`.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn has_child_elements(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// First direct child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements()
            .find(|element| element.local_name == local_name)
    }

    /// First element in document order (this one included) with the given
    /// local name.
    pub fn find(&self, local_name: &str) -> Option<&Element> {
        if self.local_name == local_name {
            return Some(self);
        }
        self.child_elements()
            .find_map(|child| child.find(local_name))
    }

    /// Every descendant (this one included) with the given local name, in
    /// document order.
    pub fn find_all<'a>(&'a self, local_name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(local_name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, local_name: &str, found: &mut Vec<&'a Element>) {
        if self.local_name == local_name {
            found.push(self);
        }
        for child in self.child_elements() {
            child.collect_named(local_name, found);
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Namespace bindings used by this subtree, from the namespaces resolved
    /// at parse time. `None` is the default namespace.
    pub fn used_namespaces(&self) -> BTreeMap<Option<String>, String> {
        let mut used = BTreeMap::new();
        self.collect_namespaces(&mut used);
        used
    }

    fn collect_namespaces(&self, used: &mut BTreeMap<Option<String>, String>) {
        if let Some(namespace) = &self.namespace {
            used.entry(self.prefix.clone())
                .or_insert_with(|| namespace.clone());
        }
        for (prefix, namespace) in &self.attribute_namespaces {
            used.entry(Some(prefix.clone()))
                .or_insert_with(|| namespace.clone());
        }
        for child in self.child_elements() {
            child.collect_namespaces(used);
        }
    }

    /// Declare every namespace the subtree relies on at its root, so the
    /// element stays parseable when cut out of its document.
    pub fn detached(&self) -> Element {
        let mut element = self.clone();
        for (prefix, uri) in self.used_namespaces() {
            let attribute = match prefix {
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_string(),
            };
            if element.attribute(&attribute).is_none() {
                element.attributes.push((attribute, uri));
            }
        }
        element
    }

    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        let name = self.qualified_name();
        out.push('<');
        out.push_str(&name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(element) => element.write(out),
                Node::Text(text) => out.push_str(&escape(text.as_str())),
            }
        }
        out.push_str("</");
        out.push_str(&name);
        out.push('>');
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

/// Builds the tree from namespace-resolved quick-xml events.
#[derive(Default)]
struct Parser {
    /// open elements, innermost last
    stack: Vec<Element>,
    root: Option<Element>,
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    str::from_utf8(bytes).map_err(|err| MarshalError::malformed(err.to_string()))
}

/// Undeclared prefixes resolve to no namespace rather than an error.
fn namespace_uri(resolved: ResolveResult) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(namespace) => Ok(Some(utf8(namespace.into_inner())?.to_string())),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => Ok(None),
    }
}

impl Parser {
    fn parse(mut self, xml: &str) -> Result<Element> {
        let mut reader = NsReader::from_str(xml);

        loop {
            let (resolved, event) = reader.read_resolved_event()?;
            let namespace = namespace_uri(resolved)?;
            match event {
                Event::Start(start) => {
                    let element = open(&reader, &start, namespace)?;
                    self.stack.push(element);
                }
                Event::Empty(start) => {
                    let element = open(&reader, &start, namespace)?;
                    self.attach(element)?;
                }
                Event::End(_) => {
                    let element = self
                        .stack
                        .pop()
                        .ok_or_else(|| MarshalError::malformed("unexpected closing tag"))?;
                    self.attach(element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    self.text(&text)?;
                }
                Event::CData(data) => {
                    let text = utf8(&data)?.to_string();
                    self.text(&text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(MarshalError::malformed(format!(
                "element <{}> is never closed",
                open.qualified_name()
            )));
        }
        self.root
            .ok_or_else(|| MarshalError::malformed("document has no root element"))
    }

    fn attach(&mut self, element: Element) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(Node::Element(element));
                Ok(())
            }
            None if self.root.is_none() => {
                self.root = Some(element);
                Ok(())
            }
            None => Err(MarshalError::malformed(format!(
                "second root element <{}>",
                element.qualified_name()
            ))),
        }
    }

    fn text(&mut self, text: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                if !text.is_empty() {
                    parent.children.push(Node::Text(text.to_string()));
                }
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(MarshalError::malformed("text outside the root element")),
        }
    }
}

/// An element with no children yet. Prefixed attribute names are resolved
/// against the scope the reader is in; `xmlns` and `xml` need no binding.
fn open(reader: &NsReader<&[u8]>, start: &BytesStart, namespace: Option<String>) -> Result<Element> {
    let name = start.name();
    let prefix = name
        .prefix()
        .map(|prefix| utf8(prefix.as_ref()).map(str::to_string))
        .transpose()?;
    let local_name = utf8(name.local_name().as_ref())?.to_string();

    let mut attributes = Vec::new();
    let mut attribute_namespaces = BTreeMap::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| MarshalError::malformed(err.to_string()))?;
        let key = utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        if let Some(attribute_prefix) = attribute.key.prefix() {
            let attribute_prefix = utf8(attribute_prefix.as_ref())?;
            if attribute_prefix != "xmlns" && attribute_prefix != "xml" {
                let (resolved, _) = reader.resolve_attribute(attribute.key);
                if let Some(uri) = namespace_uri(resolved)? {
                    attribute_namespaces.insert(attribute_prefix.to_string(), uri);
                }
            }
        }
        attributes.push((key, value));
    }

    Ok(Element {
        prefix,
        local_name,
        namespace,
        attributes,
        attribute_namespaces,
        children: Vec::new(),
    })
}
