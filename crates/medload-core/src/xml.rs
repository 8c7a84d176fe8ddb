//! Small DOM for citation XML, built with quick-xml.
//!
//! The schema engine needs random access to attributes and repeated child
//! elements of one record at a time, so records are materialized as trees
//! rather than streamed. Whitespace-only text is dropped during parsing.

use std::borrow::Cow;
use std::io::BufRead;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Inline markup tags that do not break a text value into structure.
const INLINE_MARKUP: [&str; 4] = ["b", "i", "sup", "sub"];

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// One XML element: name, attributes in document order, mixed children.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given tag name.
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of the direct text children, trimmed.
    pub fn direct_text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                out.push_str(t);
            }
        }
        out.trim().to_string()
    }

    /// All text content in document order, including text inside inline
    /// markup, trimmed.
    pub fn deep_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out.trim().to_string()
    }

    /// Whether this element carries a value rather than structure: it has
    /// non-empty direct text or an inline markup child.
    pub fn is_text_bearing(&self) -> bool {
        self.children.iter().any(|n| match n {
            Node::Text(t) => !t.trim().is_empty(),
            Node::Element(e) => INLINE_MARKUP.contains(&e.name.as_str()),
        })
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for node in &el.children {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

/// Parse a whole XML document into a tree, returning the root element.
pub fn parse_document<R: BufRead>(input: R) -> Result<Element> {
    let mut reader = Reader::from_reader(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("XML parse error")?
        {
            Event::Start(e) => stack.push(element_from_start(&e)?),
            Event::Empty(e) => {
                let el = element_from_start(&e)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                let el = stack.pop().context("unbalanced end tag")?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(e) => {
                let text = e.unescape().context("text decode error")?;
                push_text(&mut stack, text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_text(&mut stack, Cow::Owned(text));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        bail!("unexpected end of document inside <{}>", stack[0].name);
    }
    root.context("document contains no root element")
}

/// Parse from a string slice; used by tests and small inputs.
pub fn parse_str(xml: &str) -> Result<Element> {
    parse_document(xml.as_bytes())
}

fn element_from_start(e: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .context("attribute decode error")?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, el: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(el)),
        None => {
            if root.is_some() {
                bail!("multiple root elements");
            }
            *root = Some(el);
        }
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: Cow<'_, str>) {
    if text.trim().is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        top.children.push(Node::Text(text.into_owned()));
    }
}
