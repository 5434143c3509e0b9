//! Minimal element tree for step definitions.
//!
//! Step configurations are element-oriented: values live in element text,
//! not attributes. Leaf text is kept verbatim so whitespace values such as a
//! tab separator survive. [`XmlNode`] keeps exactly what the persistence adapter
//! navigates (tag, attributes, text, children) and can write itself back out,
//! which is how embedded cluster fragments survive a load/save cycle
//! untouched.

use crate::error::XmlError;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Display;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event().map_err(XmlError::parse)? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let node = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let mut node = stack
                        .pop()
                        .ok_or_else(|| XmlError::Parse("unbalanced closing tag".to_string()))?;
                    // Indentation between child elements is not content.
                    if !node.children.is_empty() && node.text.trim().is_empty() {
                        node.text.clear();
                    }
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&text.unescape().map_err(XmlError::parse)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Parse(format!("unclosed element <{}>", open.tag)));
        }
        root.ok_or_else(|| XmlError::Parse("document has no root element".to_string()))
    }

    /// Parse a document whose root must be `expected`.
    pub fn parse_rooted(xml: &str, expected: &str) -> Result<Self, XmlError> {
        let node = Self::parse(xml)?;
        if node.tag != expected {
            return Err(XmlError::UnexpectedRoot {
                expected: expected.to_string(),
                found: node.tag,
            });
        }
        Ok(node)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut node = XmlNode::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr.map_err(XmlError::parse)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(XmlError::parse)?.into_owned();
            node.attributes.push((key, value));
        }
        Ok(node)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child named `tag`.
    pub fn sub_node(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Like [`sub_node`](Self::sub_node) but absence is an error.
    pub fn required_sub_node(&self, tag: &str) -> Result<&XmlNode, XmlError> {
        self.sub_node(tag)
            .ok_or_else(|| XmlError::MissingElement(tag.to_string()))
    }

    pub fn sub_nodes<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    pub fn count_nodes(&self, tag: &str) -> usize {
        self.sub_nodes(tag).count()
    }

    /// Text of the first child named `tag`; empty text reads as absent.
    pub fn tag_value(&self, tag: &str) -> Option<&str> {
        self.sub_node(tag)
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
    }

    /// `Y`/`N` flag in the style of step definitions. Absent reads as false.
    pub fn tag_flag(&self, tag: &str) -> bool {
        matches!(self.tag_value(tag), Some(v) if v.eq_ignore_ascii_case("y"))
    }

    /// Serialize this element (and its subtree) back to XML text.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&escape(self.text.as_str()));
        for child in &self.children {
            child.write_into(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(XmlError::Parse(format!(
                "multiple root elements (second is <{}>)",
                node.tag
            )))
        }
    }
    Ok(())
}

pub fn open_tag(tag: &str) -> String {
    format!("<{}>", tag)
}

pub fn close_tag(tag: &str) -> String {
    format!("</{}>", tag)
}

/// One element line: `<tag>value</tag>`, or `<tag/>` when the value is absent.
pub fn add_tag_value(tag: &str, value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("<{}>{}</{}>\n", tag, escape(v), tag),
        _ => format!("<{}/>\n", tag),
    }
}

pub fn add_tag_display(tag: &str, value: impl Display) -> String {
    add_tag_value(tag, Some(value.to_string().as_str()))
}

pub fn add_tag_flag(tag: &str, value: bool) -> String {
    add_tag_value(tag, Some(if value { "Y" } else { "N" }))
}
