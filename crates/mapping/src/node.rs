//! Generic XML tree used as the intermediate form of extraction.
//!
//! The tree mirrors the usual "always-array children" convention of
//! XML-to-object converters, with an explicit type instead of loose maps:
//!
//! | XML | `XmlNode` |
//! |-----|-----------|
//! | `<Hotel code="1">` | `attributes = {"code": "1"}` |
//! | `<Name>Palma</Name>` | `text = Some("Palma")` |
//! | `<Image/><Image/>` | `children = {"Image": [node, node]}` |
//!
//! Children are grouped by tag name in order of first appearance, so a lookup
//! by name always yields a list, even for a single element.

use std::borrow::Cow;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ExtractionError;

/// Deepest element nesting accepted by [`XmlNode::parse`].
pub const MAX_DEPTH: usize = 256;

/// One element of a parsed XML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Qualified tag name, prefix included (`xsi:type` stays `xsi:type`).
    pub name: String,
    /// Attributes in document order.
    pub attributes: IndexMap<String, String>,
    /// Child elements grouped by tag name.
    pub children: IndexMap<String, Vec<XmlNode>>,
    /// Character data of the element, `None` when absent or whitespace only.
    pub text: Option<String>,
}

impl XmlNode {
    /// Creates an element with no attributes, children or text.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parses a complete XML document and returns its root element.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::ParseFailure`] for anything that is not a
    /// single well-formed element tree: syntax errors, mismatched or missing
    /// closing tags, unknown entities, text or elements outside the root.
    /// Documents nested deeper than [`MAX_DEPTH`] elements are rejected too.
    pub fn parse(xml: &str) -> Result<XmlNode, ExtractionError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(ExtractionError::parse(format!(
                        "{} (at byte {})",
                        e,
                        reader.buffer_position()
                    )));
                }
            };

            match event {
                Event::Start(start) => {
                    if stack.is_empty() && root.is_some() {
                        return Err(ExtractionError::parse("multiple root elements"));
                    }
                    if stack.len() >= MAX_DEPTH {
                        return Err(ExtractionError::parse(format!(
                            "element nesting exceeds {} levels (at byte {})",
                            MAX_DEPTH,
                            reader.buffer_position()
                        )));
                    }
                    stack.push(open_element(&start)?);
                }
                Event::Empty(start) => {
                    let node = open_element(&start)?;
                    close_element(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    // Name matching is checked by the reader itself.
                    let node = stack
                        .pop()
                        .ok_or_else(|| ExtractionError::parse("unexpected closing tag"))?;
                    close_element(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    append_text(&mut stack, &String::from_utf8_lossy(text.as_ref()))?;
                }
                Event::CData(data) => {
                    append_text(&mut stack, &String::from_utf8_lossy(data.as_ref()))?;
                }
                Event::GeneralRef(reference) => {
                    let name = String::from_utf8_lossy(reference.as_ref());
                    let resolved = resolve_reference(&name).ok_or_else(|| {
                        ExtractionError::parse(format!("unknown entity reference `&{};`", name))
                    })?;
                    append_text(&mut stack, &resolved)?;
                }
                Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.last() {
            return Err(ExtractionError::parse(format!(
                "unexpected end of document: <{}> is not closed",
                open.name
            )));
        }

        root.ok_or_else(|| ExtractionError::parse("document has no root element"))
    }

    /// Appends a child element, grouping it with its same-named siblings.
    pub fn push_child(&mut self, child: XmlNode) {
        self.children
            .entry(child.name.clone())
            .or_default()
            .push(child);
    }

    /// All children with the given tag name, in document order.
    pub fn children_named(&self, name: &str) -> Option<&[XmlNode]> {
        self.children.get(name).map(Vec::as_slice)
    }

    /// The first child with the given tag name.
    pub fn first_child(&self, name: &str) -> Option<&XmlNode> {
        self.children.get(name).and_then(|group| group.first())
    }

    /// Value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Text value of this element.
    ///
    /// An element carrying text yields that text. A bare empty element
    /// (`<Tag/>`, no attributes and no children) yields the empty string.
    /// Anything else has no text value.
    pub fn text_value(&self) -> Option<&str> {
        match &self.text {
            Some(text) => Some(text.as_str()),
            None if self.attributes.is_empty() && self.children.is_empty() => Some(""),
            None => None,
        }
    }
}

fn open_element(start: &BytesStart<'_>) -> Result<XmlNode, ExtractionError> {
    let mut node = XmlNode::new(String::from_utf8_lossy(start.name().as_ref()));

    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            ExtractionError::parse(format!("malformed attribute in <{}>: {}", node.name, e))
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| {
            ExtractionError::parse(format!(
                "invalid value for attribute `{}` in <{}>: {}",
                key, node.name, e
            ))
        })?;
        node.attributes.insert(key, value.into_owned());
    }

    Ok(node)
}

fn close_element(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    mut node: XmlNode,
) -> Result<(), ExtractionError> {
    if node
        .text
        .as_deref()
        .is_some_and(|text| text.trim().is_empty())
    {
        node.text = None;
    }

    match stack.last_mut() {
        Some(parent) => parent.push_child(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(ExtractionError::parse("multiple root elements")),
    }
    Ok(())
}

fn append_text(stack: &mut [XmlNode], content: &str) -> Result<(), ExtractionError> {
    match stack.last_mut() {
        Some(node) => {
            node.text.get_or_insert_with(String::new).push_str(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(ExtractionError::parse("text outside of the root element")),
    }
}

/// Resolves a predefined entity or a character reference (`#65`, `#x41`).
fn resolve_reference(name: &str) -> Option<Cow<'static, str>> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(|c| Cow::Owned(c.to_string()));
    }

    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => return None,
    };
    Some(Cow::Borrowed(resolved))
}
