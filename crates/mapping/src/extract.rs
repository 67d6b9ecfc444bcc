//! XML→JSON projection driven by a [`MappingSpec`].

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ExtractionError;
use crate::node::XmlNode;
use crate::spec::{FieldRule, GroupPath, MappingSpec, ScalarPath};

/// A projected JSON object.
pub type Object = Map<String, Value>;

/// Result of a successful extraction.
///
/// The shape follows the browse root: a singular element projects to
/// [`Extracted::Single`], a group of same-named elements to
/// [`Extracted::List`]. A requested root tag that does not occur in the
/// document yields [`Extracted::NotFound`].
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    NotFound,
    Single(Object),
    List(Vec<Object>),
}

impl Extracted {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Extracted::NotFound)
    }

    pub fn as_single(&self) -> Option<&Object> {
        match self {
            Extracted::Single(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Object]> {
        match self {
            Extracted::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts into a plain JSON value; `NotFound` becomes `null`.
    pub fn into_value(self) -> Value {
        match self {
            Extracted::NotFound => Value::Null,
            Extracted::Single(object) => Value::Object(object),
            Extracted::List(items) => Value::Array(items.into_iter().map(Value::Object).collect()),
        }
    }
}

impl From<Extracted> for Value {
    fn from(extracted: Extracted) -> Self {
        extracted.into_value()
    }
}

impl Serialize for Extracted {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Extracted::NotFound => serializer.serialize_none(),
            Extracted::Single(object) => object.serialize(serializer),
            Extracted::List(items) => items.serialize(serializer),
        }
    }
}

/// Extracts structured data from XML documents.
///
/// # Examples
///
/// ```
/// use mashup_mapping::{Extractor, MappingSpec};
///
/// let spec = MappingSpec::from_json_str(r#"[{"code": "@code"}, {"name": ""}]"#)?;
/// let xml = r#"<Destination code="PMI" type="SIMPLE">Palma</Destination>"#;
///
/// let extracted = Extractor::new().extract(xml, &spec)?;
/// let object = extracted.as_single().unwrap();
/// assert_eq!(object["code"], "PMI");
/// assert_eq!(object["name"], "Palma");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    root_tag: Option<String>,
    debug: bool,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the browse root by tag name instead of the document element.
    ///
    /// An empty tag is the same as no tag.
    pub fn with_root_tag(mut self, root_tag: impl Into<String>) -> Self {
        let root_tag = root_tag.into();
        self.root_tag = (!root_tag.is_empty()).then_some(root_tag);
        self
    }

    /// Attaches the raw document to parse failures.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn root_tag(&self) -> Option<&str> {
        self.root_tag.as_deref()
    }

    /// Parses `xml` and projects its browse root through `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::ParseFailure`] if `xml` is not well formed.
    /// Missing fields and a missing root tag are not errors.
    pub fn extract(&self, xml: &str, spec: &MappingSpec) -> Result<Extracted, ExtractionError> {
        let document = XmlNode::parse(xml).map_err(|e| {
            tracing::debug!(error = %e, bytes = xml.len(), "Failed to parse XML document");
            if self.debug { e.with_body(xml) } else { e }
        })?;
        Ok(self.extract_node(&document, spec))
    }

    /// Projects an already parsed document.
    pub fn extract_node(&self, document: &XmlNode, spec: &MappingSpec) -> Extracted {
        let browse_root = match self.root_tag.as_deref() {
            Some(tag) => match find_browse_root(document, tag) {
                Some(found) => found,
                None => {
                    tracing::debug!(root_tag = tag, "Root tag not found in document");
                    return Extracted::NotFound;
                }
            },
            None => BrowseRoot::Single(document),
        };

        match browse_root {
            BrowseRoot::Single(node) => Extracted::Single(project(node, spec)),
            BrowseRoot::List(nodes) => {
                let items: Vec<Object> = nodes
                    .iter()
                    .map(|node| project(node, spec))
                    .filter(|object| !object.is_empty())
                    .collect();
                tracing::debug!(
                    matched = nodes.len(),
                    kept = items.len(),
                    "Projected browse root list"
                );
                Extracted::List(items)
            }
        }
    }
}

/// Extracts `xml` through `spec`, optionally starting at `root_tag`.
pub fn extract(
    xml: &str,
    spec: &MappingSpec,
    root_tag: Option<&str>,
) -> Result<Extracted, ExtractionError> {
    let mut extractor = Extractor::new();
    if let Some(tag) = root_tag {
        extractor = extractor.with_root_tag(tag);
    }
    extractor.extract(xml, spec)
}

#[derive(Debug, Clone, Copy)]
enum BrowseRoot<'a> {
    Single(&'a XmlNode),
    List(&'a [XmlNode]),
}

/// Depth-first search for `tag`, the document element first.
fn find_browse_root<'a>(document: &'a XmlNode, tag: &str) -> Option<BrowseRoot<'a>> {
    if document.name == tag {
        return Some(BrowseRoot::Single(document));
    }
    find_group(document, tag).map(BrowseRoot::List)
}

enum Visit<'a> {
    Node(&'a XmlNode),
    Group(&'a str, &'a [XmlNode]),
}

/// Each child group is checked by name before its members are searched,
/// and before the next group of the same parent.
fn find_group<'a>(document: &'a XmlNode, tag: &str) -> Option<&'a [XmlNode]> {
    let mut pending = vec![Visit::Node(document)];

    while let Some(visit) = pending.pop() {
        match visit {
            Visit::Node(node) => pending.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|(name, group)| Visit::Group(name.as_str(), group.as_slice())),
            ),
            Visit::Group(name, group) => {
                if name == tag {
                    return Some(group);
                }
                pending.extend(group.iter().rev().map(Visit::Node));
            }
        }
    }
    None
}

/// Projects one element through `spec`. Unresolved rules leave no key.
pub fn project(node: &XmlNode, spec: &MappingSpec) -> Object {
    let mut object = Object::new();

    for rule in spec.rules() {
        match rule {
            FieldRule::Copy(name) => {
                if let Some(text) = node.first_child(name).and_then(XmlNode::text_value) {
                    object.insert(name.clone(), Value::String(text.to_string()));
                }
            }
            FieldRule::ScalarPath { output_key, path } => {
                if let Some(value) = resolve_scalar(node, path) {
                    object.insert(output_key.clone(), Value::String(value.to_string()));
                }
            }
            FieldRule::RepeatedGroup { path, spec } => {
                if let Some(group) = resolve_group(node, path) {
                    let items = group
                        .iter()
                        .map(|element| Value::Object(project(element, spec)))
                        .collect();
                    object.insert(path.list_key(), Value::Array(items));
                }
            }
        }
    }

    object
}

fn resolve_scalar<'a>(node: &'a XmlNode, path: &ScalarPath) -> Option<&'a str> {
    let target = walk(node, &path.segments)?;
    match &path.attribute {
        Some(attribute) => target.attribute(attribute),
        None => target.text_value(),
    }
}

fn resolve_group<'a>(node: &'a XmlNode, path: &GroupPath) -> Option<&'a [XmlNode]> {
    let (last, parents) = path.segments.split_last()?;
    walk(node, parents)?.children_named(last)
}

fn walk<'a>(node: &'a XmlNode, segments: &[String]) -> Option<&'a XmlNode> {
    segments
        .iter()
        .try_fold(node, |current, segment| current.first_child(segment))
}
