//! JSON→XML emission.
//!
//! The input follows a small key convention:
//!
//! | Key | Emitted as |
//! |-----|------------|
//! | `"@code": "PMI"` | attribute `code="PMI"` on the enclosing element |
//! | `"#value": "Palma"` | text of the enclosing element |
//! | `"#list": [{"A": ..}, {"B": ..}]` | sibling elements `<A>`, `<B>` with no wrapper |
//! | `"Name": "x"` | leaf element `<Name>x</Name>` |
//! | `"Room": [{..}, {..}]` | one `<Room>` element per entry |
//! | `"Hotel": {..}` | nested element `<Hotel>` |
//!
//! Output is compact (no indentation) and deterministic: attributes, text
//! and children follow the key order of the source object.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value};

use crate::error::EmissionError;

/// Prefix marking an attribute key.
pub const ATTRIBUTE_PREFIX: char = '@';
/// Key holding the text of the enclosing element.
pub const TEXT_KEY: &str = "#value";
/// Key holding an unkeyed group of sibling elements.
pub const LIST_KEY: &str = "#list";

const ROOT_KEY: &str = "(root)";

/// Serializes JSON values to XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct Emitter {
    declaration: bool,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `<?xml version="1.0" encoding="UTF-8"?>` to the output.
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    /// Emits `value`, which must be an object of top-level elements.
    ///
    /// # Errors
    ///
    /// Returns [`EmissionError::MalformedInput`] when `value` breaks the key
    /// convention and [`EmissionError::InvalidAttribute`] for an attribute
    /// value that is neither a string nor a number.
    pub fn emit(&self, value: &Value) -> Result<String, EmissionError> {
        let members = value.as_object().ok_or(EmissionError::MalformedInput {
            key: ROOT_KEY.to_string(),
            reason: "the top-level value must be an object",
        })?;

        let mut emitter = XmlEmitter::new();
        if self.declaration {
            emitter.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        for (key, value) in members {
            emitter.write_member(key, value)?;
        }
        emitter.finish()
    }
}

/// Emits `value` without an XML declaration.
pub fn emit(value: &Value) -> Result<String, EmissionError> {
    Emitter::new().emit(value)
}

struct XmlEmitter {
    writer: Writer<Vec<u8>>,
}

impl XmlEmitter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn finish(self) -> Result<String, EmissionError> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| EmissionError::Write(e.to_string()))
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), EmissionError> {
        self.writer
            .write_event(event)
            .map_err(|e| EmissionError::Write(e.to_string()))
    }

    /// Writes one key of an object outside of attribute/text position.
    fn write_member(&mut self, key: &str, value: &Value) -> Result<(), EmissionError> {
        if key == LIST_KEY {
            return self.write_unkeyed_list(value);
        }
        if key == TEXT_KEY || key.starts_with(ATTRIBUTE_PREFIX) {
            return Err(EmissionError::MalformedInput {
                key: key.to_string(),
                reason: "attributes and text need an enclosing element",
            });
        }
        if !is_xml_name(key) {
            return Err(EmissionError::MalformedInput {
                key: key.to_string(),
                reason: "element names must be valid XML names",
            });
        }
        self.write_element(key, value)
    }

    fn write_unkeyed_list(&mut self, value: &Value) -> Result<(), EmissionError> {
        let items = value.as_array().ok_or(EmissionError::MalformedInput {
            key: LIST_KEY.to_string(),
            reason: "expected an array",
        })?;

        for item in items {
            match item.as_object() {
                Some(entry) if entry.len() == 1 => {
                    for (key, value) in entry {
                        self.write_member(key, value)?;
                    }
                }
                _ => {
                    return Err(EmissionError::MalformedInput {
                        key: LIST_KEY.to_string(),
                        reason: "list entries must be single-key objects",
                    });
                }
            }
        }
        Ok(())
    }

    fn write_element(&mut self, name: &str, value: &Value) -> Result<(), EmissionError> {
        match value {
            Value::Object(members) => self.write_object_element(name, members),
            Value::Array(items) => {
                for item in items {
                    let members = item.as_object().ok_or(EmissionError::MalformedInput {
                        key: name.to_string(),
                        reason: "array entries must be objects",
                    })?;
                    self.write_object_element(name, members)?;
                }
                Ok(())
            }
            Value::Null => self.write(Event::Empty(BytesStart::new(name))),
            scalar => {
                let text = scalar_text(scalar).unwrap_or_default();
                self.write(Event::Start(BytesStart::new(name)))?;
                self.write(Event::Text(BytesText::new(&text)))?;
                self.write(Event::End(BytesEnd::new(name)))
            }
        }
    }

    fn write_object_element(
        &mut self,
        name: &str,
        members: &Map<String, Value>,
    ) -> Result<(), EmissionError> {
        let mut element = BytesStart::new(name);
        let mut text = None;
        let mut has_children = false;

        for (key, value) in members {
            if let Some(attribute) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                if !is_xml_name(attribute) {
                    return Err(EmissionError::MalformedInput {
                        key: key.clone(),
                        reason: "attribute names must be valid XML names",
                    });
                }
                let attribute_value = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err(EmissionError::InvalidAttribute { key: key.clone() }),
                };
                element.push_attribute((attribute, attribute_value.as_str()));
            } else if key == TEXT_KEY {
                text = Some(scalar_text(value).ok_or(EmissionError::MalformedInput {
                    key: key.clone(),
                    reason: "text must be a string, a number or a boolean",
                })?);
            } else {
                has_children = true;
            }
        }

        if text.is_none() && !has_children {
            return self.write(Event::Empty(element));
        }

        self.write(Event::Start(element))?;
        if let Some(text) = text {
            self.write(Event::Text(BytesText::new(&text)))?;
        }
        for (key, value) in members {
            if key == TEXT_KEY || key.starts_with(ATTRIBUTE_PREFIX) {
                continue;
            }
            self.write_member(key, value)?;
        }
        self.write(Event::End(BytesEnd::new(name)))
    }
}

/// The `Name` production of XML 1.0 (fifth edition).
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
