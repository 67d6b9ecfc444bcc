//! Error types for the mapping engine.
//!
//! Each component reports its own error enum. Per-field "value not found"
//! during extraction is never an error: missing values are simply absent from
//! the extracted object.

use thiserror::Error;

/// Errors produced while extracting structured data from an XML document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The input text is not well-formed XML.
    #[error("xml-parsing-error: {message}")]
    ParseFailure {
        /// Description of what the parser rejected.
        message: String,
        /// The raw document, kept only when extraction runs in debug mode.
        body: Option<String>,
    },
}

impl ExtractionError {
    /// Stable machine-readable kind of this error.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::ParseFailure { .. } => "xml-parsing-error",
        }
    }

    /// Returns the raw document attached in debug mode, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            ExtractionError::ParseFailure { body, .. } => body.as_deref(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        ExtractionError::ParseFailure {
            message: message.into(),
            body: None,
        }
    }

    pub(crate) fn with_body(self, body: &str) -> Self {
        match self {
            ExtractionError::ParseFailure { message, .. } => ExtractionError::ParseFailure {
                message,
                body: Some(body.to_string()),
            },
        }
    }
}

/// Errors produced while emitting XML from a JSON value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmissionError {
    /// The JSON value does not follow the `@` / `#value` / `#list` convention.
    #[error("malformed input at key `{key}`: {reason}")]
    MalformedInput { key: String, reason: &'static str },

    /// An attribute value is neither a string nor a number.
    #[error("invalid value for attribute `{key}`: expected a string or a number")]
    InvalidAttribute { key: String },

    /// The underlying XML writer failed.
    #[error("XML writing error: {0}")]
    Write(String),
}

impl EmissionError {
    /// Stable machine-readable kind of this error.
    pub fn kind(&self) -> &'static str {
        "101-bad-json-to-xml"
    }

    /// The JSON key that caused the failure, when one is known.
    pub fn key(&self) -> Option<&str> {
        match self {
            EmissionError::MalformedInput { key, .. } | EmissionError::InvalidAttribute { key } => {
                Some(key)
            }
            EmissionError::Write(_) => None,
        }
    }
}

/// Errors produced while reading a mapping specification or a type map.
///
/// Individual malformed rules are skipped with a warning; only a document
/// whose overall shape is wrong is rejected.
#[derive(Error, Debug)]
pub enum SpecError {
    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top level of the document is not an array of rules.
    #[error("expected an array of rules, found {found}")]
    NotAnArray { found: &'static str },
}

/// Errors produced by strict template resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Placeholders were left without a value.
    #[error("unresolved template parameters: {}", keys.join(", "))]
    Unresolved { keys: Vec<String> },
}

/// Short name of a JSON value's type, used in error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
