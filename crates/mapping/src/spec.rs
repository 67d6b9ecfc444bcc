//! Mapping specifications: the declarative description of one XML→JSON
//! projection.
//!
//! A mapping specification is authored as a JSON array of field rules:
//!
//! ```json
//! [
//!   "Currency",
//!   {"CurrencyCode": "Currency.@code"},
//!   {"Name": "TicketInfo.Name"},
//!   {"TicketInfo.ImageList.Image": [{"Type": "Type"}, {"Url": "Url"}]}
//! ]
//! ```
//!
//! | JSON rule | [`FieldRule`] | Output |
//! |-----------|---------------|--------|
//! | `"Currency"` | `Copy` | `"Currency"`: text of child `<Currency>` |
//! | `{"CurrencyCode": "Currency.@code"}` | `ScalarPath` | `"CurrencyCode"`: attribute `code` of `<Currency>` |
//! | `{"Name": ""}` | `ScalarPath` | `"Name"`: text of the current element |
//! | `{"A.B.Image": [...]}` | `RepeatedGroup` | `"ImageList"`: every `<Image>` under `A/B`, projected |
//!
//! Rules are parsed once into [`FieldRule`] values. A rule object that does not
//! have exactly one key, or whose value is neither a path string nor a nested
//! rule array, is skipped with a warning.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{SpecError, json_type_name};

/// Suffix appended to the last path segment of a repeated group.
pub const LIST_SUFFIX: &str = "List";

/// An ordered sequence of field rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct MappingSpec {
    rules: Vec<FieldRule>,
}

/// One entry of a [`MappingSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Copy the text of the named child element under the same key.
    Copy(String),
    /// Resolve a scalar at a path and store it under `output_key`.
    ScalarPath {
        output_key: String,
        path: ScalarPath,
    },
    /// Project every element of a repeated structure through a nested spec.
    RepeatedGroup {
        path: GroupPath,
        spec: MappingSpec,
    },
}

/// Location of a scalar value relative to the current element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalarPath {
    /// Element names walked from the current element, first match at each hop.
    pub segments: Vec<String>,
    /// Attribute to read on the final element; its text when `None`.
    pub attribute: Option<String>,
}

/// Location of a repeated structure relative to the current element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPath {
    /// Path as written in the mapping specification.
    pub raw: String,
    /// Element names; all but the last are walked singularly.
    pub segments: Vec<String>,
}

impl MappingSpec {
    /// Creates a specification from already-built rules.
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Parses a specification from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, SpecError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Parses a specification from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::NotAnArray`] if `value` is not an array. Malformed
    /// individual rules are skipped, never reported as errors.
    pub fn from_value(value: &Value) -> Result<Self, SpecError> {
        let items = value.as_array().ok_or(SpecError::NotAnArray {
            found: json_type_name(value),
        })?;
        Ok(Self::from_items(items))
    }

    fn from_items(items: &[Value]) -> Self {
        let rules = items.iter().filter_map(FieldRule::from_value).collect();
        Self { rules }
    }

    /// The rules in specification order.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TryFrom<Value> for MappingSpec {
    type Error = SpecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl FromIterator<FieldRule> for MappingSpec {
    fn from_iter<I: IntoIterator<Item = FieldRule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FieldRule {
    /// A rule copying the text of child `name`.
    pub fn copy(name: impl Into<String>) -> Self {
        FieldRule::Copy(name.into())
    }

    /// A rule resolving `path` (e.g. `"Hotel.Position.@latitude"`) into `output_key`.
    pub fn scalar(output_key: impl Into<String>, path: &str) -> Self {
        FieldRule::ScalarPath {
            output_key: output_key.into(),
            path: ScalarPath::parse(path),
        }
    }

    /// A rule projecting the repeated elements at `path` through `spec`.
    pub fn group(path: &str, spec: MappingSpec) -> Self {
        FieldRule::RepeatedGroup {
            path: GroupPath::parse(path),
            spec,
        }
    }

    /// Key this rule writes in the projected object.
    pub fn output_key(&self) -> String {
        match self {
            FieldRule::Copy(name) => name.clone(),
            FieldRule::ScalarPath { output_key, .. } => output_key.clone(),
            FieldRule::RepeatedGroup { path, .. } => path.list_key(),
        }
    }

    /// Parses one JSON rule, returning `None` (and logging) when malformed.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(FieldRule::copy(name.as_str())),
            Value::Object(map) if map.len() == 1 => {
                let (key, rule) = map.iter().next()?;
                match rule {
                    Value::String(path) => Some(FieldRule::scalar(key.as_str(), path)),
                    Value::Array(items) => {
                        Some(FieldRule::group(key, MappingSpec::from_items(items)))
                    }
                    other => {
                        tracing::warn!(
                            key = %key,
                            "Malformed mapping rule: expected a path string or a rule array, found {}",
                            json_type_name(other)
                        );
                        None
                    }
                }
            }
            Value::Object(map) => {
                tracing::warn!(
                    keys = map.len(),
                    "Malformed mapping rule: a rule object must have exactly one key: {}",
                    value
                );
                None
            }
            other => {
                tracing::warn!(
                    "Malformed mapping rule: expected a string or an object, found {}",
                    json_type_name(other)
                );
                None
            }
        }
    }
}

impl ScalarPath {
    /// Parses `Seg.Seg.@attr`, `@attr`, `Seg.Seg` or the empty path.
    pub fn parse(path: &str) -> Self {
        let (elements, attribute) = match path.split_once('@') {
            Some((elements, attribute)) => {
                (elements.trim_end_matches('.'), Some(attribute.to_string()))
            }
            None => (path, None),
        };
        Self {
            segments: split_segments(elements),
            attribute,
        }
    }
}

impl fmt::Display for ScalarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))?;
        if let Some(attribute) = &self.attribute {
            if !self.segments.is_empty() {
                write!(f, ".")?;
            }
            write!(f, "@{}", attribute)?;
        }
        Ok(())
    }
}

impl GroupPath {
    /// Parses a dot-separated path such as `"TicketInfo.ImageList.Image"`.
    pub fn parse(path: &str) -> Self {
        Self {
            raw: path.to_string(),
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    /// Last segment of the path, the tag name of the repeated elements.
    pub fn last_segment(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Output key for the projected list: last segment plus `"List"`.
    pub fn list_key(&self) -> String {
        listify(self.last_segment())
    }
}

/// Turns a dotted path into a list name: `"A.B.Image"` → `"ImageList"`.
pub fn listify(path: &str) -> String {
    let last = path.rsplit('.').next().unwrap_or(path);
    format!("{}{}", last, LIST_SUFFIX)
}

fn split_segments(path: &str) -> Vec<String> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listify() {
        assert_eq!(listify("TicketInfo.ImageList.Image"), "ImageList");
        assert_eq!(listify("ServiceTicket"), "ServiceTicketList");
        assert_eq!(listify(""), "List");
    }

    #[test]
    fn test_group_path_list_key() {
        let path = GroupPath::parse("TicketInfo.ImageList.Image");
        assert_eq!(path.last_segment(), "Image");
        assert_eq!(path.list_key(), "ImageList");
        assert_eq!(GroupPath::parse("ErrorList.Error").list_key(), "ErrorList");
    }

    #[test]
    fn test_scalar_path_parse() {
        let path = ScalarPath::parse("DateFrom.@date");
        assert_eq!(path.segments, vec!["DateFrom"]);
        assert_eq!(path.attribute.as_deref(), Some("date"));

        let path = ScalarPath::parse("@code");
        assert!(path.segments.is_empty());
        assert_eq!(path.attribute.as_deref(), Some("code"));

        let path = ScalarPath::parse("");
        assert!(path.segments.is_empty());
        assert_eq!(path.attribute, None);

        let path = ScalarPath::parse("Hotel.Position@latitude");
        assert_eq!(path.segments, vec!["Hotel", "Position"]);
        assert_eq!(path.attribute.as_deref(), Some("latitude"));
    }

    #[test]
    fn test_scalar_path_display() {
        assert_eq!(
            ScalarPath::parse("Hotel.Position.@latitude").to_string(),
            "Hotel.Position.@latitude"
        );
        assert_eq!(ScalarPath::parse("@code").to_string(), "@code");
        assert_eq!(ScalarPath::parse("TicketInfo.Name").to_string(), "TicketInfo.Name");
    }

    #[test]
    fn test_parse_rule_kinds() {
        let spec = MappingSpec::from_value(&json!([
            "Currency",
            {"CurrencyCode": "Currency.@code"},
            {"TicketInfo.ImageList.Image": [{"Url": "Url"}]}
        ]))
        .unwrap();

        assert_eq!(spec.len(), 3);
        assert_eq!(spec.rules()[0], FieldRule::copy("Currency"));
        assert_eq!(spec.rules()[1], FieldRule::scalar("CurrencyCode", "Currency.@code"));
        match &spec.rules()[2] {
            FieldRule::RepeatedGroup { path, spec } => {
                assert_eq!(path.segments, vec!["TicketInfo", "ImageList", "Image"]);
                assert_eq!(path.list_key(), "ImageList");
                assert_eq!(spec.rules(), &[FieldRule::scalar("Url", "Url")]);
            }
            other => panic!("expected a repeated group, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_rules_are_skipped() {
        let spec = MappingSpec::from_value(&json!([
            {"A": "a", "B": "b"},
            {},
            {"C": 3},
            42,
            null,
            "Kept"
        ]))
        .unwrap();
        assert_eq!(spec.rules(), &[FieldRule::copy("Kept")]);
    }

    #[test]
    fn test_malformed_nested_rules_are_skipped() {
        let spec = MappingSpec::from_value(&json!([
            {"Hotel": [{"Code": "Code", "Name": "Name"}, "Name"]}
        ]))
        .unwrap();
        match &spec.rules()[0] {
            FieldRule::RepeatedGroup { spec, .. } => {
                assert_eq!(spec.rules(), &[FieldRule::copy("Name")]);
            }
            other => panic!("expected a repeated group, got {:?}", other),
        }
    }

    #[test]
    fn test_top_level_must_be_an_array() {
        let err = MappingSpec::from_value(&json!({"Name": "Name"})).unwrap_err();
        assert!(matches!(err, SpecError::NotAnArray { found: "an object" }));
        assert!(MappingSpec::from_json_str("not json").is_err());
    }

    #[test]
    fn test_deserialize_through_serde() {
        let spec: MappingSpec = serde_json::from_str(r#"[{"Code": "@code"}, "Name"]"#).unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.rules()[0].output_key(), "Code");
    }

    #[test]
    fn test_collect_into_spec() {
        let spec: MappingSpec = vec![FieldRule::copy("Code"), FieldRule::scalar("Name", "")]
            .into_iter()
            .collect();
        assert_eq!(spec.len(), 2);
    }
}
