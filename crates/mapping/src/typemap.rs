//! Type maps: post-processing that turns extracted strings into numbers.
//!
//! Extraction only ever produces strings. A type map names the paths that
//! should be numeric:
//!
//! ```json
//! [
//!   {"numbers": ["int"]},
//!   {"oneFloat": "float"},
//!   {"level1.oneInt": "int"},
//!   {"level1.level2": [{"oneInt": "int", "oneFloat": "float"}]}
//! ]
//! ```
//!
//! Paths that do not exist are ignored. Values that cannot be converted are
//! left as they are.

use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::error::{SpecError, json_type_name};

/// Ordered conversion rules applied to an extracted value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct TypeMap {
    rules: Vec<TypeRule>,
}

/// A conversion at a dot path of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRule {
    /// Convert the value at `path`.
    Value { path: String, kind: ValueKind },
    /// Apply item rules to every element of the array at `path`.
    List { path: String, items: Vec<ItemRule> },
}

/// A rule applied to each element of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRule {
    /// Convert every string element.
    Value(ValueKind),
    /// Apply rules to every object element.
    Object(Vec<TypeRule>),
}

/// Target type of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    /// Any other type name; values are left unchanged.
    Other(String),
}

impl ValueKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "int" => ValueKind::Int,
            "float" => ValueKind::Float,
            other => ValueKind::Other(other.to_string()),
        }
    }

    /// Converts `value`, or returns `None` to keep it as is.
    fn convert(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ValueKind::Int, Value::String(s)) => parse_int_prefix(s).map(Value::from),
            (ValueKind::Int, Value::Number(n)) if n.is_f64() => {
                n.as_f64().map(|f| Value::from(f.trunc() as i64))
            }
            (ValueKind::Float, Value::String(s)) => {
                parse_float_prefix(s).and_then(Number::from_f64).map(Value::Number)
            }
            _ => None,
        }
    }
}

impl TypeMap {
    pub fn new(rules: Vec<TypeRule>) -> Self {
        Self { rules }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SpecError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Parses a type map, skipping entries that are not single-key objects.
    pub fn from_value(value: &Value) -> Result<Self, SpecError> {
        let items = value.as_array().ok_or(SpecError::NotAnArray {
            found: json_type_name(value),
        })?;

        let mut rules = Vec::with_capacity(items.len());
        for item in items {
            match item.as_object() {
                Some(entry) if entry.len() == 1 => rules.extend(parse_rules(entry)),
                _ => tracing::warn!("Skipping type map entry, expected a single-key object: {}", item),
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies the rules to `value`.
    ///
    /// An array is treated as a list of extracted items and each object
    /// element is converted on its own.
    pub fn apply(&self, value: &mut Value) {
        match value {
            Value::Object(object) => self.apply_to_object(object),
            Value::Array(items) => {
                for object in items.iter_mut().filter_map(Value::as_object_mut) {
                    self.apply_to_object(object);
                }
            }
            _ => {}
        }
    }

    pub fn apply_to_object(&self, object: &mut Map<String, Value>) {
        apply_rules(&self.rules, object);
    }
}

impl TryFrom<Value> for TypeMap {
    type Error = SpecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

fn parse_rules(entry: &Map<String, Value>) -> Vec<TypeRule> {
    entry
        .iter()
        .filter_map(|(path, rule)| match rule {
            Value::String(kind) => Some(TypeRule::Value {
                path: path.clone(),
                kind: ValueKind::parse(kind),
            }),
            Value::Array(items) => Some(TypeRule::List {
                path: path.clone(),
                items: items.iter().filter_map(parse_item_rule).collect(),
            }),
            other => {
                tracing::warn!(
                    path = %path,
                    "Skipping type rule, expected a type name or an array, found {}",
                    json_type_name(other)
                );
                None
            }
        })
        .collect()
}

fn parse_item_rule(item: &Value) -> Option<ItemRule> {
    match item {
        Value::String(kind) => Some(ItemRule::Value(ValueKind::parse(kind))),
        Value::Object(entry) => Some(ItemRule::Object(parse_rules(entry))),
        other => {
            tracing::warn!(
                "Skipping list item rule, expected a type name or an object, found {}",
                json_type_name(other)
            );
            None
        }
    }
}

fn apply_rules(rules: &[TypeRule], object: &mut Map<String, Value>) {
    for rule in rules {
        match rule {
            TypeRule::Value { path, kind } => {
                if let Some(value) = value_at_path(object, path) {
                    convert_in_place(kind, value, path);
                }
            }
            TypeRule::List { path, items } => {
                if let Some(Value::Array(elements)) = value_at_path(object, path) {
                    apply_item_rules(items, elements, path);
                }
            }
        }
    }
}

fn apply_item_rules(items: &[ItemRule], elements: &mut [Value], path: &str) {
    for item in items {
        match item {
            ItemRule::Value(kind) => {
                for element in elements.iter_mut().filter(|e| e.is_string()) {
                    convert_in_place(kind, element, path);
                }
            }
            ItemRule::Object(rules) => {
                for object in elements.iter_mut().filter_map(Value::as_object_mut) {
                    apply_rules(rules, object);
                }
            }
        }
    }
}

fn convert_in_place(kind: &ValueKind, value: &mut Value, path: &str) {
    match kind.convert(value) {
        Some(converted) => *value = converted,
        None if matches!(kind, ValueKind::Int | ValueKind::Float) && value.is_string() => {
            tracing::warn!(path, value = %value, "Could not convert value to {:?}", kind);
        }
        None => {}
    }
}

fn value_at_path<'a>(object: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    segments.try_fold(object.get_mut(first)?, |current, segment| {
        current.as_object_mut()?.get_mut(segment)
    })
}

/// Parses a leading integer, ignoring anything after it (`"3.74"` → 3).
fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let digits_start = usize::from(s.starts_with(['+', '-']));
    let digits_len = s[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    s[..digits_start + digits_len].parse().ok()
}

/// Parses a leading decimal number, ignoring anything after it.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(s.starts_with(['+', '-']));
    let integer = digits(end);
    end += integer;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        if integer > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integer == 0 && fraction == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_map() -> TypeMap {
        TypeMap::from_value(&json!([
            {"numbers": ["int"]},
            {"oneFloat": "float"},
            {"level1.oneInt": "int"},
            {"level1.level2": [{"oneInt": "int", "oneFloat": "float"}]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_apply_nested_rules() {
        let mut value = json!({
            "numbers": ["2", 3, "4", "5"],
            "oneFloat": "3.74",
            "level1": {
                "oneInt": "24",
                "level2": [
                    {"oneInt": 45, "oneFloat": "3.4456", "oneString": "47"},
                    {"oneInt": "54", "oneFloat": 3.16, "oneString": "47"}
                ]
            }
        });
        sample_map().apply(&mut value);

        assert_eq!(
            value,
            json!({
                "numbers": [2, 3, 4, 5],
                "oneFloat": 3.74,
                "level1": {
                    "oneInt": 24,
                    "level2": [
                        {"oneInt": 45, "oneFloat": 3.4456, "oneString": "47"},
                        {"oneInt": 54, "oneFloat": 3.16, "oneString": "47"}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_apply_to_each_list_item() {
        let mut value = json!([{"oneFloat": "1.5"}, {"oneFloat": "2"}, "skipped"]);
        sample_map().apply(&mut value);
        assert_eq!(value, json!([{"oneFloat": 1.5}, {"oneFloat": 2.0}, "skipped"]));
    }

    #[test]
    fn test_int_truncates() {
        let map = TypeMap::new(vec![
            TypeRule::Value {
                path: "a".into(),
                kind: ValueKind::Int,
            },
            TypeRule::Value {
                path: "b".into(),
                kind: ValueKind::Int,
            },
        ]);
        let mut value = json!({"a": "3.74", "b": 3.16});
        map.apply(&mut value);
        assert_eq!(value, json!({"a": 3, "b": 3}));
    }

    #[test]
    fn test_unconvertible_and_missing_values_are_kept() {
        let map = TypeMap::from_value(&json!([
            {"code": "int"},
            {"missing.deep": "int"},
            {"name": "string"}
        ]))
        .unwrap();
        let mut value = json!({"code": "E-10", "name": "Palma"});
        map.apply(&mut value);
        assert_eq!(value, json!({"code": "E-10", "name": "Palma"}));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let map = TypeMap::from_value(&json!([
            {"a": "int", "b": "int"},
            "int",
            {"c": 4},
            {"d": "float"}
        ]))
        .unwrap();
        assert_eq!(
            map.rules(),
            &[TypeRule::Value {
                path: "d".into(),
                kind: ValueKind::Float
            }]
        );
        assert!(TypeMap::from_value(&json!({"d": "float"})).is_err());
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("24"), Some(24));
        assert_eq!(parse_int_prefix("  -7 days"), Some(-7));
        assert_eq!(parse_int_prefix("3.74"), Some(3));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-"), None);
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("3.4456"), Some(3.4456));
        assert_eq!(parse_float_prefix("39.57119 N"), Some(39.57119));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("2."), Some(2.0));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("N/A"), None);
    }

    #[test]
    fn test_deserialize_through_serde() {
        let map: TypeMap = serde_json::from_str(r#"[{"price": "float"}]"#).unwrap();
        assert!(!map.is_empty());
    }
}
