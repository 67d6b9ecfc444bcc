//! `$name$` placeholder substitution for request bodies.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::TemplateError;

/// A `$key$` placeholder token.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[^$]+\$").expect("placeholder pattern is valid"));

/// A base template plus a flat substitution map.
///
/// # Examples
///
/// ```
/// use mashup_mapping::TemplateString;
///
/// let template = TemplateString::new("<Code>$code$</Code><Date>$date$</Date>")
///     .with_param("code", "PMI");
///
/// assert_eq!(template.resolve(), "<Code>PMI</Code><Date>$date$</Date>");
/// assert_eq!(template.unresolved_keys(), vec!["$date$"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateString {
    base: Option<String>,
    params: IndexMap<String, String>,
}

impl TemplateString {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            params: IndexMap::new(),
        }
    }

    /// A template with no base string; it resolves to the empty string.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Replaces every `$key$` for each known key. Unknown tokens stay verbatim.
    ///
    /// Substitution is a single pass: placeholders appearing inside
    /// substituted values are not expanded.
    pub fn resolve(&self) -> String {
        self.substitute(|token| token.to_string())
    }

    /// Like [`resolve`](Self::resolve), but unknown tokens are removed.
    pub fn resolve_and_strip_unresolved(&self) -> String {
        self.substitute(|_| String::new())
    }

    /// Tokens without a value, left to right, duplicates included.
    pub fn unresolved_keys(&self) -> Vec<String> {
        let Some(base) = &self.base else {
            return Vec::new();
        };
        PLACEHOLDER
            .find_iter(base)
            .filter(|m| !self.params.contains_key(token_key(m.as_str())))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Resolves the template, failing if any placeholder has no value.
    pub fn resolve_strict(&self) -> Result<String, TemplateError> {
        let keys = self.unresolved_keys();
        if keys.is_empty() {
            Ok(self.resolve())
        } else {
            Err(TemplateError::Unresolved { keys })
        }
    }

    fn substitute(&self, unknown: impl Fn(&str) -> String) -> String {
        let Some(base) = &self.base else {
            return String::new();
        };
        PLACEHOLDER
            .replace_all(base, |caps: &Captures<'_>| {
                let token = &caps[0];
                match self.params.get(token_key(token)) {
                    Some(value) => value.clone(),
                    None => unknown(token),
                }
            })
            .into_owned()
    }
}

fn token_key(token: &str) -> &str {
    &token[1..token.len() - 1]
}
