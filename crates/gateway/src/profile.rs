//! Service profiles: everything the gateway knows about one upstream operation.
//!
//! A profile is a JSON document:
//!
//! ```json
//! {
//!   "name": "ticket-avail",
//!   "template": "<TicketAvailRQ echoToken=\"$echoToken$\">...</TicketAvailRQ>",
//!   "parameterMap": {"destination": "Destination_code"},
//!   "defaults": {"Language": "ENG"},
//!   "mapping": [{"AvailToken": "@availToken"}, "Currency"],
//!   "rootTag": "ServiceTicket",
//!   "typeMap": [{"TotalItems": "int"}]
//! }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use mashup_mapping::{MappingSpec, TypeMap};
use serde::Deserialize;

use crate::error::{GatewayError, GatewayResult};

/// How the resolved template becomes the request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyKind {
    /// The resolved template is sent as is.
    #[default]
    Template,
    /// The resolved template is JSON following the `@`/`#value`/`#list`
    /// convention and is emitted as XML.
    JsonForXml,
}

/// Definition of one upstream operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProfile {
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub body: BodyKind,
    /// Public query parameter name to template key.
    #[serde(default)]
    pub parameter_map: IndexMap<String, String>,
    /// Template values used when the query does not provide one.
    #[serde(default)]
    pub defaults: IndexMap<String, String>,
    #[serde(default)]
    pub mapping: MappingSpec,
    #[serde(default)]
    pub root_tag: Option<String>,
    #[serde(default)]
    pub type_map: TypeMap,
    /// Check responses for a coded `ErrorList` before mapping them.
    #[serde(default = "default_probe_errors")]
    pub probe_errors: bool,
}

fn default_probe_errors() -> bool {
    true
}

impl ServiceProfile {
    /// Loads a profile from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| GatewayError::Profile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let profile: Self = serde_json::from_str(&text).map_err(|e| GatewayError::Profile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(
            service = %profile.name,
            rules = profile.mapping.len(),
            path = %path.display(),
            "Loaded service profile"
        );
        Ok(profile)
    }

    /// Translates public query parameters into template values.
    ///
    /// Only parameters named in `parameterMap` are used; any template key
    /// still missing afterwards is taken from `defaults`.
    pub fn bind_parameters(&self, query: &IndexMap<String, String>) -> IndexMap<String, String> {
        let mut bound: IndexMap<String, String> = self
            .parameter_map
            .iter()
            .filter_map(|(public, key)| query.get(public).map(|value| (key.clone(), value.clone())))
            .collect();

        for (key, value) in &self.defaults {
            bound.entry(key.clone()).or_insert_with(|| value.clone());
        }

        let ignored = query
            .keys()
            .filter(|name| !self.parameter_map.contains_key(*name))
            .count();
        if ignored > 0 {
            tracing::debug!(service = %self.name, ignored, "Ignoring unknown query parameters");
        }

        bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> ServiceProfile {
        serde_json::from_value(json!({
            "name": "ticket-avail",
            "template": "<Q lang=\"$Language$\">$Destination_code$</Q>",
            "parameterMap": {"destination": "Destination_code", "lang": "Language"},
            "defaults": {"Language": "ENG", "Destination_code": "PMI"},
            "mapping": ["Code"],
            "rootTag": "ServiceTicket"
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_defaults() {
        let profile = profile();
        assert_eq!(profile.body, BodyKind::Template);
        assert!(profile.probe_errors);
        assert!(profile.type_map.is_empty());
        assert_eq!(profile.mapping.len(), 1);
        assert_eq!(profile.root_tag.as_deref(), Some("ServiceTicket"));
    }

    #[test]
    fn test_body_kind_names() {
        let kind: BodyKind = serde_json::from_value(json!("json-for-xml")).unwrap();
        assert_eq!(kind, BodyKind::JsonForXml);
    }

    #[test]
    fn test_bind_parameters_maps_and_defaults() {
        let query: IndexMap<String, String> = [
            ("destination".to_string(), "BCN".to_string()),
            ("unknown".to_string(), "x".to_string()),
        ]
        .into_iter()
        .collect();

        let bound = profile().bind_parameters(&query);
        assert_eq!(bound.get("Destination_code").map(String::as_str), Some("BCN"));
        assert_eq!(bound.get("Language").map(String::as_str), Some("ENG"));
        assert!(!bound.contains_key("unknown"));
    }

    #[test]
    fn test_invalid_mapping_is_rejected() {
        let result: Result<ServiceProfile, _> = serde_json::from_value(json!({
            "name": "broken",
            "template": "",
            "mapping": {"Code": "Code"}
        }));
        assert!(result.is_err());
    }
}
