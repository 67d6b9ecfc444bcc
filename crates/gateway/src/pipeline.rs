//! Request building and response reading for a [`ServiceProfile`].
//!
//! Outbound: query parameters → template values → request body, with
//! missing mandatory parameters rejected before anything is sent.
//! Inbound: response body → error probe → extraction → type conversion.

use std::borrow::Cow;

use indexmap::IndexMap;
use mashup_mapping::{Emitter, Extractor, TemplateString};
use quick_xml::escape::escape;
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};
use crate::profile::{BodyKind, ServiceProfile};
use crate::upstream::probe_errors;

/// Builds the request body for `profile` from public query parameters.
///
/// With `strict`, any placeholder left without a value is reported as
/// [`GatewayError::MissingParameters`]. Otherwise leftover placeholders are
/// removed from the body.
///
/// Values are escaped for the body kind before substitution, so they always
/// land inside the string or text position of their placeholder.
pub fn build_request(
    profile: &ServiceProfile,
    query: &IndexMap<String, String>,
    strict: bool,
) -> GatewayResult<String> {
    let params = profile
        .bind_parameters(query)
        .into_iter()
        .map(|(key, value)| {
            let value = escape_value(profile.body, &value).into_owned();
            (key, value)
        });
    let template = TemplateString::new(profile.template.as_str()).with_params(params);

    let resolved = if strict {
        let missing = template.unresolved_keys();
        if !missing.is_empty() {
            tracing::debug!(service = %profile.name, missing = ?missing, "Rejecting request");
            return Err(GatewayError::MissingParameters {
                service: profile.name.clone(),
                keys: missing,
            });
        }
        template.resolve()
    } else {
        template.resolve_and_strip_unresolved()
    };

    match profile.body {
        BodyKind::Template => Ok(resolved),
        BodyKind::JsonForXml => {
            let body: Value =
                serde_json::from_str(&resolved).map_err(|source| GatewayError::InvalidRequestBody {
                    service: profile.name.clone(),
                    source,
                })?;
            Ok(Emitter::new().emit(&body)?)
        }
    }
}

fn escape_value(body: BodyKind, value: &str) -> Cow<'_, str> {
    match body {
        BodyKind::Template => escape(value),
        BodyKind::JsonForXml => {
            let quoted = Value::String(value.to_string()).to_string();
            Cow::Owned(quoted[1..quoted.len() - 1].to_string())
        }
    }
}

/// Maps an upstream response body through `profile`.
///
/// Returns `null` when the profile's root tag does not occur in the body.
pub fn read_response(profile: &ServiceProfile, xml: &str, debug: bool) -> GatewayResult<Value> {
    if profile.probe_errors {
        probe_errors(&profile.name, xml, debug)?;
    }

    let mut extractor = Extractor::new().with_debug(debug);
    if let Some(tag) = &profile.root_tag {
        extractor = extractor.with_root_tag(tag.as_str());
    }

    let extracted = extractor.extract(xml, &profile.mapping)?;
    if extracted.is_not_found() {
        tracing::debug!(service = %profile.name, "No data in upstream response");
        return Ok(Value::Null);
    }

    let mut value = extracted.into_value();
    profile.type_map.apply(&mut value);
    Ok(value)
}
