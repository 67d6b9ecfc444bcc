//! Detection of errors reported inside upstream XML responses.
//!
//! The booking backend answers faulty requests with HTTP 200 and a body
//! carrying an `<ErrorList>`. Responses are probed for it before they are
//! mapped.

use mashup_mapping::{Extractor, FieldRule, MappingSpec};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};

/// Key of the extracted error list.
pub const ERROR_LIST_KEY: &str = "ErrorList";

static ERROR_SPEC: Lazy<MappingSpec> = Lazy::new(|| {
    MappingSpec::new(vec![FieldRule::group(
        "ErrorList.Error",
        MappingSpec::new(vec![
            FieldRule::copy("Code"),
            FieldRule::copy("Timestamp"),
            FieldRule::copy("Message"),
            FieldRule::copy("DetailedMessage"),
        ]),
    )])
});

/// Fails with [`GatewayError::Upstream`] if `xml` carries a coded error list.
pub fn probe_errors(service: &str, xml: &str, debug: bool) -> GatewayResult<()> {
    let extracted = Extractor::new()
        .with_debug(debug)
        .extract(xml, &ERROR_SPEC)?;

    let Some(errors) = extracted
        .as_single()
        .and_then(|object| object.get(ERROR_LIST_KEY))
    else {
        return Ok(());
    };

    tracing::warn!(
        service,
        count = errors.as_array().map(Vec::len).unwrap_or(0),
        "Upstream service reported errors"
    );
    Err(GatewayError::Upstream {
        service: service.to_string(),
        errors: Value::clone(errors),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_response_passes() {
        let xml = r#"<TicketAvailRS totalItems="0"><AuditData/></TicketAvailRS>"#;
        assert!(probe_errors("ticket-avail", xml, false).is_ok());
    }

    #[test]
    fn test_error_list_is_reported() {
        let xml = "<HotelListRS><ErrorList><Error><Code>INVALID_DATA</Code>\
                   <Message>Bad destination</Message></Error></ErrorList></HotelListRS>";
        match probe_errors("hotel-list", xml, false) {
            Err(GatewayError::Upstream { service, errors }) => {
                assert_eq!(service, "hotel-list");
                assert_eq!(
                    errors,
                    json!([{"Code": "INVALID_DATA", "Message": "Bad destination"}])
                );
            }
            other => panic!("expected an upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_response_is_a_parse_failure() {
        let err = probe_errors("hotel-list", "<HotelListRS>", true).unwrap_err();
        assert_eq!(err.code(), "005-xml-parsing-error");
        assert_eq!(err.to_envelope(true)["stack"], "<HotelListRS>");
    }
}
