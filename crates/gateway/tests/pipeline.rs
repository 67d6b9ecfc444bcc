//! End-to-end request building and response reading with recorded fixtures.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use indexmap::IndexMap;
use mashup_gateway::{Cli, GatewayError, ServiceProfile, build_request, read_response};
use serde_json::{Value, json};
use tempfile::NamedTempFile;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).unwrap()
}

fn profile(name: &str) -> ServiceProfile {
    ServiceProfile::from_file(fixture_path(name)).unwrap()
}

fn query(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_ticket_avail_request_is_built_from_query() {
    let body = build_request(
        &profile("ticket_avail_profile.json"),
        &query(&[
            ("destination", "PMI"),
            ("from", "20130520"),
            ("to", "20130521"),
            ("unused", "ignored"),
        ]),
        true,
    )
    .unwrap();

    assert!(body.contains(r#"<Destination code="PMI" type="SIMPLE"/>"#));
    assert!(body.contains(r#"<DateFrom date="20130520"/>"#));
    assert!(body.contains("<Language>ENG</Language>"));
    assert!(!body.contains('$'));
}

#[test]
fn test_missing_dates_are_rejected_before_sending() {
    let err = build_request(
        &profile("ticket_avail_profile.json"),
        &query(&[("destination", "PMI")]),
        true,
    )
    .unwrap_err();

    assert_eq!(err.status_code().as_u16(), 400);
    match err {
        GatewayError::MissingParameters { service, keys } => {
            assert_eq!(service, "ticket-avail");
            assert_eq!(keys, vec!["$DateFrom_date$", "$DateTo_date$"]);
        }
        other => panic!("expected missing parameters, got {:?}", other),
    }
}

#[test]
fn test_ticket_valuation_request_is_emitted_as_xml() {
    let body = build_request(
        &profile("ticket_valuation_profile.json"),
        &query(&[
            ("token", "QVbZ+2iZ6dbeCKc4"),
            ("from", "20130520"),
            ("to", "20130521"),
            ("ticket", "000200515"),
            ("modality", "0#8"),
        ]),
        true,
    )
    .unwrap();

    assert_eq!(
        body,
        concat!(
            r#"<TicketValuationRQ echoToken="DummyEchoToken">"#,
            "<Language>ENG</Language>",
            "<AvailToken>QVbZ+2iZ6dbeCKc4</AvailToken>",
            "<ServiceOccupancy><AdultCount>1</AdultCount><ChildCount>0</ChildCount></ServiceOccupancy>",
            r#"<DateFrom date="20130520"/><DateTo date="20130521"/>"#,
            "<TicketCode>000200515</TicketCode>",
            "<ModalityCode>0#8</ModalityCode>",
            "</TicketValuationRQ>"
        )
    );
}

#[test]
fn test_ticket_avail_response_is_mapped_and_typed() {
    let value = read_response(
        &profile("ticket_avail_profile.json"),
        &fixture("ticket_avail_rs.xml"),
        false,
    )
    .unwrap();

    let tickets = value.as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0]["DateFrom"], json!(20130520));
    assert_eq!(tickets[0]["CurrencyCode"], "EUR");
    assert_eq!(tickets[1]["Name"], "Caves of Drach");
    assert_eq!(tickets[1]["ImageList"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_error_list_response_becomes_bad_request() {
    let err = read_response(
        &profile("ticket_avail_profile.json"),
        &fixture("error_list_rs.xml"),
        true,
    )
    .unwrap_err();

    let envelope = err.to_envelope(true);
    assert_eq!(envelope["error"], "004-bad-request");
    assert_eq!(envelope["statusCode"], 400);
    let stack: Value = serde_json::from_str(envelope["stack"].as_str().unwrap()).unwrap();
    assert_eq!(stack[0]["Code"], "SYSTEM_ERROR");
    assert_eq!(
        stack[0]["DetailedMessage"],
        "Invalid credentials for user ISLAS"
    );

    assert!(err.to_envelope(false).get("stack").is_none());
}

#[test]
fn test_malformed_response_is_server_error() {
    let err = read_response(&profile("ticket_avail_profile.json"), "<TicketAvailRS>", false)
        .unwrap_err();
    let envelope = err.to_envelope(false);
    assert_eq!(envelope["error"], "005-xml-parsing-error");
    assert_eq!(envelope["statusCode"], 500);
}

#[test]
fn test_missing_profile_file() {
    let err = ServiceProfile::from_file("/nonexistent/profile.json").unwrap_err();
    assert_eq!(err.code(), "001-service-not-found");
}

#[test]
fn test_cli_extract_with_type_map() {
    let mapping = temp_file(r#"[{"Code": "@code"}, {"Name": ""}]"#);
    let type_map = temp_file(r#"[{"Code": "int"}]"#);
    let input = temp_file(r#"<List><Item code="7">Seven</Item><Item code="8">Eight</Item></List>"#);

    let path = |file: &NamedTempFile| file.path().to_string_lossy().into_owned();
    let cli = Cli::try_parse_from([
        "mashup".to_string(),
        "extract".to_string(),
        "--pretty".to_string(),
        "false".to_string(),
        "--mapping".to_string(),
        path(&mapping),
        "--root-tag".to_string(),
        "Item".to_string(),
        "--type-map".to_string(),
        path(&type_map),
        path(&input),
    ])
    .unwrap();

    assert_eq!(
        cli.execute().unwrap(),
        r#"[{"Code":7,"Name":"Seven"},{"Code":8,"Name":"Eight"}]"#
    );
}

#[test]
fn test_cli_template_strict_and_strip() {
    let template = temp_file("<Q>$a$ $b$</Q>");
    let path = template.path().to_string_lossy().into_owned();

    let strict = Cli::try_parse_from(["mashup", "template", path.as_str(), "-p", "a=1"]).unwrap();
    let err = strict.execute().unwrap_err();
    assert!(matches!(err, GatewayError::MissingParameters { ref keys, .. } if keys == &["$b$"]));

    let strip =
        Cli::try_parse_from(["mashup", "template", path.as_str(), "-p", "a=1", "--strip"]).unwrap();
    assert_eq!(strip.execute().unwrap(), "<Q>1 </Q>");
}

#[test]
fn test_cli_emit() {
    let input = temp_file(r##"{"Destination": {"@code": "PMI", "#value": "Palma"}}"##);
    let path = input.path().to_string_lossy().into_owned();

    let cli = Cli::try_parse_from(["mashup", "emit", "--declaration", path.as_str()]).unwrap();
    assert_eq!(
        cli.execute().unwrap(),
        r#"<?xml version="1.0" encoding="UTF-8"?><Destination code="PMI">Palma</Destination>"#
    );
}

#[test]
fn test_cli_request_lenient_mode() {
    let profile = fixture_path("ticket_avail_profile.json");
    let profile = profile.to_string_lossy().into_owned();

    let cli = Cli::try_parse_from([
        "mashup",
        "request",
        "--profile",
        profile.as_str(),
        "-p",
        "destination=BCN",
        "--strict-params",
        "false",
    ])
    .unwrap();

    let body = cli.execute().unwrap();
    assert!(body.contains(r#"<Destination code="BCN" type="SIMPLE"/>"#));
    assert!(body.contains(r#"<DateFrom date=""/>"#));
}
