//! Error types for the gateway layer.
//!
//! Every failure is rendered to clients as the JSON error envelope
//! `{ "error", "statusCode", "description", "stack"? }`.
//!
//! # Error Mapping
//!
//! | Variant | Code | HTTP Status |
//! |---------|------|-------------|
//! | MissingParameters | 004-bad-request | 400 |
//! | InvalidRequestBody | 101-bad-json-to-xml | 400 |
//! | Upstream | 004-bad-request | 400 |
//! | Emission | 101-bad-json-to-xml | 500 |
//! | Extraction | 005-xml-parsing-error | 500 |
//! | Profile | 001-service-not-found | 500 |
//! | Definition | 001-service-not-found | 500 |
//! | Io | 000-missing-input | 500 |

use std::path::PathBuf;

use http::StatusCode;
use mashup_mapping::{EmissionError, ExtractionError, SpecError};
use serde_json::{Value, json};
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// The error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Mandatory template placeholders had no value; nothing was sent.
    #[error("Missing mandatory parameters for {service}: {}", keys.join(", "))]
    MissingParameters { service: String, keys: Vec<String> },

    /// A JSON request body did not parse after substitution.
    #[error("Request body for {service} is not valid JSON: {source}")]
    InvalidRequestBody {
        service: String,
        #[source]
        source: serde_json::Error,
    },

    /// The upstream service answered with a coded error list.
    #[error("Faulty {service} request made to the upstream service. See stack trace for details")]
    Upstream { service: String, errors: Value },

    #[error("Could not build XML request: {0}")]
    Emission(#[from] EmissionError),

    #[error("Could not parse upstream response: {0}")]
    Extraction(#[from] ExtractionError),

    /// A service profile could not be loaded.
    #[error("Cannot load service profile {}: {message}", path.display())]
    Profile { path: PathBuf, message: String },

    /// A mapping specification or type map is not usable.
    #[error("Invalid mapping definition: {0}")]
    Definition(#[from] SpecError),

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GatewayError {
    /// Stable error code reported in the envelope's `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingParameters { .. } | GatewayError::Upstream { .. } => {
                "004-bad-request"
            }
            GatewayError::InvalidRequestBody { .. } | GatewayError::Emission(_) => {
                "101-bad-json-to-xml"
            }
            GatewayError::Extraction(_) => "005-xml-parsing-error",
            GatewayError::Profile { .. } | GatewayError::Definition(_) => "001-service-not-found",
            GatewayError::Io { .. } => "000-missing-input",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingParameters { .. }
            | GatewayError::InvalidRequestBody { .. }
            | GatewayError::Upstream { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Emission(_)
            | GatewayError::Extraction(_)
            | GatewayError::Profile { .. }
            | GatewayError::Definition(_)
            | GatewayError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Diagnostic detail, only exposed in debug mode.
    fn stack(&self) -> Option<String> {
        match self {
            GatewayError::Upstream { errors, .. } => Some(errors.to_string()),
            GatewayError::Extraction(e) => e.body().map(str::to_string),
            GatewayError::MissingParameters { keys, .. } => Some(keys.join(", ")),
            _ => None,
        }
    }

    /// Renders the JSON error envelope.
    pub fn to_envelope(&self, debug: bool) -> Value {
        let mut envelope = json!({
            "error": self.code(),
            "statusCode": self.status_code().as_u16(),
            "description": self.to_string(),
        });
        if debug {
            if let (Some(stack), Some(object)) = (self.stack(), envelope.as_object_mut()) {
                object.insert("stack".to_string(), Value::String(stack));
            }
        }
        envelope
    }
}
