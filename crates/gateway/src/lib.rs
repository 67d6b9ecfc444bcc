//! # mashup-gateway - upstream integration layer
//!
//! Binds the mapping engine to concrete upstream operations. Each operation
//! is described by a [`ServiceProfile`]: a request template, the public
//! parameters it accepts, a mapping specification for its response and an
//! optional type map.
//!
//! ## Flow
//!
//! 1. [`build_request`] binds query parameters, fills the template and,
//!    for JSON bodies, emits XML. Missing mandatory parameters fail with a
//!    400-class error before any network call.
//! 2. The caller sends the body and receives the upstream response.
//! 3. [`read_response`] probes the body for a coded `ErrorList`, extracts
//!    it and converts typed fields.
//!
//! Failures render as a JSON envelope via [`GatewayError::to_envelope`].
//!
//! ## Configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MASHUP_LOG_LEVEL` | info | Log level (error, warn, info, debug, trace) |
//! | `MASHUP_DEBUG` | false | Include diagnostics in error envelopes |
//! | `MASHUP_STRICT_PARAMS` | true | Reject unresolved template placeholders |
//! | `MASHUP_PRETTY` | true | Pretty-print JSON output |

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod profile;
pub mod upstream;

pub use cli::{Cli, Command};
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use pipeline::{build_request, read_response};
pub use profile::{BodyKind, ServiceProfile};
pub use upstream::probe_errors;

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so that stdout only carries command output. `RUST_LOG`
/// takes precedence over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("mashup_gateway={},mashup_mapping={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
