//! Gateway configuration.
//!
//! Settings come from command line flags, with environment variable
//! overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MASHUP_LOG_LEVEL` | info | Log level |
//! | `MASHUP_DEBUG` | false | Attach raw bodies and upstream errors to error envelopes |
//! | `MASHUP_STRICT_PARAMS` | true | Reject requests with unresolved template placeholders |
//! | `MASHUP_PRETTY` | true | Pretty-print JSON output |
//!
//! # Example
//!
//! ```rust
//! use mashup_gateway::GatewayConfig;
//!
//! let config = GatewayConfig {
//!     debug: true,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::{ArgAction, Parser};

/// Log levels accepted by [`GatewayConfig::log_level`].
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Gateway configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "mashup")]
#[command(about = "Travel mashup gateway mapping tools")]
pub struct GatewayConfig {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "MASHUP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Attach raw upstream bodies and error lists to error envelopes.
    #[arg(long, global = true, env = "MASHUP_DEBUG", default_value = "false")]
    pub debug: bool,

    /// Treat unresolved template placeholders as an error instead of stripping them.
    #[arg(
        long,
        global = true,
        env = "MASHUP_STRICT_PARAMS",
        default_value = "true",
        action = ArgAction::Set
    )]
    pub strict_params: bool,

    /// Pretty-print JSON output.
    #[arg(
        long,
        global = true,
        env = "MASHUP_PRETTY",
        default_value = "true",
        action = ArgAction::Set
    )]
    pub pretty: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            strict_params: true,
            pretty: true,
        }
    }
}

impl GatewayConfig {
    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "Unknown log level '{}', expected one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Renders `value` as JSON text according to [`pretty`](Self::pretty).
    pub fn render_json(&self, value: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.debug);
        assert!(config.strict_params);
        assert!(config.pretty);
    }

    #[test]
    fn test_parse_flags() {
        let config = GatewayConfig::try_parse_from([
            "mashup",
            "--debug",
            "--strict-params",
            "false",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(config.debug);
        assert!(!config.strict_params);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_validate_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
        let config = GatewayConfig {
            log_level: "TRACE".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = GatewayConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().iter().any(|e| e.contains("loud")));
    }

    #[test]
    fn test_render_json() {
        let value = serde_json::json!({"a": 1});
        let compact = GatewayConfig {
            pretty: false,
            ..Default::default()
        };
        assert_eq!(compact.render_json(&value), r#"{"a":1}"#);
        assert_eq!(GatewayConfig::default().render_json(&value), "{\n  \"a\": 1\n}");
    }
}
