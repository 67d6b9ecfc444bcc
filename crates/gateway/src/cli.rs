//! Command line surface of the `mashup` binary.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use mashup_mapping::{Emitter, Extractor, MappingSpec, TemplateString, TypeMap};
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::pipeline::{build_request, read_response};
use crate::profile::ServiceProfile;

#[derive(Debug, Parser)]
#[command(name = "mashup", version)]
#[command(about = "Travel mashup gateway mapping tools")]
pub struct Cli {
    #[command(flatten)]
    pub config: GatewayConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Map an XML document to JSON.
    Extract {
        /// Mapping specification (JSON array of field rules).
        #[arg(long)]
        mapping: PathBuf,
        /// Tag of the elements to map instead of the document element.
        #[arg(long)]
        root_tag: Option<String>,
        /// Type map applied to the extracted value.
        #[arg(long)]
        type_map: Option<PathBuf>,
        /// XML document.
        input: PathBuf,
    },
    /// Turn a JSON document into XML.
    Emit {
        /// Prepend an XML declaration.
        #[arg(long)]
        declaration: bool,
        /// JSON document following the `@`/`#value`/`#list` convention.
        input: PathBuf,
    },
    /// Fill `$name$` placeholders in a template file.
    Template {
        /// Template file.
        input: PathBuf,
        /// Placeholder value as key=value.
        #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
        /// Remove placeholders that have no value instead of failing.
        #[arg(long)]
        strip: bool,
    },
    /// Build the request body of a service profile.
    Request {
        #[arg(long)]
        profile: PathBuf,
        /// Query parameter as name=value.
        #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Map an upstream response through a service profile.
    Response {
        #[arg(long)]
        profile: PathBuf,
        /// Upstream XML response.
        input: PathBuf,
    },
}

/// Parses `key=value`; the value may itself contain `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

impl Cli {
    /// Runs the command and returns what should be printed on stdout.
    pub fn execute(&self) -> GatewayResult<String> {
        let config = &self.config;
        match &self.command {
            Command::Extract {
                mapping,
                root_tag,
                type_map,
                input,
            } => {
                let spec = MappingSpec::from_json_str(&read_file(mapping)?)?;
                let mut extractor = Extractor::new().with_debug(config.debug);
                if let Some(tag) = root_tag {
                    extractor = extractor.with_root_tag(tag.as_str());
                }
                let mut value = extractor.extract(&read_file(input)?, &spec)?.into_value();
                if let Some(path) = type_map {
                    TypeMap::from_json_str(&read_file(path)?)?.apply(&mut value);
                }
                Ok(config.render_json(&value))
            }
            Command::Emit { declaration, input } => {
                let value: Value = serde_json::from_str(&read_file(input)?).map_err(|source| {
                    GatewayError::InvalidRequestBody {
                        service: input.display().to_string(),
                        source,
                    }
                })?;
                Ok(Emitter::new().with_declaration(*declaration).emit(&value)?)
            }
            Command::Template {
                input,
                params,
                strip,
            } => {
                let template = TemplateString::new(read_file(input)?).with_params(params.clone());
                if *strip {
                    return Ok(template.resolve_and_strip_unresolved());
                }
                template
                    .resolve_strict()
                    .map_err(|e| match e {
                        mashup_mapping::TemplateError::Unresolved { keys } => {
                            GatewayError::MissingParameters {
                                service: input.display().to_string(),
                                keys,
                            }
                        }
                    })
            }
            Command::Request { profile, params } => {
                let profile = ServiceProfile::from_file(profile)?;
                let query: IndexMap<String, String> = params.iter().cloned().collect();
                build_request(&profile, &query, config.strict_params)
            }
            Command::Response { profile, input } => {
                let profile = ServiceProfile::from_file(profile)?;
                let value = read_response(&profile, &read_file(input)?, config.debug)?;
                Ok(config.render_json(&value))
            }
        }
    }
}

fn read_file(path: &Path) -> GatewayResult<String> {
    fs::read_to_string(path).map_err(|source| GatewayError::Io {
        path: path.to_path_buf(),
        source,
    })
}
