//! # mashup-mapping - description-driven XML/JSON mapping
//!
//! This crate is the mapping engine shared by every upstream adapter of the
//! travel mashup gateway. It turns raw XML responses into sparse JSON
//! following a declarative mapping specification, emits XML request bodies
//! from a JSON key convention, and fills `$name$` placeholders in request
//! templates.
//!
//! ## Components
//!
//! - [`Extractor`] - parses XML into an [`XmlNode`] tree and projects it
//!   through a [`MappingSpec`]
//! - [`Emitter`] - serializes JSON following the `@` / `#value` / `#list`
//!   convention to XML
//! - [`TemplateString`] - placeholder substitution with unresolved-key
//!   diagnostics
//! - [`TypeMap`] - converts extracted strings at given paths to numbers
//!
//! ## Mapping specifications
//!
//! | Rule | Meaning |
//! |------|---------|
//! | `"Name"` | copy the text of child `<Name>` |
//! | `{"Code": "@code"}` | attribute `code` of the current element |
//! | `{"City": "Hotel.Contact.City"}` | text at a dot path, first element at each hop |
//! | `{"Name": ""}` | text of the current element |
//! | `{"TicketInfo.ImageList.Image": [..]}` | every `<Image>`, projected, under `"ImageList"` |
//!
//! ## Quick Start
//!
//! ```
//! use mashup_mapping::{MappingSpec, extract};
//!
//! let spec = MappingSpec::from_json_str(r#"["Code", {"Name": "Info.Name"}]"#)?;
//! let xml = "<List><Hotel><Code>1</Code><Info><Name>Son Vida</Name></Info></Hotel>\
//!            <Hotel><Code>2</Code></Hotel></List>";
//!
//! let hotels = extract(xml, &spec, Some("Hotel"))?;
//! assert_eq!(hotels.as_list().map(<[_]>::len), Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! All operations are pure and synchronous; nothing here performs I/O or
//! holds shared state.

pub mod emit;
pub mod error;
pub mod extract;
pub mod node;
pub mod spec;
pub mod template;
pub mod typemap;

pub use emit::{Emitter, emit};
pub use error::{EmissionError, ExtractionError, SpecError, TemplateError};
pub use extract::{Extracted, Extractor, Object, extract, project};
pub use node::XmlNode;
pub use spec::{FieldRule, GroupPath, MappingSpec, ScalarPath, listify};
pub use template::TemplateString;
pub use typemap::{ItemRule, TypeMap, TypeRule, ValueKind};
