//! Document templating over OOXML packages.
//!
//! `templet` turns a Word document containing named content controls into a
//! refillable template. It discovers placeholder fields (`w:sdt` elements
//! carrying a `w:alias` display name) across the document's story parts,
//! persists a parameter mapping inside the package's custom properties
//! (`docProps/custom.xml`), and fills fields back in without disturbing the
//! rest of the document.
//!
//! The crate is layered bottom-up:
//!
//! - [`opc`]: zip-backed package access, `.rels` and `[Content_Types].xml`
//!   resolution.
//! - [`custom_props`]: the custom document properties codec.
//! - [`docx`]: placeholder field extraction, the [`docx::Parameter`] trait,
//!   and the streaming rewrite pass.
//! - [`mapping`]: the persisted name-to-data-path mapping (`TPL_` prefix,
//!   base64 values).
//! - [`engine`]: the create / fill / show workflows the CLI exposes.
//!
//! # Example
//!
//! ```no_run
//! use templet::engine;
//! use std::path::Path;
//!
//! # fn main() -> templet::Result<()> {
//! engine::create_from_template(
//!     Path::new("letter.docx"),
//!     Path::new("letter-template.docx"),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod custom_props;
pub mod docx;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod opc;

pub use docx::{Field, FieldLocator, Parameter, SdtParameter};
pub use engine::ValueResolver;
pub use error::{Result, TemplateError};
pub use mapping::{Mapping, MappingDiagnostic, MappingElement};
