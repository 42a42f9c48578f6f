//! Open Packaging Convention (OPC) support.
//!
//! OPC is the zip-plus-XML container format used by Office documents.
//! This module provides the package accessor and the part-resolution
//! machinery ([Content_Types].xml and .rels handling) the rest of the crate
//! builds on.

pub mod constants;
pub mod content_types;
pub mod error;
pub mod package;
pub mod rel;

pub use content_types::ContentTypes;
pub use error::{OpcError, Result};
pub use package::Package;
pub use rel::{Relationship, Relationships};
