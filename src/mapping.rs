//! Parameter mapping persisted in custom document properties.
//!
//! A mapping associates each template parameter name with an opaque data
//! path. It is persisted inside the package as custom properties: the name
//! is stored behind the `TPL_` prefix and the path is stored base64-encoded
//! in the property value, so arbitrary path text survives the property
//! grammar. A freshly scanned template has no real paths yet; those entries
//! carry a single-space stub that is distinguishable from an absent path.

use crate::custom_props::CustomProperties;
use crate::docx::{FieldLocator, Parameter};
use crate::error::Result;
use crate::opc::Package;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashSet;
use std::fmt;

/// Prefix that marks a custom property as a template parameter entry.
pub const PARAMETER_NAME_PREFIX: &str = "TPL_";

/// Stub data path for parameters that have not been bound yet.
pub const BLANK_DATA_PATH: &str = " ";

/// One name-to-data-path association.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingElement {
    name: String,
    data_path: Option<String>,
}

impl MappingElement {
    pub fn new(name: impl Into<String>, data_path: Option<String>) -> Self {
        Self {
            name: name.into(),
            data_path,
        }
    }

    /// The parameter name, without the storage prefix.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The data path, if one is set.
    #[inline]
    pub fn data_path(&self) -> Option<&str> {
        self.data_path.as_deref()
    }
}

/// A recoverable problem with one persisted mapping entry.
///
/// Load skips the entry and reports it through the caller's sink; it never
/// aborts the whole load.
#[derive(Debug)]
pub enum MappingDiagnostic {
    /// The property name does not reduce to exactly one parameter name.
    AmbiguousName { property: String },
    /// The property value is not valid base64-encoded UTF-8.
    UnreadableValue { property: String, reason: String },
}

impl fmt::Display for MappingDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousName { property } => {
                write!(
                    f,
                    "Unable get parameter value for document parameter '{}'",
                    property
                )
            },
            Self::UnreadableValue { property, reason } => {
                write!(
                    f,
                    "Unable get parameter value for document parameter '{}': {}",
                    property, reason
                )
            },
        }
    }
}

/// Ordered collection of parameter mapping elements.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    elements: Vec<MappingElement>,
}

impl Mapping {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate elements in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = &MappingElement> {
        self.elements.iter()
    }

    /// Build a mapping by scanning a template's placeholder fields.
    ///
    /// Distinct parameter names only, first occurrence winning; every entry
    /// gets the stub data path.
    pub fn from_template(pkg: &Package) -> Result<Self> {
        let params = FieldLocator::new(pkg).parameters()?;
        let mut seen = HashSet::new();
        let mut elements = Vec::new();
        for param in &params {
            if seen.insert(param.name().to_string()) {
                elements.push(MappingElement::new(
                    param.name(),
                    Some(BLANK_DATA_PATH.to_string()),
                ));
            }
        }
        Ok(Self { elements })
    }

    /// Load the persisted mapping, discarding per-entry diagnostics.
    pub fn load(pkg: &Package) -> Result<Self> {
        Self::load_with(pkg, |_| {})
    }

    /// Load the persisted mapping from the package's custom properties.
    ///
    /// An absent properties part, or one holding no prefixed entries, yields
    /// an empty mapping. Entries that cannot be decoded are reported to
    /// `sink` and skipped. Order is preserved and duplicate names are kept.
    pub fn load_with(
        pkg: &Package,
        mut sink: impl FnMut(MappingDiagnostic),
    ) -> Result<Self> {
        let props = CustomProperties::from_package(pkg)?;
        let mut elements = Vec::new();
        for prop in props.iter() {
            if !prop.name().starts_with(PARAMETER_NAME_PREFIX) {
                continue;
            }
            let pieces: Vec<&str> = prop
                .name()
                .split(PARAMETER_NAME_PREFIX)
                .filter(|p| !p.is_empty())
                .collect();
            let [name] = pieces.as_slice() else {
                sink(MappingDiagnostic::AmbiguousName {
                    property: prop.name().to_string(),
                });
                continue;
            };

            let decoded = match BASE64.decode(prop.value()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    sink(MappingDiagnostic::UnreadableValue {
                        property: prop.name().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                },
            };
            let data_path = match String::from_utf8(decoded) {
                Ok(text) => text,
                Err(e) => {
                    sink(MappingDiagnostic::UnreadableValue {
                        property: prop.name().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                },
            };

            elements.push(MappingElement::new(name.to_string(), Some(data_path)));
        }
        Ok(Self { elements })
    }

    /// Persist the mapping into the package, replacing any previous custom
    /// properties part and registering it when new.
    ///
    /// Elements with no data path, or an empty one, are not persisted.
    /// Ordinal ids are reassigned sequentially starting at 2.
    pub fn store(&self, pkg: &mut Package) -> Result<()> {
        let mut props = CustomProperties::new();
        let mut pid = 2;
        for element in &self.elements {
            let Some(path) = element.data_path() else {
                continue;
            };
            if path.is_empty() {
                continue;
            }
            props.push(
                format!("{}{}", PARAMETER_NAME_PREFIX, element.name()),
                BASE64.encode(path),
                pid,
            );
            pid += 1;
        }
        props.write_to_package(pkg)?;
        Ok(())
    }
}
