//! Template workflows: create, fill, inspect.
//!
//! Each workflow is a single pass over one or two files. Missing input files
//! are a user mistake, not a program failure: the workflow reports them on
//! stdout and returns normally. Everything else propagates as an error.

use crate::docx::{self, FieldLocator, Parameter};
use crate::error::Result;
use crate::mapping::Mapping;
use crate::opc::Package;
use std::fs::{File, OpenOptions};
use std::io::{Seek, Write};
use std::path::Path;
use tracing::warn;

/// Supplies values for named parameters during a fill pass.
///
/// Returning `None`, or a blank string, leaves the field untouched.
pub trait ValueResolver {
    fn resolve(&mut self, name: &str) -> Option<String>;
}

impl<F> ValueResolver for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn resolve(&mut self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Create a fillable document from a template.
///
/// Scans the template for parameters, copies the template bytes to the
/// output path, then persists the scanned mapping (stub data paths) into the
/// copy's custom properties.
pub fn create_from_template(template: &Path, output: &Path) -> Result<()> {
    if !template.is_file() {
        println!("Template file not found.");
        return Ok(());
    }

    let mapping = {
        let mut file = File::open(template)?;
        let pkg = Package::read_from(&mut file, false)?;
        Mapping::from_template(&pkg)?
    };

    std::fs::copy(template, output)?;

    let mut file = OpenOptions::new().read(true).write(true).open(output)?;
    let mut pkg = Package::read_from(&mut file, true)?;
    mapping.store(&mut pkg)?;
    rewrite_file(&mut file, &pkg)?;

    println!(
        "Document '{}' created from template '{}'.",
        output.display(),
        template.display()
    );
    Ok(())
}

/// Fill a document's template fields with values from the resolver.
///
/// Every live named field is offered to the resolver; the persisted mapping
/// only gates whether the document is a template at all. Mapping entries
/// that cannot be decoded are logged and skipped.
pub fn process(document: &Path, resolver: &mut dyn ValueResolver) -> Result<()> {
    if !document.is_file() {
        println!("Document file not found.");
        return Ok(());
    }

    let mut file = OpenOptions::new().read(true).write(true).open(document)?;
    let mut pkg = Package::read_from(&mut file, true)?;

    let mapping = Mapping::load_with(&pkg, |d| warn!("{}", d))?;
    if mapping.is_empty() {
        println!("Template properties not found.");
        return Ok(());
    }

    let mut params = FieldLocator::new(&pkg).parameters()?;
    println!("Fill template property values:");
    for param in &mut params {
        if let Some(value) = resolver.resolve(param.name()) {
            if !value.trim().is_empty() {
                param.set_value(&value);
            }
        }
    }

    docx::apply_parameters(&mut pkg, &params)?;
    rewrite_file(&mut file, &pkg)?;

    println!("Document stream has been processed");
    Ok(())
}

/// Print the mapping persisted in a document.
pub fn show_mapping(document: &Path) -> Result<()> {
    if !document.is_file() {
        println!("Document file not found.");
        return Ok(());
    }

    let mut file = File::open(document)?;
    let pkg = Package::read_from(&mut file, false)?;
    let mapping = Mapping::load_with(&pkg, |d| warn!("{}", d))?;

    if mapping.is_empty() {
        println!("Template properties not found.");
        return Ok(());
    }

    println!("Found template properties:");
    for element in mapping.iter() {
        println!(
            "  \"{}\": \"{}\"",
            element.name(),
            element.data_path().unwrap_or_default()
        );
    }
    Ok(())
}

/// Replace a file's content with the package's serialized bytes.
fn rewrite_file(file: &mut File, pkg: &Package) -> Result<()> {
    let bytes = pkg.to_bytes()?;
    file.set_len(0)?;
    file.rewind()?;
    file.write_all(&bytes)?;
    Ok(())
}
