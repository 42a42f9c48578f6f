/// Zip-backed OPC package access.
///
/// A `Package` holds every zip member of a document package in memory, in
/// archive order, and knows how to resolve parts through `[Content_Types].xml`
/// and `.rels` sub-parts. Opening from a stream guarantees the stream cursor
/// is back at offset 0 on every exit path, because callers reuse one handle
/// for several operations in sequence.
use crate::opc::constants::{content_type as ct, part_name, relationship_type};
use crate::opc::content_types::{self, ContentTypes};
use crate::opc::error::{OpcError, Result};
use crate::opc::rel::{self, Relationships};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

/// Restores the stream position to the start when dropped.
///
/// This runs on success, on `?` early returns, and on panics, which is what
/// makes the position-reset contract hold on every exit path.
struct RewindGuard<'a, S: Seek> {
    stream: &'a mut S,
}

impl<'a, S: Seek> RewindGuard<'a, S> {
    fn new(stream: &'a mut S) -> Self {
        Self { stream }
    }

    fn stream(&mut self) -> &mut S {
        self.stream
    }
}

impl<S: Seek> Drop for RewindGuard<'_, S> {
    fn drop(&mut self) {
        let _ = self.stream.seek(SeekFrom::Start(0));
    }
}

/// An open document package.
#[derive(Debug)]
pub struct Package {
    /// Zip member names in archive order
    names: Vec<String>,
    /// Member name -> decompressed content
    parts: HashMap<String, Vec<u8>>,
    /// Whether mutation is allowed
    writable: bool,
}

impl Package {
    /// Open a package from a byte buffer.
    ///
    /// Fails with [`OpcError::MalformedPackage`] when the buffer is not a
    /// zip archive or lacks the `[Content_Types].xml` part every OPC package
    /// must carry.
    pub fn from_bytes(data: &[u8], writable: bool) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| OpcError::MalformedPackage(e.to_string()))?;

        let mut names = Vec::with_capacity(archive.len());
        let mut parts = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| OpcError::MalformedPackage(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            names.push(name.clone());
            parts.insert(name, blob);
        }

        if !parts.contains_key(part_name::CONTENT_TYPES) {
            return Err(OpcError::MalformedPackage(
                "missing [Content_Types].xml".to_string(),
            ));
        }

        Ok(Self {
            names,
            parts,
            writable,
        })
    }

    /// Open a package by reading a stream to its end.
    ///
    /// The stream position is reset to 0 before this returns, whether the
    /// open succeeds or fails.
    pub fn read_from<R: Read + Seek>(stream: &mut R, writable: bool) -> Result<Self> {
        let mut guard = RewindGuard::new(stream);
        let mut data = Vec::new();
        guard.stream().read_to_end(&mut data)?;
        Self::from_bytes(&data, writable)
    }

    /// Whether this package accepts mutation.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Get a part's content by zip member name.
    pub fn blob(&self, name: &str) -> Result<&[u8]> {
        self.part(name)
            .ok_or_else(|| OpcError::PartNotFound(name.to_string()))
    }

    /// Get a part's content, or `None` when the part does not exist.
    ///
    /// Absence of optional parts (custom properties, footnotes) is a normal
    /// state, not an error.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(|b| b.as_slice())
    }

    /// Check whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Replace a part's content, or add a new part at the end of the archive.
    pub fn set_part(&mut self, name: &str, blob: Vec<u8>) -> Result<()> {
        if !self.writable {
            return Err(OpcError::ReadOnly(name.to_string()));
        }
        if !self.parts.contains_key(name) {
            self.names.push(name.to_string());
        }
        self.parts.insert(name.to_string(), blob);
        Ok(())
    }

    /// Add or replace a part and register it in `[Content_Types].xml` and the
    /// package-level relationships. Registration is idempotent.
    pub fn add_part_with_registration(
        &mut self,
        name: &str,
        content_type: &str,
        reltype: &str,
        blob: Vec<u8>,
    ) -> Result<()> {
        self.set_part(name, blob)?;

        let types_xml = content_types::insert_override(
            self.blob(part_name::CONTENT_TYPES)?,
            name,
            content_type,
        )?;
        self.set_part(part_name::CONTENT_TYPES, types_xml)?;

        let rels_xml = rel::insert_relationship(
            self.blob(part_name::PACKAGE_RELS)?,
            reltype,
            name,
        )?;
        self.set_part(part_name::PACKAGE_RELS, rels_xml)?;
        Ok(())
    }

    /// Serialize the package back into zip bytes, preserving member order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for name in &self.names {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| OpcError::MalformedPackage(e.to_string()))?;
            writer.write_all(&self.parts[name])?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| OpcError::MalformedPackage(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    /// Parse the package-level relationships (`_rels/.rels`).
    pub fn package_relationships(&self) -> Result<Relationships> {
        Relationships::parse(self.blob(part_name::PACKAGE_RELS)?)
    }

    /// Parse a part's relationships, or an empty collection when the part
    /// has no `.rels` sub-part.
    pub fn part_relationships(&self, part: &str) -> Result<Relationships> {
        match self.part(&rel::rels_part_name(part)) {
            Some(xml) => Relationships::parse(xml),
            None => Ok(Relationships::default()),
        }
    }

    /// Parse `[Content_Types].xml`.
    pub fn content_types(&self) -> Result<ContentTypes> {
        ContentTypes::parse(self.blob(part_name::CONTENT_TYPES)?)
    }

    /// Resolve the main document part name and verify it is a
    /// WordprocessingML main document.
    pub fn main_document_part(&self) -> Result<String> {
        let rels = self
            .package_relationships()
            .map_err(|e| OpcError::MalformedPackage(e.to_string()))?;
        let rel = rels
            .first_of_type(relationship_type::OFFICE_DOCUMENT)
            .ok_or_else(|| {
                OpcError::MalformedPackage("no officeDocument relationship".to_string())
            })?;
        let name = rel::resolve_target("", rel.target());

        let types = self.content_types()?;
        match types.content_type_of(&name) {
            Some(ct::WML_DOCUMENT_MAIN) => Ok(name),
            other => Err(OpcError::MalformedPackage(format!(
                "main part {} has content type {:?}, expected {}",
                name,
                other,
                ct::WML_DOCUMENT_MAIN
            ))),
        }
    }
}
