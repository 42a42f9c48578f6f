//! Package-wide field discovery.
//!
//! Placeholder fields can appear in any story sub-part of a document
//! package, not just the main body. The locator walks the sub-parts in a
//! fixed order (main document, then headers, footers, footnotes and endnotes
//! as referenced from the main part's relationships) and extracts the fields
//! of each.

use crate::docx::field::{self, Field};
use crate::docx::parameter::SdtParameter;
use crate::error::Result;
use crate::opc::constants::relationship_type;
use crate::opc::{Package, rel};

/// Finds placeholder fields across every story sub-part of a package.
pub struct FieldLocator<'a> {
    pkg: &'a Package,
}

impl<'a> FieldLocator<'a> {
    pub fn new(pkg: &'a Package) -> Self {
        Self { pkg }
    }

    /// The sub-parts to scan, in scan order.
    ///
    /// Main document first, then header parts in relationship order, then
    /// footers, footnotes and endnotes. Relationship targets that resolve to
    /// a missing zip member are skipped.
    pub fn part_names(&self) -> Result<Vec<String>> {
        let main = self.pkg.main_document_part()?;
        let rels = self.pkg.part_relationships(&main)?;
        let base = main.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

        let mut parts = vec![main.clone()];
        for reltype in [
            relationship_type::HEADER,
            relationship_type::FOOTER,
            relationship_type::FOOTNOTES,
            relationship_type::ENDNOTES,
        ] {
            for r in rels.of_type(reltype) {
                let name = rel::resolve_target(base, r.target());
                if self.pkg.contains(&name) {
                    parts.push(name);
                }
            }
        }
        Ok(parts)
    }

    /// Iterate every placeholder field, part by part in scan order.
    ///
    /// Parts are only read and extracted as the iterator reaches them. The
    /// iterator holds no cursor state beyond its own position; calling
    /// `fields` again restarts the traversal from the package.
    pub fn fields(&self) -> Result<Fields<'a>> {
        Ok(Fields {
            pkg: self.pkg,
            parts: self.part_names()?.into_iter(),
            current: Vec::new().into_iter(),
        })
    }

    /// Extract the usable parameters: fields carrying a non-blank display
    /// name, in scan order.
    pub fn parameters(&self) -> Result<Vec<SdtParameter>> {
        let mut params = Vec::new();
        for field in self.fields()? {
            if let Some(param) = SdtParameter::from_field(field?) {
                params.push(param);
            }
        }
        Ok(params)
    }
}

/// Iterator over a package's placeholder fields, one sub-part at a time.
pub struct Fields<'a> {
    pkg: &'a Package,
    parts: std::vec::IntoIter<String>,
    current: std::vec::IntoIter<Field>,
}

impl Iterator for Fields<'_> {
    type Item = Result<Field>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(field) = self.current.next() {
                return Some(Ok(field));
            }
            let part = self.parts.next()?;
            let xml = match self.pkg.blob(&part) {
                Ok(xml) => xml,
                Err(e) => return Some(Err(e.into())),
            };
            match field::extract_fields(&part, xml) {
                Ok(fields) => self.current = fields.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::parameter::Parameter;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn docx_with_header() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
    <Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>
</Types>"#).unwrap();

        writer.start_file("_rels/.rels", options).unwrap();
        writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#).unwrap();

        writer.start_file("word/_rels/document.xml.rels", options).unwrap();
        writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>
</Relationships>"#).unwrap();

        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:body>
        <w:sdt><w:sdtPr><w:alias w:val="Body"/></w:sdtPr><w:sdtContent><w:r><w:t>b</w:t></w:r></w:sdtContent></w:sdt>
        <w:sdt><w:sdtPr><w:tag w:val="anon"/></w:sdtPr><w:sdtContent><w:r><w:t>x</w:t></w:r></w:sdtContent></w:sdt>
    </w:body>
</w:document>"#).unwrap();

        writer.start_file("word/header1.xml", options).unwrap();
        writer.write_all(br#"<?xml version="1.0"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:sdt><w:sdtPr><w:alias w:val="HeaderField"/></w:sdtPr><w:sdtContent><w:r><w:t>h</w:t></w:r></w:sdtContent></w:sdt>
</w:hdr>"#).unwrap();

        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_part_scan_order() {
        let data = docx_with_header();
        let pkg = Package::from_bytes(&data, false).unwrap();
        let locator = FieldLocator::new(&pkg);
        assert_eq!(
            locator.part_names().unwrap(),
            vec!["word/document.xml".to_string(), "word/header1.xml".to_string()]
        );
    }

    #[test]
    fn test_fields_span_sub_parts() {
        let data = docx_with_header();
        let pkg = Package::from_bytes(&data, false).unwrap();
        let locator = FieldLocator::new(&pkg);
        let fields: Vec<_> = locator.fields().unwrap().map(Result::unwrap).collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].part(), "word/document.xml");
        assert_eq!(fields[2].part(), "word/header1.xml");
    }

    #[test]
    fn test_fields_traversal_is_restartable() {
        let data = docx_with_header();
        let pkg = Package::from_bytes(&data, false).unwrap();
        let locator = FieldLocator::new(&pkg);

        // A partially consumed iterator leaves no trace; a fresh one walks
        // the whole package again.
        let mut first = locator.fields().unwrap();
        assert!(first.next().is_some());

        let names: Vec<_> = locator
            .fields()
            .unwrap()
            .map(|f| f.unwrap().name().map(str::to_string))
            .collect();
        assert_eq!(
            names,
            vec![
                Some("Body".to_string()),
                None,
                Some("HeaderField".to_string()),
            ]
        );
    }

    #[test]
    fn test_parameters_drop_unnamed_fields() {
        let data = docx_with_header();
        let pkg = Package::from_bytes(&data, false).unwrap();
        let locator = FieldLocator::new(&pkg);
        let params = locator.parameters().unwrap();
        let names: Vec<_> = params.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["Body".to_string(), "HeaderField".to_string()]);
    }
}
