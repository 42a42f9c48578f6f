/// `[Content_Types].xml` handling.
///
/// Maps part names to content types through Default (by extension) and
/// Override (by part name) entries, and supports inserting a new Override
/// without disturbing the rest of the file.
use crate::opc::error::{OpcError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Parsed view of `[Content_Types].xml`.
#[derive(Debug, Default)]
pub struct ContentTypes {
    /// Extension (lowercase, no dot) -> content type
    defaults: HashMap<String, String>,
    /// Part name with leading slash -> content type
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse the content types part.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut defaults = HashMap::new();
        let mut overrides = HashMap::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        let mut extension = None;
                        let mut content_type = None;
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).into_owned();
                            match attr.key.local_name().as_ref() {
                                b"Extension" => extension = Some(value.to_ascii_lowercase()),
                                b"ContentType" => content_type = Some(value),
                                _ => {},
                            }
                        }
                        if let (Some(ext), Some(ct)) = (extension, content_type) {
                            defaults.insert(ext, ct);
                        }
                    },
                    b"Override" => {
                        let mut part_name = None;
                        let mut content_type = None;
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).into_owned();
                            match attr.key.local_name().as_ref() {
                                b"PartName" => part_name = Some(value),
                                b"ContentType" => content_type = Some(value),
                                _ => {},
                            }
                        }
                        if let (Some(name), Some(ct)) = (part_name, content_type) {
                            overrides.insert(name, ct);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::Xml(e.to_string())),
                _ => {},
            }
        }

        Ok(Self {
            defaults,
            overrides,
        })
    }

    /// Get the content type for a part (zip member name, no leading slash).
    ///
    /// Overrides take precedence over extension Defaults.
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        let key = format!("/{}", part_name);
        if let Some(ct) = self.overrides.get(&key) {
            return Some(ct);
        }
        let extension = part_name.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults.get(&extension).map(|s| s.as_str())
    }
}

/// Insert an Override entry, preserving all other bytes.
///
/// Returns the rewritten XML, or the input unchanged when the part already
/// resolves to the requested content type.
pub fn insert_override(xml: &[u8], part_name: &str, content_type: &str) -> Result<Vec<u8>> {
    let types = ContentTypes::parse(xml)?;
    if types.content_type_of(part_name) == Some(content_type) {
        return Ok(xml.to_vec());
    }
    let element = format!(
        r#"<Override PartName="/{}" ContentType="{}"/>"#,
        part_name, content_type
    );

    let mut reader = Reader::from_reader(xml);
    loop {
        let event_start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Types" => {
                let mut out = Vec::with_capacity(xml.len() + element.len());
                out.extend_from_slice(&xml[..event_start]);
                out.extend_from_slice(element.as_bytes());
                out.extend_from_slice(&xml[event_start..]);
                return Ok(out);
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Types" => {
                let event_end = reader.buffer_position() as usize;
                let open = super::rel::reopen_empty_element(&xml[event_start..event_end]);
                let mut out = Vec::with_capacity(xml.len() + element.len() + 10);
                out.extend_from_slice(&xml[..event_start]);
                out.extend_from_slice(&open);
                out.extend_from_slice(element.as_bytes());
                out.extend_from_slice(b"</Types>");
                out.extend_from_slice(&xml[event_end..]);
                return Ok(out);
            },
            Ok(Event::Eof) => {
                return Err(OpcError::Xml(
                    "content types part has no Types element".to_string(),
                ));
            },
            Err(e) => return Err(OpcError::Xml(e.to_string())),
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::constants::content_type as ct;

    const TYPES: &[u8] = br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

    #[test]
    fn test_override_beats_default() {
        let types = ContentTypes::parse(TYPES).unwrap();
        assert_eq!(
            types.content_type_of("word/document.xml"),
            Some(ct::WML_DOCUMENT_MAIN)
        );
        assert_eq!(
            types.content_type_of("word/styles.xml"),
            Some("application/xml")
        );
        assert_eq!(types.content_type_of("word/media/image1.png"), None);
    }

    #[test]
    fn test_insert_override() {
        let out = insert_override(TYPES, "docProps/custom.xml", ct::OFC_CUSTOM_PROPERTIES).unwrap();
        let types = ContentTypes::parse(&out).unwrap();
        assert_eq!(
            types.content_type_of("docProps/custom.xml"),
            Some(ct::OFC_CUSTOM_PROPERTIES)
        );
        // Existing entries survive.
        assert_eq!(
            types.content_type_of("word/document.xml"),
            Some(ct::WML_DOCUMENT_MAIN)
        );
    }

    #[test]
    fn test_insert_override_idempotent() {
        let once = insert_override(TYPES, "docProps/custom.xml", ct::OFC_CUSTOM_PROPERTIES).unwrap();
        let twice = insert_override(&once, "docProps/custom.xml", ct::OFC_CUSTOM_PROPERTIES).unwrap();
        assert_eq!(once, twice);
    }
}
