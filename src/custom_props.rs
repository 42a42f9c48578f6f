//! Custom document properties (`docProps/custom.xml`).
//!
//! Custom properties let a package carry arbitrary named metadata. This crate
//! persists parameter mappings through them, so only text (`vt:lpwstr`)
//! values are modeled. The collection is order-preserving: property order and
//! ordinal ids must survive a load/store cycle exactly, and ids are
//! reassigned sequentially starting at 2 whenever the collection is written.

use crate::error::{Result, TemplateError};
use crate::opc::Package;
use crate::opc::constants::{content_type as ct, namespace as ns, part_name, relationship_type};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

/// Fixed GUID format ID for custom properties as per the OOXML specification.
///
/// All custom properties must carry this format ID.
pub const FORMAT_ID: &str = "{D5CDD505-2E9C-101B-9397-08002B2CF9AE}";

/// A single custom property.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomProperty {
    name: String,
    value: String,
    pid: i32,
}

impl CustomProperty {
    /// Get the property name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the property value text.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the ordinal id (pid attribute).
    #[inline]
    pub fn pid(&self) -> i32 {
        self.pid
    }
}

/// Ordered collection of custom document properties.
#[derive(Debug, Clone, Default)]
pub struct CustomProperties {
    properties: Vec<CustomProperty>,
}

impl CustomProperties {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property. No de-duplication is performed; a package written
    /// by other tooling may legitimately repeat names.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>, pid: i32) {
        self.properties.push(CustomProperty {
            name: name.into(),
            value: value.into(),
            pid,
        });
    }

    /// Get the number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate properties in document order.
    pub fn iter(&self) -> impl Iterator<Item = &CustomProperty> {
        self.properties.iter()
    }

    /// Read the collection from a package.
    ///
    /// An absent custom properties part is a valid state meaning "no custom
    /// metadata", so it yields an empty collection rather than an error.
    pub fn from_package(pkg: &Package) -> Result<Self> {
        match pkg.part(part_name::CUSTOM_PROPERTIES) {
            Some(xml) => Self::from_xml(xml),
            None => Ok(Self::new()),
        }
    }

    /// Serialize the collection and commit it into the package, replacing any
    /// existing custom properties part and registering the part if new.
    pub fn write_to_package(&self, pkg: &mut Package) -> Result<()> {
        let xml = self.to_xml()?;
        pkg.add_part_with_registration(
            part_name::CUSTOM_PROPERTIES,
            ct::OFC_CUSTOM_PROPERTIES,
            relationship_type::CUSTOM_PROPERTIES,
            xml,
        )?;
        Ok(())
    }

    /// Parse custom properties from the part's XML content.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut properties = Vec::new();
        let mut current_name: Option<String> = None;
        let mut current_pid: Option<i32> = None;
        let mut in_value = false;
        let mut value = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    match e.local_name().as_ref() {
                        b"property" => {
                            for attr in e.attributes().flatten() {
                                let text = String::from_utf8_lossy(&attr.value).into_owned();
                                match attr.key.local_name().as_ref() {
                                    b"name" => current_name = Some(text),
                                    b"pid" => current_pid = text.parse::<i32>().ok(),
                                    _ => {},
                                }
                            }
                        },
                        b"Properties" => {},
                        _ if current_name.is_some() => {
                            // Value element (vt:lpwstr and friends).
                            in_value = true;
                            value.clear();
                        },
                        _ => {},
                    }
                },
                Ok(Event::Text(e)) if in_value => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|err| TemplateError::Xml(err.to_string()))?;
                    let text = quick_xml::escape::unescape(raw)
                        .map_err(|err| TemplateError::Xml(err.to_string()))?;
                    value.push_str(&text);
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"property" => {
                        if let (Some(name), Some(pid)) = (current_name.take(), current_pid.take()) {
                            properties.push(CustomProperty {
                                name,
                                value: std::mem::take(&mut value),
                                pid,
                            });
                        }
                        in_value = false;
                        value.clear();
                    },
                    b"Properties" => {},
                    _ => {
                        in_value = false;
                    },
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(TemplateError::Xml(e.to_string())),
                _ => {},
            }
        }

        Ok(Self { properties })
    }

    /// Generate the XML content for `docProps/custom.xml`.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut root = BytesStart::new("Properties");
        root.push_attribute(("xmlns", ns::CUSTOM_PROPERTIES));
        root.push_attribute(("xmlns:vt", ns::VTYPES));
        writer.write_event(Event::Start(root))?;

        for prop in &self.properties {
            let mut property = BytesStart::new("property");
            property.push_attribute(("fmtid", FORMAT_ID));
            property.push_attribute(("pid", prop.pid.to_string().as_str()));
            property.push_attribute(("name", prop.name.as_str()));
            writer.write_event(Event::Start(property))?;

            writer.write_event(Event::Start(BytesStart::new("vt:lpwstr")))?;
            writer.write_event(Event::Text(BytesText::new(&prop.value)))?;
            writer.write_event(Event::End(BytesEnd::new("vt:lpwstr")))?;

            writer.write_event(Event::End(BytesEnd::new("property")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Properties")))?;
        Ok(writer.into_inner().into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_order_and_pids() {
        let mut props = CustomProperties::new();
        props.push("TPL_Name", "IA==", 2);
        props.push("TPL_Address", "Zm9v", 3);

        let xml = props.to_xml().unwrap();
        let parsed = CustomProperties::from_xml(&xml).unwrap();

        let entries: Vec<_> = parsed
            .iter()
            .map(|p| (p.name().to_string(), p.value().to_string(), p.pid()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("TPL_Name".to_string(), "IA==".to_string(), 2),
                ("TPL_Address".to_string(), "Zm9v".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_parse_hand_written_part() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties"
            xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="2" name="TPL_Name">
        <vt:lpwstr>SGVsbG8=</vt:lpwstr>
    </property>
    <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="3" name="Unrelated">
        <vt:i4>42</vt:i4>
    </property>
</Properties>"#;
        let props = CustomProperties::from_xml(xml).unwrap();
        assert_eq!(props.len(), 2);
        let first = props.iter().next().unwrap();
        assert_eq!(first.name(), "TPL_Name");
        assert_eq!(first.value(), "SGVsbG8=");
        assert_eq!(first.pid(), 2);
    }

    #[test]
    fn test_xml_escaping_round_trip() {
        let mut props = CustomProperties::new();
        props.push("TPL_Note", "a<b & \"c\"", 2);
        let xml = props.to_xml().unwrap();
        let parsed = CustomProperties::from_xml(&xml).unwrap();
        assert_eq!(parsed.iter().next().unwrap().value(), "a<b & \"c\"");
    }

    #[test]
    fn test_empty_collection() {
        let props = CustomProperties::new();
        let xml = props.to_xml().unwrap();
        let parsed = CustomProperties::from_xml(&xml).unwrap();
        assert!(parsed.is_empty());
    }
}
