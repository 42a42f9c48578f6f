/// Relationship-related objects for OPC packages.
///
/// Parses `.rels` sub-parts into an ordered relationship collection and
/// supports inserting a new relationship without disturbing the rest of the
/// file. Order matters: header and footer parts are enumerated in the order
/// their relationships appear.
use crate::opc::error::{OpcError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,
    /// Relationship type URI
    reltype: String,
    /// Target reference, relative to the source part's base directory
    target: String,
}

impl Relationship {
    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Ordered collection of relationships from a single source.
#[derive(Debug, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Parse a relationships part (`.rels` XML).
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = None;
                        let mut reltype = None;
                        let mut target = None;
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).into_owned();
                            match attr.key.local_name().as_ref() {
                                b"Id" => r_id = Some(value),
                                b"Type" => reltype = Some(value),
                                b"Target" => target = Some(value),
                                _ => {},
                            }
                        }
                        if let (Some(r_id), Some(reltype), Some(target)) = (r_id, reltype, target) {
                            rels.push(Relationship {
                                r_id,
                                reltype,
                                target,
                            });
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::Xml(e.to_string())),
                _ => {},
            }
        }

        Ok(Self { rels })
    }

    /// Get the first relationship with the given type, if any.
    pub fn first_of_type(&self, reltype: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.reltype == reltype)
    }

    /// Iterate relationships of the given type in file order.
    pub fn of_type<'a>(&'a self, reltype: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.rels.iter().filter(move |r| r.reltype == reltype)
    }

    /// Check whether any relationship of the given type exists.
    pub fn contains_type(&self, reltype: &str) -> bool {
        self.first_of_type(reltype).is_some()
    }

    /// Get the number of relationships.
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Find the next unused "rIdN" identifier.
    pub fn next_r_id(&self) -> String {
        let mut n = self.rels.len() as u32 + 1;
        loop {
            let candidate = format!("rId{}", n);
            if !self.rels.iter().any(|r| r.r_id == candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Resolve a relationship target against the source part's base directory.
///
/// Targets starting with `/` are package-absolute; everything else is
/// relative to the directory of the source part.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if base_dir.is_empty() {
        target.to_string()
    } else {
        format!("{}/{}", base_dir, target)
    }
}

/// The `.rels` part name for a given part (`word/document.xml` ->
/// `word/_rels/document.xml.rels`).
pub fn rels_part_name(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}

/// Insert a relationship into a `.rels` part, preserving all other bytes.
///
/// Returns the rewritten XML, or the input unchanged when a relationship of
/// the given type and target already exists.
pub fn insert_relationship(xml: &[u8], reltype: &str, target: &str) -> Result<Vec<u8>> {
    let rels = Relationships::parse(xml)?;
    if rels
        .of_type(reltype)
        .any(|r| r.target() == target)
    {
        return Ok(xml.to_vec());
    }
    let r_id = rels.next_r_id();
    let element = format!(
        r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
        r_id, reltype, target
    );

    let mut reader = Reader::from_reader(xml);
    loop {
        let event_start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Relationships" => {
                let mut out = Vec::with_capacity(xml.len() + element.len());
                out.extend_from_slice(&xml[..event_start]);
                out.extend_from_slice(element.as_bytes());
                out.extend_from_slice(&xml[event_start..]);
                return Ok(out);
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Relationships" => {
                // `<Relationships .../>` with no children: reopen the element.
                let event_end = reader.buffer_position() as usize;
                let span = &xml[event_start..event_end];
                let open = reopen_empty_element(span);
                let mut out = Vec::with_capacity(xml.len() + element.len() + 20);
                out.extend_from_slice(&xml[..event_start]);
                out.extend_from_slice(&open);
                out.extend_from_slice(element.as_bytes());
                out.extend_from_slice(b"</Relationships>");
                out.extend_from_slice(&xml[event_end..]);
                return Ok(out);
            },
            Ok(Event::Eof) => {
                return Err(OpcError::Xml(
                    "relationships part has no Relationships element".to_string(),
                ));
            },
            Err(e) => return Err(OpcError::Xml(e.to_string())),
            _ => {},
        }
    }
}

/// Turn the raw bytes of a self-closing element into an opening tag.
pub(crate) fn reopen_empty_element(span: &[u8]) -> Vec<u8> {
    let mut open = span.to_vec();
    while open.ends_with(b">") || open.ends_with(b"/") || open.ends_with(b" ") {
        open.pop();
    }
    open.push(b'>');
    open
}
