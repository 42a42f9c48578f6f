/// Structured placeholder fields (`w:sdt` content controls).
///
/// A field is any structured document tag found in a package sub-part. It
/// carries an optional display-name annotation (`w:alias` inside `w:sdtPr`),
/// the text fragments (`w:t`) beneath it, and the "unset" placeholder marker
/// (`w:showingPlcHdr`). Only fields with a non-blank display name are usable
/// as template parameters; the rest are ignored by every caller.
use crate::error::{Result, TemplateError};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Where a placeholder sits relative to table structure.
///
/// Row-level controls (parent `w:tbl`) wrap whole rows and are not fill-in
/// fields. Cell-level controls (parent `w:tr`) are discovered by the table
/// scan and reported after the inline ones of the same part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Inline,
    Cell,
    Row,
}

/// A placeholder field located in one package sub-part.
#[derive(Debug, Clone)]
pub struct Field {
    /// Zip member name of the sub-part holding this field
    part: String,
    /// Index of this field's `w:sdt` start tag among all of them in the part
    ordinal: usize,
    /// Display-name annotation, when present
    name: Option<String>,
    /// Text content of every `w:t` beneath the field, in document order
    fragments: Vec<String>,
    /// Whether the field still shows its placeholder hint
    placeholder_marker: bool,
}

impl Field {
    /// The sub-part this field lives in.
    #[inline]
    pub fn part(&self) -> &str {
        &self.part
    }

    /// Stable index of this field's `w:sdt` start tag within its sub-part.
    ///
    /// Ordinals address fields during rewriting; every `w:sdt` start tag
    /// counts, including row-level controls that are never fields.
    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The display-name annotation, if the field carries one.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this field can act as a template parameter.
    pub fn is_valid(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty())
    }

    /// Concatenated text of every fragment, in document order.
    pub fn text(&self) -> String {
        self.fragments.concat()
    }

    /// Whether the placeholder hint marker is still present.
    #[inline]
    pub fn has_placeholder_marker(&self) -> bool {
        self.placeholder_marker
    }

    #[cfg(test)]
    pub(crate) fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

struct FieldBuilder {
    ordinal: usize,
    placement: Placement,
    name: Option<String>,
    fragments: Vec<String>,
    placeholder_marker: bool,
}

/// Extract every placeholder field from one sub-part's XML.
///
/// Inline fields come first in document order, then cell-level fields in
/// document order. Row-level controls are skipped but still consume an
/// ordinal so rewriting and extraction agree on numbering.
pub(crate) fn extract_fields(part: &str, xml: &[u8]) -> Result<Vec<Field>> {
    let mut reader = Reader::from_reader(xml);

    let mut builders: Vec<FieldBuilder> = Vec::new();
    // Indices into `builders` for every sdt currently open, innermost last.
    let mut active: Vec<usize> = Vec::new();
    // Open element names, for parent lookup when an sdt starts.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut next_ordinal = 0usize;
    // Builder whose sdtPr is currently open.
    let mut in_pr: Option<usize> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"sdt" => {
                        let placement = match stack.last().map(|n| n.as_slice()) {
                            Some(b"tr") => Placement::Cell,
                            Some(b"tbl") => Placement::Row,
                            _ => Placement::Inline,
                        };
                        builders.push(FieldBuilder {
                            ordinal: next_ordinal,
                            placement,
                            name: None,
                            fragments: Vec::new(),
                            placeholder_marker: false,
                        });
                        active.push(builders.len() - 1);
                        next_ordinal += 1;
                    },
                    b"sdtPr" => {
                        in_pr = active.last().copied();
                    },
                    b"alias" => {
                        if let Some(idx) = in_pr {
                            for attr in e.attributes().flatten() {
                                if attr.key.local_name().as_ref() == b"val" {
                                    let value = attr
                                        .unescape_value()
                                        .map_err(|err| TemplateError::Xml(err.to_string()))?;
                                    builders[idx].name = Some(value.into_owned());
                                }
                            }
                        }
                    },
                    b"showingPlcHdr" => {
                        if let Some(idx) = in_pr {
                            builders[idx].placeholder_marker = true;
                        }
                    },
                    // Only w:t is field text; m:t (math) is not.
                    b"t" if e.name().as_ref() == b"w:t" => {
                        if !active.is_empty() {
                            for idx in &active {
                                builders[*idx].fragments.push(String::new());
                            }
                            in_text = true;
                        }
                    },
                    _ => {},
                }
                stack.push(local);
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"alias" => {
                    if let Some(idx) = in_pr {
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().as_ref() == b"val" {
                                let value = attr
                                    .unescape_value()
                                    .map_err(|err| TemplateError::Xml(err.to_string()))?;
                                builders[idx].name = Some(value.into_owned());
                            }
                        }
                    }
                },
                b"showingPlcHdr" => {
                    if let Some(idx) = in_pr {
                        builders[idx].placeholder_marker = true;
                    }
                },
                b"t" if e.name().as_ref() == b"w:t" => {
                    if !active.is_empty() {
                        for idx in &active {
                            builders[*idx].fragments.push(String::new());
                        }
                    }
                },
                _ => {},
            },
            Ok(Event::Text(e)) if in_text => {
                let raw = std::str::from_utf8(e.as_ref())
                    .map_err(|err| TemplateError::Xml(err.to_string()))?;
                let text = quick_xml::escape::unescape(raw)
                    .map_err(|err| TemplateError::Xml(err.to_string()))?;
                for idx in &active {
                    if let Some(last) = builders[*idx].fragments.last_mut() {
                        last.push_str(&text);
                    }
                }
            },
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"sdt" => {
                        if let Some(idx) = active.pop() {
                            // A field with no text fragment still reads as
                            // empty, so synthesize one.
                            if builders[idx].fragments.is_empty() {
                                builders[idx].fragments.push(String::new());
                            }
                        }
                    },
                    b"sdtPr" => in_pr = None,
                    b"t" if e.name().as_ref() == b"w:t" => in_text = false,
                    _ => {},
                }
                stack.pop();
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(TemplateError::Xml(e.to_string())),
            _ => {},
        }
    }

    let mut fields: Vec<Field> = Vec::with_capacity(builders.len());
    for placement in [Placement::Inline, Placement::Cell] {
        for b in builders.iter().filter(|b| b.placement == placement) {
            fields.push(Field {
                part: part.to_string(),
                ordinal: b.ordinal,
                name: b.name.clone(),
                fragments: if b.fragments.is_empty() {
                    vec![String::new()]
                } else {
                    b.fragments.clone()
                },
                placeholder_marker: b.placeholder_marker,
            });
        }
    }
    Ok(fields)
}
