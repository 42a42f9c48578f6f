//! In-place rewriting of placeholder field content.
//!
//! Rewriting works on the raw part bytes: every event span that is not part
//! of an edit is copied through verbatim, so formatting, namespaces and
//! untouched content survive byte-for-byte. Edits are addressed by the field
//! ordinal assigned during extraction, which counts every `w:sdt` start tag
//! in the part the same way extraction does.
//!
//! For each edited field the pass removes the `w:showingPlcHdr` marker from
//! its properties, writes the new value into the first `w:t` beneath the
//! field and empties every other `w:t`. A field with no `w:t` at all keeps
//! its content but still loses the marker.

use crate::docx::parameter::SdtParameter;
use crate::error::{Result, TemplateError};
use crate::opc::Package;
use crate::opc::rel::reopen_empty_element;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;

struct SdtCtx<'v> {
    /// Replacement value when this field is being edited
    edit: Option<&'v str>,
    /// Whether the value has been written into a `w:t` yet
    wrote: bool,
}

/// Apply staged parameter edits to their parts and commit the rewritten
/// parts back into the package.
pub fn apply_parameters(pkg: &mut Package, params: &[SdtParameter]) -> Result<()> {
    let mut by_part: BTreeMap<String, BTreeMap<usize, String>> = BTreeMap::new();
    for param in params {
        if let Some(value) = param.pending_value() {
            by_part
                .entry(param.field().part().to_string())
                .or_default()
                .insert(param.field().ordinal(), value.to_string());
        }
    }

    for (part, edits) in &by_part {
        let xml = pkg.blob(part)?.to_vec();
        let rewritten = apply_edits(&xml, edits)?;
        pkg.set_part(part, rewritten)?;
    }
    Ok(())
}

/// Rewrite one part, replacing the content of the fields named by `edits`
/// (field ordinal -> new value).
pub(crate) fn apply_edits(xml: &[u8], edits: &BTreeMap<usize, String>) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut out = Vec::with_capacity(xml.len());

    let mut stack: Vec<SdtCtx> = Vec::new();
    let mut next_ordinal = 0usize;
    let mut depth = 0usize;
    // Depth at which a skipped subtree (a dropped marker) was opened.
    let mut skip_until: Option<usize> = None;
    // Whether the current sdtPr belongs to an edited field.
    let mut pr_edited = false;
    // Inside a w:t whose original text must not be copied through.
    let mut suppress_text = false;

    loop {
        let event_start = reader.buffer_position() as usize;
        let event = reader.read_event();
        let event_end = reader.buffer_position() as usize;
        let span = &xml[event_start..event_end];

        match event {
            Ok(Event::Start(e)) => {
                depth += 1;
                if skip_until.is_some() {
                    continue;
                }
                match e.local_name().as_ref() {
                    b"sdt" => {
                        let edit = edits.get(&next_ordinal).map(String::as_str);
                        next_ordinal += 1;
                        stack.push(SdtCtx { edit, wrote: false });
                        out.extend_from_slice(span);
                    },
                    b"sdtPr" => {
                        pr_edited = stack.last().is_some_and(|c| c.edit.is_some());
                        out.extend_from_slice(span);
                    },
                    b"showingPlcHdr" if pr_edited => {
                        skip_until = Some(depth - 1);
                    },
                    // Only w:t holds field text; m:t (math) passes through.
                    b"t" if e.name().as_ref() == b"w:t" => {
                        out.extend_from_slice(span);
                        if let Some(ctx) = stack.iter_mut().rev().find(|c| c.edit.is_some()) {
                            if !ctx.wrote {
                                if let Some(value) = ctx.edit {
                                    out.extend_from_slice(
                                        quick_xml::escape::escape(value).as_bytes(),
                                    );
                                }
                                ctx.wrote = true;
                            }
                            suppress_text = true;
                        }
                    },
                    _ => out.extend_from_slice(span),
                }
            },
            Ok(Event::Empty(e)) => {
                if skip_until.is_some() {
                    continue;
                }
                match e.local_name().as_ref() {
                    b"showingPlcHdr" if pr_edited => {},
                    b"t" if e.name().as_ref() == b"w:t" => {
                        match stack.iter_mut().rev().find(|c| c.edit.is_some()) {
                            Some(ctx) if !ctx.wrote => {
                                // Turn `<w:t/>` into `<w:t>value</w:t>`.
                                out.extend_from_slice(&reopen_empty_element(span));
                                if let Some(value) = ctx.edit {
                                    out.extend_from_slice(
                                        quick_xml::escape::escape(value).as_bytes(),
                                    );
                                }
                                ctx.wrote = true;
                                out.extend_from_slice(b"</");
                                out.extend_from_slice(e.name().as_ref());
                                out.push(b'>');
                            },
                            _ => out.extend_from_slice(span),
                        }
                    },
                    _ => out.extend_from_slice(span),
                }
            },
            Ok(Event::Text(_)) => {
                if skip_until.is_none() && !suppress_text {
                    out.extend_from_slice(span);
                }
            },
            Ok(Event::End(e)) => {
                depth -= 1;
                if let Some(limit) = skip_until {
                    if depth == limit {
                        skip_until = None;
                    }
                    continue;
                }
                match e.local_name().as_ref() {
                    b"sdt" => {
                        stack.pop();
                    },
                    b"sdtPr" => pr_edited = false,
                    b"t" if e.name().as_ref() == b"w:t" => suppress_text = false,
                    _ => {},
                }
                out.extend_from_slice(span);
            },
            Ok(Event::Eof) => break,
            Ok(_) => {
                if skip_until.is_none() {
                    out.extend_from_slice(span);
                }
            },
            Err(e) => return Err(TemplateError::Xml(e.to_string())),
        }
    }

    Ok(out)
}
