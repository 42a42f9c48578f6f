//! Template parameters backed by placeholder fields.

use crate::docx::field::Field;

/// A named, writable template value.
///
/// The trait is the seam between document plumbing and callers that only
/// care about name/value pairs; the engine fills parameters through it
/// without knowing how they are stored.
pub trait Parameter {
    /// The parameter's display name.
    fn name(&self) -> &str;

    /// The current text value.
    fn value(&self) -> String;

    /// Stage a new text value. The change is applied to the document when
    /// the pending edits are committed.
    fn set_value(&mut self, value: &str);
}

/// A parameter backed by a `w:sdt` placeholder field.
pub struct SdtParameter {
    field: Field,
    name: String,
    pending: Option<String>,
}

impl SdtParameter {
    /// Wrap a field, or `None` when the field has no usable display name.
    pub(crate) fn from_field(field: Field) -> Option<Self> {
        if !field.is_valid() {
            return None;
        }
        let name = field.name()?.to_string();
        Some(Self {
            field,
            name,
            pending: None,
        })
    }

    pub(crate) fn field(&self) -> &Field {
        &self.field
    }

    /// The staged value, if `set_value` has been called.
    pub(crate) fn pending_value(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}

impl Parameter for SdtParameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> String {
        match &self.pending {
            Some(v) => v.clone(),
            None => self.field.text(),
        }
    }

    fn set_value(&mut self, value: &str) {
        self.pending = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::field::extract_fields;

    fn single_field(xml: &[u8]) -> Field {
        extract_fields("word/document.xml", xml)
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn test_named_field_becomes_parameter() {
        let field = single_field(
            br#"<w:sdt><w:sdtPr><w:alias w:val="City"/></w:sdtPr><w:sdtContent><w:r><w:t>London</w:t></w:r></w:sdtContent></w:sdt>"#,
        );
        let param = SdtParameter::from_field(field).unwrap();
        assert_eq!(param.name(), "City");
        assert_eq!(param.value(), "London");
        assert!(param.pending_value().is_none());
    }

    #[test]
    fn test_unnamed_field_is_rejected() {
        let field = single_field(
            br#"<w:sdt><w:sdtPr/><w:sdtContent><w:r><w:t>x</w:t></w:r></w:sdtContent></w:sdt>"#,
        );
        assert!(SdtParameter::from_field(field).is_none());
    }

    #[test]
    fn test_set_value_stages_an_edit() {
        let field = single_field(
            br#"<w:sdt><w:sdtPr><w:alias w:val="City"/></w:sdtPr><w:sdtContent><w:r><w:t>London</w:t></w:r></w:sdtContent></w:sdt>"#,
        );
        let mut param = SdtParameter::from_field(field).unwrap();
        param.set_value("Paris");
        assert_eq!(param.value(), "Paris");
        assert_eq!(param.pending_value(), Some("Paris"));
    }
}
