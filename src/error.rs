/// Error types for template operations.
use thiserror::Error;

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Error types for template operations.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] crate::opc::OpcError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for TemplateError {
    fn from(err: quick_xml::Error) -> Self {
        TemplateError::Xml(err.to_string())
    }
}
