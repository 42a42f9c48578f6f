/// Error types for OPC package operations.
use thiserror::Error;

/// Result type for OPC package operations.
pub type Result<T> = std::result::Result<T, OpcError>;

/// Error types for OPC package operations.
#[derive(Error, Debug)]
pub enum OpcError {
    /// The byte stream is not a valid zip/XML package
    #[error("Malformed package: {0}")]
    MalformedPackage(String),

    /// Part not found in the package
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Mutation attempted on a package opened read-only
    #[error("Package is read-only: {0}")]
    ReadOnly(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for OpcError {
    fn from(err: quick_xml::Error) -> Self {
        OpcError::Xml(err.to_string())
    }
}
