//! Error types for presentation rewriting.
use crate::ooxml::opc::error::OpcError;
use thiserror::Error;

/// Result type for presentation operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for presentation operations.
///
/// Every variant is terminal for the call that produced it. Nothing is written
/// to the destination once one of these is returned.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// The input path does not exist
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// The container or one of the parts the engine reads is broken
    #[error("Malformed package: {0}")]
    MalformedPackage(String),

    /// The package is a valid OPC package but not a presentation
    #[error("Unsupported format: expected {expected}, got {got}")]
    UnsupportedFormat { expected: String, got: String },

    /// The destination could not be written
    #[error("Write failure: {0}")]
    WriteFailure(String),
}

impl OoxmlError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        OoxmlError::MalformedPackage(msg.into())
    }

    pub(crate) fn unsupported(expected: impl Into<String>, got: impl Into<String>) -> Self {
        OoxmlError::UnsupportedFormat {
            expected: expected.into(),
            got: got.into(),
        }
    }
}

impl From<OpcError> for OoxmlError {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::PackageNotFound(path) => OoxmlError::PackageNotFound(path),
            other => OoxmlError::MalformedPackage(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::MalformedPackage(err.to_string())
    }
}
