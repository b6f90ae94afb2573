//! Errors raised while reading or writing the OPC container of a presentation.

use thiserror::Error;

/// Failure in the package layer: the zip container, `[Content_Types].xml`, or
/// the relationship graph.
#[derive(Error, Debug)]
pub enum OpcError {
    /// The package file does not exist
    #[error("package file not found: {0}")]
    PackageNotFound(String),

    /// A part name or relationship target is not a valid pack URI
    #[error("invalid part name: {0}")]
    InvalidPackUri(String),

    /// A part looked up by name is not in the package
    #[error("no part named {0}")]
    PartNotFound(String),

    /// The zip directory lists the same member twice
    #[error("member stored twice in archive: {0}")]
    DuplicateMember(String),

    /// A relationship id is not declared by its source part
    #[error("no relationship with id {0}")]
    RelationshipNotFound(String),

    /// Neither a Default nor an Override entry covers a part
    #[error("no content type declared for {0}")]
    ContentTypeNotFound(String),

    /// A relationship entry is missing a required attribute or has a bad target
    #[error("bad relationship entry: {0}")]
    InvalidRelationship(String),

    /// `[Content_Types].xml` or a `.rels` member is not usable XML
    #[error("bad package XML: {0}")]
    XmlError(String),

    #[error("zip container: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("I/O: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML syntax: {0}")]
    QuickXmlError(#[from] quick_xml::Error),

    #[error("invalid UTF-8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("bad XML attribute: {0}")]
    AttrError(String),
}

impl From<quick_xml::events::attributes::AttrError> for OpcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OpcError::AttrError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
