//! Editable XML trees for package parts.
//!
//! Parts the engine rewrites are parsed into an [`XmlDocument`], an arena of nodes
//! addressed by [`NodeId`] handles. Handles stay valid across edits: detaching a node
//! only unlinks it from its parent, so a list of handles collected before a batch of
//! edits can still be walked afterwards.
//!
//! Text and attribute values are stored exactly as they appear in the source
//! (still escaped), so content the engine does not touch is written back unchanged.

mod parse;
mod serialize;
mod tree;

pub use tree::{Attribute, Element, NodeId, NodeKind, XmlDocument};

use crate::ooxml::error::OoxmlError;
use thiserror::Error;

/// Errors raised while reading an XML part.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Unbalanced XML: {0}")]
    Structure(String),
}

pub type Result<T> = std::result::Result<T, XmlError>;

impl From<XmlError> for OoxmlError {
    fn from(err: XmlError) -> Self {
        OoxmlError::MalformedPackage(err.to_string())
    }
}
