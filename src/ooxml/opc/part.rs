//! Open Packaging Convention (OPC) objects related to package parts.
//!
//! This module provides the Part trait with its XmlPart and BlobPart implementations.
//! Parts are the fundamental units of content in an OPC package, each with a unique
//! partname, content type, and optional relationships.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;

/// Trait representing a part in an OPC package.
pub trait Part {
    /// Get the partname of this part.
    fn partname(&self) -> &PackURI;

    /// Get the content type of this part.
    fn content_type(&self) -> &str;

    /// Get the binary content of this part.
    fn blob(&self) -> &[u8];

    /// Replace the binary content of this part.
    fn set_blob(&mut self, blob: Vec<u8>) -> Result<()>;

    /// Get the relationships for this part.
    fn rels(&self) -> &Relationships;

    /// Get mutable access to the relationships for this part.
    fn rels_mut(&mut self) -> &mut Relationships;

    /// Check whether this part holds XML content.
    fn is_xml(&self) -> bool {
        false
    }

    /// Resolve a relationship ID to the partname it targets.
    fn related_partname(&self, r_id: &str) -> Result<PackURI> {
        self.rels()
            .get(r_id)
            .ok_or_else(|| {
                OpcError::RelationshipNotFound(format!("{} in {}", r_id, self.partname()))
            })?
            .target_partname()
    }
}

/// A part holding opaque binary content (images, fonts, embedded objects).
#[derive(Debug)]
pub struct BlobPart {
    partname: PackURI,
    content_type: String,
    blob: Vec<u8>,
    rels: Relationships,
}

impl BlobPart {
    /// Create a new BlobPart.
    pub fn new(partname: PackURI, content_type: String, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            blob,
            rels,
        }
    }
}

impl Part for BlobPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> &[u8] {
        &self.blob
    }

    fn set_blob(&mut self, blob: Vec<u8>) -> Result<()> {
        self.blob = blob;
        Ok(())
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }
}

/// A part whose content type declares XML.
///
/// The bytes are kept exactly as read, whatever their encoding; only the parts the
/// rewrite edits are parsed, into an
/// [`XmlDocument`](crate::ooxml::xml::XmlDocument), which rejects non-UTF-8 input.
#[derive(Debug)]
pub struct XmlPart {
    partname: PackURI,
    content_type: String,
    xml_bytes: Vec<u8>,
    rels: Relationships,
}

impl XmlPart {
    /// Create a new XmlPart.
    pub fn new(partname: PackURI, content_type: String, xml_bytes: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            xml_bytes,
            rels,
        }
    }
}

impl Part for XmlPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> &[u8] {
        &self.xml_bytes
    }

    fn set_blob(&mut self, blob: Vec<u8>) -> Result<()> {
        std::str::from_utf8(&blob)?;
        self.xml_bytes = blob;
        Ok(())
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn is_xml(&self) -> bool {
        true
    }
}

/// Factory for creating Part instances based on content type.
pub struct PartFactory;

impl PartFactory {
    /// Wrap raw part data, selecting XmlPart or BlobPart from the content type.
    ///
    /// Content is not inspected here, so a UTF-16 metadata part loads like any other.
    pub fn load(partname: PackURI, content_type: String, blob: Vec<u8>) -> Box<dyn Part> {
        if Self::is_xml_content_type(&content_type) {
            Box::new(XmlPart::new(partname, content_type, blob))
        } else {
            Box::new(BlobPart::new(partname, content_type, blob))
        }
    }

    /// Check if a content type represents XML content.
    #[inline]
    fn is_xml_content_type(content_type: &str) -> bool {
        content_type.ends_with("+xml") || content_type.ends_with("/xml")
    }
}
