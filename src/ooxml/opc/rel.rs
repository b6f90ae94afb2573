//! Relationship-related objects for OPC packages.
//!
//! This module provides types for managing relationships between parts in an OPC package,
//! including internal and external relationships.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use smallvec::SmallVec;

/// A single relationship from a source part to a target.
///
/// Identified by an rId. Either internal (pointing to another part) or external
/// (pointing to an external URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part URI or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    /// Create a new relationship.
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

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
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Get the absolute target partname for internal relationships.
    ///
    /// Returns an error if this is an external relationship.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "Cannot get target_partname for external relationship {}",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Collection of relationships from a single source.
///
/// Keeps the order the relationships were read in so that a rewritten `.rels`
/// part lists them the way the producer did.
#[derive(Debug)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    /// Relationships in document order
    rels: SmallVec<[Relationship; 8]>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: SmallVec::new(),
        }
    }

    /// Add a relationship to the collection.
    ///
    /// An existing relationship with the same rId is replaced in place.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) {
        let rel = Relationship::new(
            r_id,
            reltype,
            target_ref,
            self.base_uri.clone(),
            is_external,
        );
        match self.rels.iter_mut().find(|r| r.r_id == rel.r_id) {
            Some(existing) => *existing = rel,
            None => self.rels.push(rel),
        }
    }

    /// Get a relationship by its ID.
    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// Get the relationship of a specific type.
    ///
    /// Returns an error if no relationship of the type is found,
    /// or if multiple relationships of the type exist.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.rels.iter().filter(|rel| rel.reltype() == reltype);
        match (matching.next(), matching.next()) {
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "No relationship of type '{}'",
                reltype
            ))),
            (Some(rel), None) => Ok(rel),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "Multiple relationships of type '{}'",
                reltype
            ))),
        }
    }

    /// Get an iterator over all relationships.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Get the number of relationships in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Remove a relationship by its ID.
    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        let pos = self.rels.iter().position(|rel| rel.r_id == r_id)?;
        Some(self.rels.remove(pos))
    }

    /// Serialize relationships to XML format.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for rel in &self.rels {
            let target_mode = if rel.is_external() {
                r#" TargetMode="External""#
            } else {
                ""
            };

            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(rel.r_id()),
                escape_xml(rel.reltype()),
                escape_xml(rel.target_ref()),
                target_mode
            ));
        }

        xml.push_str("</Relationships>");

        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}

/// Escape XML special characters.
#[inline]
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
