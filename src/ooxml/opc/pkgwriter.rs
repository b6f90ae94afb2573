//! Package writer for OPC packages.
//!
//! This module serializes an in-memory package back into a ZIP container:
//! [Content_Types].xml first, then every member in the order the source archive
//! stored it, with parts and relationships re-serialized and unreferenced members
//! copied verbatim.

use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use crate::ooxml::opc::rel::escape_xml;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;

/// Package writer that serializes an OPC package to a ZIP file.
pub struct PackageWriter;

impl PackageWriter {
    /// Write an OPC package to a file.
    ///
    /// The package is serialized completely in memory, written to a temporary file
    /// next to `path` and then renamed over it, so `path` is either fully replaced or
    /// left as it was.
    pub fn write<P: AsRef<Path>>(path: P, package: &OpcPackage) -> Result<()> {
        let path = path.as_ref();
        let bytes = Self::to_bytes(package)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| OpcError::IoError(e.error))?;
        Ok(())
    }

    /// Serialize an OPC package to bytes.
    pub fn to_bytes(package: &OpcPackage) -> Result<Vec<u8>> {
        let mut members = Self::collect_members(package)?;
        let mut phys_writer = PhysPkgWriter::new();

        let content_types_xml = ContentTypesItem::from_package(package).to_xml();
        phys_writer.write(
            CONTENT_TYPES_URI.trim_start_matches('/'),
            content_types_xml.as_bytes(),
        )?;

        for name in package.member_order() {
            if let Some(blob) = members.remove(name.as_str()) {
                phys_writer.write(name, &blob)?;
            }
        }
        // Anything the source archive did not have, in a stable order.
        for (name, blob) in members {
            phys_writer.write(&name, &blob)?;
        }

        phys_writer.finish()
    }

    /// Gather every member to write, keyed by member name.
    fn collect_members(package: &OpcPackage) -> Result<BTreeMap<String, Vec<u8>>> {
        let source_members: HashSet<&str> =
            package.member_order().iter().map(String::as_str).collect();
        let mut members = BTreeMap::new();

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let pkg_rels_uri = package_uri.rels_uri().map_err(OpcError::InvalidPackUri)?;
        members.insert(
            pkg_rels_uri.membername().to_string(),
            package.rels().to_xml().into_bytes(),
        );

        for part in package.iter_parts() {
            members.insert(part.partname().membername().to_string(), part.blob().to_vec());

            let rels_uri = part
                .partname()
                .rels_uri()
                .map_err(OpcError::InvalidPackUri)?;
            if !part.rels().is_empty() || source_members.contains(rels_uri.membername()) {
                members.insert(
                    rels_uri.membername().to_string(),
                    part.rels().to_xml().into_bytes(),
                );
            }
        }

        for (name, blob) in package.unreferenced_members() {
            members.entry(name.clone()).or_insert_with(|| blob.clone());
        }

        Ok(members)
    }
}

/// Helper for building [Content_Types].xml content.
///
/// Starts from the declarations of the source package and makes sure every
/// part still present resolves to its content type.
struct ContentTypesItem {
    /// Default content types by extension
    defaults: BTreeMap<String, String>,

    /// Override content types by partname
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    /// Create a new ContentTypesItem with the standard defaults.
    fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());

        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    /// Build ContentTypesItem from an OPC package.
    fn from_package(package: &OpcPackage) -> Self {
        let mut cti = Self::new();

        for (ext, content_type) in package.content_types().defaults() {
            cti.defaults.insert(ext.to_string(), content_type.to_string());
        }
        for (partname, content_type) in package.content_types().overrides() {
            cti.overrides
                .insert(partname.to_string(), content_type.to_string());
        }
        for part in package.iter_parts() {
            cti.add_content_type(part.partname(), part.content_type());
        }

        cti
    }

    /// Add a content type for a part unless the existing declarations already cover it.
    fn add_content_type(&mut self, partname: &PackURI, content_type: &str) {
        if self
            .overrides
            .keys()
            .any(|pn| pn.eq_ignore_ascii_case(partname.as_str()))
        {
            return;
        }
        let ext = partname.ext().to_lowercase();
        if self.defaults.get(&ext).map(String::as_str) == Some(content_type) {
            return;
        }
        self.overrides
            .insert(partname.to_string(), content_type.to_string());
    }

    /// Generate the XML for [Content_Types].xml.
    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );

        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            ));
        }

        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            ));
        }

        xml.push_str("</Types>");

        xml
    }
}
