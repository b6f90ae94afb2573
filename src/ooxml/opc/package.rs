//! Objects that implement reading and writing OPC packages.
//!
//! This module provides the main OpcPackage type, which represents an Open Packaging
//! Convention package in memory. It owns every part, the package relationships, the
//! content type declarations and any member the relationship graph does not reach.

use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::{ContentTypeMap, LoadedPackage, PackageReader};
use crate::ooxml::opc::rel::Relationships;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

/// Main API class for working with OPC packages.
pub struct OpcPackage {
    /// Package-level relationships
    rels: Relationships,

    /// All parts in the package, indexed by partname
    parts: HashMap<PackURI, Box<dyn Part>>,

    /// Content types as declared by the source package
    content_types: ContentTypeMap,

    /// Member names in the order the source archive stored them
    member_order: Vec<String>,

    /// Members the relationship graph does not reach, carried through verbatim
    unreferenced: HashMap<String, Vec<u8>>,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: HashMap::new(),
            content_types: ContentTypeMap::default(),
            member_order: Vec::new(),
            unreferenced: HashMap::new(),
        }
    }

    /// Open an OPC package from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let members = PhysPkgReader::open(path)?.read_all()?;
        Self::unmarshal(PackageReader::from_members(members)?)
    }

    /// Load an OPC package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let members = PhysPkgReader::new(reader)?.read_all()?;
        Self::unmarshal(PackageReader::from_members(members)?)
    }

    /// Load an OPC package from in-memory bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let members = PhysPkgReader::from_bytes(data)?.read_all()?;
        Self::unmarshal(PackageReader::from_members(members)?)
    }

    /// Convert serialized parts and relationships into the in-memory object graph.
    fn unmarshal(pkg_reader: PackageReader) -> Result<Self> {
        let LoadedPackage {
            pkg_srels,
            sparts,
            content_types,
            member_order,
            unreferenced,
        } = pkg_reader.into_parts();

        let mut package = Self {
            content_types,
            member_order,
            unreferenced,
            ..Self::new()
        };

        for srel in pkg_srels {
            let is_external = srel.is_external();
            package
                .rels
                .add_relationship(srel.reltype, srel.target_ref, srel.r_id, is_external);
        }

        for spart in sparts {
            let mut part = PartFactory::load(spart.partname, spart.content_type, spart.blob);
            for srel in spart.srels {
                let is_external = srel.is_external();
                part.rels_mut()
                    .add_relationship(srel.reltype, srel.target_ref, srel.r_id, is_external);
            }
            package.parts.insert(part.partname().clone(), part);
        }

        Ok(package)
    }

    /// Get the partname of the main document part.
    ///
    /// For PowerPoint, this is the presentation.xml part.
    pub fn main_document_partname(&self) -> Result<PackURI> {
        self.rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()
    }

    /// Get a part by its partname.
    pub fn get_part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname)
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Get a mutable reference to a part by its partname.
    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        self.parts
            .get_mut(partname)
            .map(|b| &mut **b as &mut dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Remove a part, along with its content type override.
    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Box<dyn Part>> {
        let part = self.parts.remove(partname)?;
        self.content_types.remove_override(partname);
        Some(part)
    }

    /// Get an iterator over all parts in the package.
    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        self.parts.values().map(|b| &**b as &dyn Part)
    }

    /// Check if a part exists in the package.
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    /// Check whether any relationship in the package, at package or part level,
    /// targets `partname` internally.
    pub fn is_relationship_target(&self, partname: &PackURI) -> bool {
        std::iter::once(&self.rels)
            .chain(self.parts.values().map(|p| p.rels()))
            .flat_map(Relationships::iter)
            .filter(|rel| !rel.is_external())
            .any(|rel| rel.target_partname().is_ok_and(|target| &target == partname))
    }

    /// Get a reference to the package-level relationships.
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Get the content type declarations.
    pub fn content_types(&self) -> &ContentTypeMap {
        &self.content_types
    }

    /// Member names in source archive order.
    pub fn member_order(&self) -> &[String] {
        &self.member_order
    }

    /// Members outside the relationship graph, keyed by member name.
    pub fn unreferenced_members(&self) -> &HashMap<String, Vec<u8>> {
        &self.unreferenced
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}
