//! Low-level, read-only API to a serialized Open Packaging Convention (OPC) package.
//!
//! This module provides the PackageReader for parsing OPC packages, including
//! content type mapping, relationship resolution, and part loading. Parts are
//! discovered by walking the relationship graph from the package relationships;
//! members the graph never reaches are handed back untouched.

use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PackageMembers;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

/// Serialized part with its content and relationships.
///
/// Represents a part as loaded from the physical package, before
/// being converted into a Part object.
#[derive(Debug)]
pub struct SerializedPart {
    /// The partname (URI) of this part
    pub partname: PackURI,

    /// The content type of this part
    pub content_type: String,

    /// The relationship type that first referred to this part
    pub reltype: String,

    /// The binary content of this part
    pub blob: Vec<u8>,

    /// Serialized relationships from this part
    pub srels: SmallVec<[SerializedRelationship; 8]>,
}

/// Serialized relationship as read from a .rels file.
#[derive(Debug, Clone)]
pub struct SerializedRelationship {
    /// Base URI for resolving relative references
    pub base_uri: String,

    /// Relationship ID (e.g., "rId1")
    pub r_id: String,

    /// Relationship type URI
    pub reltype: String,

    /// Target reference (relative URI or external URL)
    pub target_ref: String,

    /// Target mode (Internal or External)
    pub target_mode: String,
}

impl SerializedRelationship {
    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_mode == target_mode::EXTERNAL
    }

    /// Get the target partname for internal relationships.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external() {
            return Err(OpcError::InvalidRelationship(
                "Cannot get target_partname for external relationship".to_string(),
            ));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Content type map for looking up content types by part name or extension.
///
/// Implements the OPC content type discovery algorithm using Default and Override
/// elements from [Content_Types].xml. Kept on the package so the writer can emit the
/// same mappings back.
#[derive(Debug, Default, Clone)]
pub struct ContentTypeMap {
    /// Maps lowercase file extensions to default content types
    defaults: BTreeMap<String, String>,

    /// Maps specific partnames to override content types
    overrides: BTreeMap<String, String>,
}

impl ContentTypeMap {
    /// Parse content types from [Content_Types].xml.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) = (
                            attr_value(e, b"Extension")?,
                            attr_value(e, b"ContentType")?,
                        ) {
                            map.add_default(ext, ct);
                        }
                    },
                    b"Override" => {
                        if let (Some(pn), Some(ct)) = (
                            attr_value(e, b"PartName")?,
                            attr_value(e, b"ContentType")?,
                        ) {
                            map.add_override(pn, ct);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Add a default content type mapping for a file extension.
    pub fn add_default(&mut self, extension: String, content_type: String) {
        self.defaults.insert(extension.to_lowercase(), content_type);
    }

    /// Add an override content type mapping for a specific partname.
    pub fn add_override(&mut self, partname: String, content_type: String) {
        self.overrides.insert(partname, content_type);
    }

    /// Drop the override for a partname, returning it if present.
    ///
    /// Matches the declared partname ASCII case-insensitively, like [`get`](Self::get).
    pub fn remove_override(&mut self, partname: &PackURI) -> Option<String> {
        let key = self
            .overrides
            .keys()
            .find(|pn| pn.eq_ignore_ascii_case(partname.as_str()))?
            .clone();
        self.overrides.remove(&key)
    }

    /// Get the content type for a partname.
    ///
    /// Checks for an override first, then falls back to the extension default.
    /// Partname comparison is ASCII case-insensitive, as OPC requires.
    pub fn get(&self, pack_uri: &PackURI) -> Result<String> {
        if let Some(ct) = self.overrides.get(pack_uri.as_str()) {
            return Ok(ct.clone());
        }
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(pn, _)| pn.eq_ignore_ascii_case(pack_uri.as_str()))
        {
            return Ok(ct.clone());
        }

        let ext = pack_uri.ext().to_lowercase();
        if let Some(ct) = self.defaults.get(&ext) {
            return Ok(ct.clone());
        }

        Err(OpcError::ContentTypeNotFound(pack_uri.to_string()))
    }

    /// Iterate over `(extension, content type)` defaults, sorted by extension.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over `(partname, content type)` overrides, sorted by partname.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Read one attribute by its raw key, unescaped.
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

/// Package reader that provides access to serialized parts and relationships.
///
/// This is the main entry point for reading OPC packages. It handles parsing
/// the package structure, resolving relationships, and loading parts.
pub struct PackageReader {
    /// Package-level relationships
    pkg_srels: SmallVec<[SerializedRelationship; 8]>,

    /// All serialized parts reachable from the package relationships
    sparts: Vec<SerializedPart>,

    /// Content type mappings as declared by the package
    content_types: ContentTypeMap,

    /// Member names in archive order
    member_order: Vec<String>,

    /// Members not consumed as parts, relationships or content types
    unreferenced: HashMap<String, Vec<u8>>,
}

impl PackageReader {
    /// Build a PackageReader from the inflated members of a package.
    ///
    /// 1. Parse [Content_Types].xml
    /// 2. Parse the package relationships
    /// 3. Walk the relationship graph, taking ownership of each reached part's bytes
    pub fn from_members(members: PackageMembers) -> Result<Self> {
        let PackageMembers { order, mut blobs } = members;

        let content_types_path = CONTENT_TYPES_URI.trim_start_matches('/');
        let content_types_xml = blobs
            .remove(content_types_path)
            .ok_or_else(|| OpcError::PartNotFound("[Content_Types].xml".to_string()))?;
        let content_types = ContentTypeMap::from_xml(&content_types_xml)?;

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let pkg_srels = Self::take_rels(&mut blobs, &package_uri)?;

        let sparts = Self::load_parts(&mut blobs, &pkg_srels, &content_types)?;

        Ok(Self {
            pkg_srels,
            sparts,
            content_types,
            member_order: order,
            unreferenced: blobs,
        })
    }

    /// Remove and parse the relationships member belonging to `source_uri`.
    fn take_rels(
        blobs: &mut HashMap<String, Vec<u8>>,
        source_uri: &PackURI,
    ) -> Result<SmallVec<[SerializedRelationship; 8]>> {
        let rels_uri = source_uri.rels_uri().map_err(OpcError::InvalidPackUri)?;

        match blobs.remove(rels_uri.membername()) {
            Some(xml) => Self::parse_rels_xml(&xml, source_uri.base_uri()),
            None => Ok(SmallVec::new()),
        }
    }

    /// Parse relationships XML into SerializedRelationship structs.
    fn parse_rels_xml(
        rels_xml: &[u8],
        base_uri: &str,
    ) -> Result<SmallVec<[SerializedRelationship; 8]>> {
        let mut srels = SmallVec::new();
        let mut reader = Reader::from_reader(rels_xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = None;
                        let mut reltype = None;
                        let mut target_ref = None;
                        let mut target_mode = target_mode::INTERNAL.to_string();

                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"Id" => r_id = Some(attr.unescape_value()?.to_string()),
                                b"Type" => reltype = Some(attr.unescape_value()?.to_string()),
                                b"Target" => target_ref = Some(attr.unescape_value()?.to_string()),
                                b"TargetMode" => target_mode = attr.unescape_value()?.to_string(),
                                _ => {},
                            }
                        }

                        match (r_id, reltype, target_ref) {
                            (Some(id), Some(rt), Some(tr)) => srels.push(SerializedRelationship {
                                base_uri: base_uri.to_string(),
                                r_id: id,
                                reltype: rt,
                                target_ref: tr,
                                target_mode,
                            }),
                            _ => {
                                return Err(OpcError::InvalidRelationship(format!(
                                    "Relationship under {} lacks Id, Type or Target",
                                    base_uri
                                )));
                            },
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("Rels parse error: {}", e))),
                _ => {},
            }
            buf.clear();
        }

        Ok(srels)
    }

    /// Load all parts reachable from the package relationships.
    ///
    /// Internal relationships whose target member is missing are logged and skipped here;
    /// the presentation layer decides which of them are required.
    fn load_parts(
        blobs: &mut HashMap<String, Vec<u8>>,
        pkg_srels: &[SerializedRelationship],
        content_types: &ContentTypeMap,
    ) -> Result<Vec<SerializedPart>> {
        let mut sparts = Vec::with_capacity(32);
        let mut visited = HashSet::with_capacity(32);
        let mut work_queue: Vec<(PackURI, String)> = Vec::with_capacity(pkg_srels.len());

        Self::enqueue_targets(pkg_srels, &mut visited, &mut work_queue);

        while let Some((partname, reltype)) = work_queue.pop() {
            let Some(blob) = blobs.remove(partname.membername()) else {
                warn!(part = %partname, reltype = %reltype, "relationship target is missing from the package");
                continue;
            };

            let part_srels = Self::take_rels(blobs, &partname)?;
            Self::enqueue_targets(&part_srels, &mut visited, &mut work_queue);

            let content_type = content_types.get(&partname)?;

            sparts.push(SerializedPart {
                partname,
                content_type,
                reltype,
                blob,
                srels: part_srels,
            });
        }

        Ok(sparts)
    }

    fn enqueue_targets(
        srels: &[SerializedRelationship],
        visited: &mut HashSet<PackURI>,
        work_queue: &mut Vec<(PackURI, String)>,
    ) {
        for srel in srels.iter().filter(|srel| !srel.is_external()) {
            match srel.target_partname() {
                Ok(partname) => {
                    if visited.insert(partname.clone()) {
                        work_queue.push((partname, srel.reltype.clone()));
                    }
                },
                Err(e) => warn!(r_id = %srel.r_id, error = %e, "skipping unresolvable relationship target"),
            }
        }
    }

    /// Consume the reader, handing back everything it loaded.
    pub fn into_parts(self) -> LoadedPackage {
        LoadedPackage {
            pkg_srels: self.pkg_srels,
            sparts: self.sparts,
            content_types: self.content_types,
            member_order: self.member_order,
            unreferenced: self.unreferenced,
        }
    }
}

/// Owned contents of a [`PackageReader`].
pub struct LoadedPackage {
    pub pkg_srels: SmallVec<[SerializedRelationship; 8]>,
    pub sparts: Vec<SerializedPart>,
    pub content_types: ContentTypeMap,
    pub member_order: Vec<String>,
    pub unreferenced: HashMap<String, Vec<u8>>,
}
