//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! This module handles the low-level reading and writing of OPC packages as ZIP
//! archives. Reading inflates every member into memory up front so the rest of the
//! pipeline never touches the container again.

use crate::ooxml::opc::error::{OpcError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Every file member of a ZIP container, inflated, with the archive order kept.
#[derive(Debug, Default)]
pub struct PackageMembers {
    /// Member names in central-directory order
    pub order: Vec<String>,

    /// Inflated member contents keyed by member name
    pub blobs: HashMap<String, Vec<u8>>,
}

/// Physical package reader that provides access to members of a ZIP-based OPC package.
pub struct PhysPkgReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl PhysPkgReader<BufReader<File>> {
    /// Open an OPC package from a file path.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, isn't a valid ZIP file,
    /// or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }

        Self::new(BufReader::new(File::open(path)?))
    }
}

impl PhysPkgReader<Cursor<Vec<u8>>> {
    /// Create a reader over an in-memory package.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(data))
    }
}

impl<R: Read + Seek> PhysPkgReader<R> {
    /// Create a new PhysPkgReader, validating the ZIP central directory.
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Inflate every file member.
    ///
    /// Directory entries are skipped. A member name that appears twice makes the
    /// package ambiguous and is rejected.
    pub fn read_all(mut self) -> Result<PackageMembers> {
        let mut members = PackageMembers {
            order: Vec::with_capacity(self.archive.len()),
            blobs: HashMap::with_capacity(self.archive.len()),
        };

        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;

            if members.blobs.insert(name.clone(), blob).is_some() {
                return Err(OpcError::DuplicateMember(name));
            }
            members.order.push(name);
        }

        Ok(members)
    }
}

/// Physical package writer for creating OPC packages in memory.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PhysPkgWriter {
    /// Create a new package writer that writes to memory with Deflate compression.
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated),
        }
    }

    /// Write one member to the package.
    pub fn write(&mut self, membername: &str, blob: &[u8]) -> Result<()> {
        self.archive.start_file(membername, self.options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finish writing and return the package bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.archive.finish()?.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}
