//! Open Packaging Conventions (OPC) implementation.
//!
//! This module provides the package layer underneath the presentation rewrite:
//!
//! - Package structure (parts, relationships)
//! - Content type management
//! - ZIP-based physical packaging
//! - Verbatim carry-through of members the relationship graph does not reach

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use error::{OpcError, Result};
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, XmlPart};
pub use pkgwriter::PackageWriter;
pub use rel::{Relationship, Relationships};
