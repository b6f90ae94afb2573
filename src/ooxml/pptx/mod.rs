//! PowerPoint (.pptx) presentation support.
//!
//! This module loads presentation packages (`.pptx`, `.pptm`, `.potx`, `.potm`,
//! `.ppsx`, `.ppsm`) and rewrites them so that they render on a transparent
//! background:
//!
//! - `Package`: the package with its master/layout/slide structure
//! - `backgrounds`: replacing `p:bg` with a fully transparent fill
//! - `shapes`: removing shape fills and pictures from `p:spTree`
//! - `media`: dropping images nothing references any more
//!
//! # Example
//!
//! ```rust,no_run
//! use lucent::RewriteConfig;
//! use lucent::ooxml::pptx::Package;
//!
//! let mut package = Package::open("deck.pptx")?;
//! let report = package.make_transparent(&RewriteConfig::default())?;
//! package.save("deck-transparent.pptx")?;
//! println!("{} pictures removed", report.pictures_removed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod backgrounds;
pub mod media;
pub mod package;
pub mod parts;
pub mod shapes;
pub mod transparent;

#[cfg(test)]
#[path = "../../../tests/common/mod.rs"]
pub(crate) mod test_support;

pub use backgrounds::{BackgroundOutcome, clear_background};
pub use media::{PruneStats, prune_orphaned_media};
pub use package::{MasterRef, Package};
pub use shapes::{SanitizeStats, sanitize};
pub use transparent::{RewriteReport, make_transparent, make_transparent_bytes};
