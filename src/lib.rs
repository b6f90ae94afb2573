//! Lucent - transparent backgrounds for PowerPoint presentations
//!
//! This library rewrites presentation packages (.pptx and its macro-enabled,
//! template and slideshow siblings) so that every slide renders on a fully
//! transparent background:
//!
//! - **Backgrounds**: every master, layout and slide background is replaced with a
//!   solid fill at alpha 0
//! - **Shape fills**: every shape fill, at any group depth, becomes `a:noFill`
//! - **Pictures**: every picture is removed from the shape trees
//! - **Everything else**: text, slide order, other parts and stray zip members are
//!   written back unchanged
//!
//! # Example - Rewriting a file
//!
//! ```no_run
//! use lucent::{RewriteConfig, make_transparent};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = make_transparent("deck.pptx", "deck-clear.pptx", &RewriteConfig::default())?;
//! println!("{} backgrounds replaced", report.backgrounds_replaced);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Rewriting in memory
//!
//! ```no_run
//! use lucent::{BackgroundPolicy, RewriteConfig, make_transparent_bytes};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("deck.pptx")?;
//! let config = RewriteConfig::default()
//!     .with_missing_background(BackgroundPolicy::Synthesize)
//!     .with_prune_orphaned_media(true);
//! let (rewritten, report) = make_transparent_bytes(&data, &config)?;
//! std::fs::write("deck-clear.pptx", rewritten)?;
//! println!("{} pictures removed", report.pictures_removed);
//! # Ok(())
//! # }
//! ```

/// Rewrite configuration loaded from YAML
pub mod config;

/// OOXML (Office Open XML) package handling
///
/// This module provides the OPC package layer, editable XML trees and the
/// PresentationML rewrite.
pub mod ooxml;

// Re-export commonly used types for convenience
pub use config::{BackgroundPolicy, ConfigError, RewriteConfig};
pub use ooxml::error::{OoxmlError, Result};
pub use ooxml::pptx::{Package, RewriteReport, make_transparent, make_transparent_bytes};
