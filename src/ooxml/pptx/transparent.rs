//! Whole-presentation transparency rewrite.
//!
//! Visits every slide master, each master's layouts, then every slide, once per
//! part, and in each one clears the background and sanitizes the shape tree. Parts
//! are parsed, edited and serialized back one at a time; a part nothing changed in
//! keeps its original bytes.

use crate::config::{BackgroundPolicy, RewriteConfig};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace::PML_MAIN;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::pptx::backgrounds::{BackgroundOutcome, clear_background};
use crate::ooxml::pptx::media::prune_orphaned_media;
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::shapes::{SanitizeStats, sanitize};
use crate::ooxml::xml::XmlDocument;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Summary of one rewrite.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    /// Masters, layouts and slides visited
    pub parts_processed: usize,

    /// Existing backgrounds replaced with the transparent fill
    pub backgrounds_replaced: usize,

    /// Transparent backgrounds added to parts that had none
    pub backgrounds_synthesized: usize,

    /// Shapes whose fill was replaced with `a:noFill`
    pub fills_replaced: usize,

    /// Pictures removed from shape trees
    pub pictures_removed: usize,

    /// Image relationships dropped by media pruning
    pub media_relationships_removed: usize,

    /// Media parts dropped by media pruning
    pub media_parts_removed: usize,
}

impl RewriteReport {
    fn record(&mut self, background: BackgroundOutcome, shapes: SanitizeStats) {
        self.parts_processed += 1;
        match background {
            BackgroundOutcome::Replaced => self.backgrounds_replaced += 1,
            BackgroundOutcome::Synthesized => self.backgrounds_synthesized += 1,
            BackgroundOutcome::Unchanged => {},
        }
        self.fills_replaced += shapes.fills_replaced;
        self.pictures_removed += shapes.pictures_removed;
    }
}

impl Package {
    /// Make every background in the presentation transparent and strip fills and
    /// pictures from every shape tree.
    ///
    /// The package is edited in memory; call [`Package::save`] or
    /// [`Package::to_bytes`] to write it out.
    pub fn make_transparent(&mut self, config: &RewriteConfig) -> Result<RewriteReport> {
        let order = self.rewrite_order();
        let mut report = RewriteReport::default();

        for partname in &order {
            let (background, shapes) =
                rewrite_part(self.opc_package_mut(), partname, config.missing_background)?;
            report.record(background, shapes);
        }

        if config.prune_orphaned_media {
            let pruned = prune_orphaned_media(self.opc_package_mut(), &order)?;
            report.media_relationships_removed = pruned.relationships_removed;
            report.media_parts_removed = pruned.parts_removed;
        }

        info!(
            parts = report.parts_processed,
            backgrounds_replaced = report.backgrounds_replaced,
            backgrounds_synthesized = report.backgrounds_synthesized,
            fills_replaced = report.fills_replaced,
            pictures_removed = report.pictures_removed,
            media_parts_removed = report.media_parts_removed,
            "presentation rewritten"
        );

        Ok(report)
    }

    /// Masters, each followed by its layouts, then slides; each part once.
    fn rewrite_order(&self) -> Vec<PackURI> {
        let mut seen = HashSet::new();
        self.masters()
            .iter()
            .flat_map(|master| std::iter::once(&master.partname).chain(master.layouts.iter()))
            .chain(self.slides().iter())
            .filter(|partname| seen.insert((*partname).clone()))
            .cloned()
            .collect()
    }
}

/// Rewrite one master, layout or slide part in place.
fn rewrite_part(
    opc: &mut OpcPackage,
    partname: &PackURI,
    policy: BackgroundPolicy,
) -> Result<(BackgroundOutcome, SanitizeStats)> {
    let mut doc = XmlDocument::parse(opc.get_part(partname)?.blob())
        .map_err(|e| OoxmlError::malformed(format!("{}: {}", partname, e)))?;

    let c_sld = doc
        .root()
        .and_then(|root| doc.find_child(root, PML_MAIN, "cSld"))
        .ok_or_else(|| OoxmlError::malformed(format!("{} has no p:cSld", partname)))?;

    let background = clear_background(&mut doc, c_sld, policy);
    let shapes = match doc.find_child(c_sld, PML_MAIN, "spTree") {
        Some(sp_tree) => sanitize(&mut doc, sp_tree),
        None => SanitizeStats::default(),
    };

    if background.is_changed() || shapes.is_changed() {
        opc.get_part_mut(partname)?.set_blob(doc.to_xml())?;
    }

    debug!(
        part = %partname,
        background = ?background,
        fills_replaced = shapes.fills_replaced,
        pictures_removed = shapes.pictures_removed,
        "rewrote part"
    );

    Ok((background, shapes))
}

/// Rewrite the presentation at `input` and write the result to `output`.
///
/// `output` may be the same path as `input`. It is replaced atomically, and left
/// untouched when any step fails.
pub fn make_transparent<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &RewriteConfig,
) -> Result<RewriteReport> {
    let mut package = Package::open(input)?;
    let report = package.make_transparent(config)?;
    package.save(output)?;
    Ok(report)
}

/// Rewrite a presentation held in memory.
pub fn make_transparent_bytes(
    data: &[u8],
    config: &RewriteConfig,
) -> Result<(Vec<u8>, RewriteReport)> {
    let mut package = Package::from_bytes(data.to_vec())?;
    let report = package.make_transparent(config)?;
    Ok((package.to_bytes()?, report))
}
