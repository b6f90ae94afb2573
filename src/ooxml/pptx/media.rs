//! Pruning of images left without references.
//!
//! Removing pictures and picture fills leaves the image relationships that backed
//! them in place. Pruning drops those relationships from the rewritten parts and then
//! removes any media part that nothing in the package targets any more.

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::xml::XmlDocument;
use std::collections::HashSet;
use tracing::debug;

/// Counts of what [`prune_orphaned_media`] removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneStats {
    /// Image relationships removed from rewritten parts
    pub relationships_removed: usize,

    /// Media parts removed from the package
    pub parts_removed: usize,
}

#[inline]
fn is_image_reltype(reltype: &str) -> bool {
    reltype == rt::IMAGE || reltype == rt::HD_PHOTO
}

/// Drop unreferenced image relationships of `partnames`, then the media parts they orphaned.
///
/// A relationship counts as referenced when any attribute value in its source part
/// equals its id.
pub fn prune_orphaned_media(opc: &mut OpcPackage, partnames: &[PackURI]) -> Result<PruneStats> {
    let mut stats = PruneStats::default();
    let mut candidates: Vec<PackURI> = Vec::new();

    for partname in partnames {
        let part = opc.get_part(partname)?;
        let doc = XmlDocument::parse(part.blob())?;
        let referenced: HashSet<&str> = doc.attribute_values().collect();

        let orphaned: Vec<String> = part
            .rels()
            .iter()
            .filter(|rel| is_image_reltype(rel.reltype()) && !referenced.contains(rel.r_id()))
            .map(|rel| rel.r_id().to_string())
            .collect();
        if orphaned.is_empty() {
            continue;
        }

        let part = opc.get_part_mut(partname)?;
        for r_id in orphaned {
            if let Some(rel) = part.rels_mut().remove(&r_id) {
                debug!(part = %partname, r_id = %r_id, target = %rel.target_ref(), "removed orphaned image relationship");
                stats.relationships_removed += 1;
                if !rel.is_external()
                    && let Ok(target) = rel.target_partname()
                    && !candidates.contains(&target)
                {
                    candidates.push(target);
                }
            }
        }
    }

    for target in candidates {
        if opc.contains_part(&target) && !opc.is_relationship_target(&target) {
            opc.remove_part(&target);
            debug!(part = %target, "removed orphaned media part");
            stats.parts_removed += 1;
        }
    }

    Ok(stats)
}
