//! Shape-tree sanitizing.
//!
//! Strips every visible fill and picture from a `p:spTree`:
//!
//! - each `p:sp` with a `p:spPr` ends up with exactly one fill, `a:noFill`
//! - each `p:pic` is removed
//! - `p:grpSp` containers are kept as they are; their contents are treated like
//!   top-level drawables
//! - connectors and graphic frames keep their properties; only pictures nested
//!   inside them (such as OLE fallback images) are removed

use crate::ooxml::opc::constants::namespace::{DML_MAIN, PML_MAIN};
use crate::ooxml::xml::{NodeId, XmlDocument};
use phf::phf_set;

/// Fill elements allowed in `p:spPr` (the `EG_FillProperties` choice).
static FILL_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "noFill",
    "solidFill",
    "gradFill",
    "blipFill",
    "pattFill",
    "grpFill",
};

/// Elements of `p:spPr` that come before the fill.
static GEOMETRY_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "xfrm",
    "custGeom",
    "prstGeom",
};

/// Drawables whose fills are never touched.
static OPAQUE_DRAWABLES: phf::Set<&'static str> = phf_set! {
    "cxnSp",
    "graphicFrame",
};

/// Counts of what [`sanitize`] changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeStats {
    /// Shapes whose fill was replaced by `a:noFill`
    pub fills_replaced: usize,

    /// Pictures removed
    pub pictures_removed: usize,
}

impl SanitizeStats {
    #[inline]
    pub fn is_changed(&self) -> bool {
        self.fills_replaced > 0 || self.pictures_removed > 0
    }
}

impl std::ops::AddAssign for SanitizeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.fills_replaced += rhs.fills_replaced;
        self.pictures_removed += rhs.pictures_removed;
    }
}

/// Remove fills and pictures from every drawable under `sp_tree`, at any group depth.
///
/// The walk is a single pass over a snapshot of the tree's descendants. A node that
/// is no longer attached under `sp_tree` when its turn comes (because an ancestor
/// was removed) is skipped.
pub fn sanitize(doc: &mut XmlDocument, sp_tree: NodeId) -> SanitizeStats {
    let mut stats = SanitizeStats::default();

    for node in doc.descendants(sp_tree) {
        if !doc.is_attached_under(node, sp_tree) {
            continue;
        }

        if doc.is(node, PML_MAIN, "pic") {
            doc.detach(node);
            stats.pictures_removed += 1;
        } else if doc.is(node, PML_MAIN, "sp")
            && !inside_opaque_drawable(doc, node, sp_tree)
            && let Some(sp_pr) = doc.find_child(node, PML_MAIN, "spPr")
            && replace_fill(doc, sp_pr)
        {
            stats.fills_replaced += 1;
        }
    }

    stats
}

/// Swap whatever fill `sp_pr` has for a single `a:noFill` in schema position.
///
/// Returns `false`, leaving `sp_pr` alone, when its only fill already is `a:noFill`.
fn replace_fill(doc: &mut XmlDocument, sp_pr: NodeId) -> bool {
    let children = doc.children(sp_pr).to_vec();

    let fills: Vec<NodeId> = children.iter().copied().filter(|&c| is_fill(doc, c)).collect();
    if let [only] = fills.as_slice()
        && doc.is(*only, DML_MAIN, "noFill")
    {
        return false;
    }

    let first_fill = children.iter().position(|&c| is_fill(doc, c));
    let slot = first_fill.unwrap_or_else(|| {
        children
            .iter()
            .rposition(|&c| is_geometry(doc, c))
            .map_or(0, |i| i + 1)
    });

    for fill in fills {
        doc.detach(fill);
    }

    let no_fill = doc.new_element(sp_pr, DML_MAIN, "noFill", "a");
    doc.insert(sp_pr, slot, no_fill);
    true
}

#[inline]
fn is_fill(doc: &XmlDocument, id: NodeId) -> bool {
    doc.element(id)
        .is_some_and(|e| e.namespace.as_deref() == Some(DML_MAIN) && FILL_ELEMENTS.contains(e.local_name()))
}

#[inline]
fn is_geometry(doc: &XmlDocument, id: NodeId) -> bool {
    doc.element(id).is_some_and(|e| {
        e.namespace.as_deref() == Some(DML_MAIN) && GEOMETRY_ELEMENTS.contains(e.local_name())
    })
}

fn inside_opaque_drawable(doc: &XmlDocument, id: NodeId, sp_tree: NodeId) -> bool {
    let mut current = doc.parent(id);
    while let Some(node) = current {
        if node == sp_tree {
            return false;
        }
        if doc.element(node).is_some_and(|e| {
            e.namespace.as_deref() == Some(PML_MAIN) && OPAQUE_DRAWABLES.contains(e.local_name())
        }) {
            return true;
        }
        current = doc.parent(node);
    }
    false
}
