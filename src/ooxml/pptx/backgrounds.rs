//! Slide background rewriting.
//!
//! Every master, layout and slide carries its background in `p:cSld/p:bg`. A
//! background holds either `p:bgPr` (an explicit fill plus effects) or `p:bgRef`
//! (a reference into the theme's background fill styles). Rewriting replaces
//! whichever is present with an explicit fill that is fully transparent:
//!
//! ```xml
//! <p:bg>
//!   <p:bgPr>
//!     <a:solidFill><a:srgbClr val="FFFFFF"><a:alpha val="0"/></a:srgbClr></a:solidFill>
//!     <a:effectLst/>
//!   </p:bgPr>
//! </p:bg>
//! ```
//!
//! A part without `p:bg` inherits its background from its layout or master. It is
//! left alone unless the policy asks for a transparent background to be synthesized.

use crate::config::BackgroundPolicy;
use crate::ooxml::opc::constants::namespace::{DML_MAIN, PML_MAIN};
use crate::ooxml::xml::{NodeId, XmlDocument};

/// What [`clear_background`] did to a slide-data node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundOutcome {
    /// No background was declared and none was added.
    Unchanged,
    /// An existing background was replaced.
    Replaced,
    /// A background was added where none was declared.
    Synthesized,
}

impl BackgroundOutcome {
    #[inline]
    pub fn is_changed(self) -> bool {
        self != BackgroundOutcome::Unchanged
    }
}

/// Make the background of `c_sld` fully transparent.
///
/// `c_sld` must be a `p:cSld` element. Running this twice gives the same tree as
/// running it once.
pub fn clear_background(
    doc: &mut XmlDocument,
    c_sld: NodeId,
    policy: BackgroundPolicy,
) -> BackgroundOutcome {
    match doc.find_child(c_sld, PML_MAIN, "bg") {
        Some(bg) => {
            for child in doc.children(bg).to_vec() {
                doc.detach(child);
            }
            append_transparent_bg_pr(doc, bg);
            BackgroundOutcome::Replaced
        },
        None => match policy {
            BackgroundPolicy::Inherit => BackgroundOutcome::Unchanged,
            BackgroundPolicy::Synthesize => {
                let bg = doc.new_element(c_sld, PML_MAIN, "bg", "p");
                // p:bg precedes p:spTree
                doc.insert(c_sld, 0, bg);
                append_transparent_bg_pr(doc, bg);
                BackgroundOutcome::Synthesized
            },
        },
    }
}

/// Append `p:bgPr` holding a white solid fill at alpha 0 and an empty effect list.
fn append_transparent_bg_pr(doc: &mut XmlDocument, bg: NodeId) {
    let bg_pr = append_new(doc, bg, PML_MAIN, "bgPr", "p");
    let solid_fill = append_new(doc, bg_pr, DML_MAIN, "solidFill", "a");

    let srgb_clr = append_new(doc, solid_fill, DML_MAIN, "srgbClr", "a");
    if let Some(element) = doc.element_mut(srgb_clr) {
        element.set_attr("val", "FFFFFF");
    }

    let alpha = append_new(doc, srgb_clr, DML_MAIN, "alpha", "a");
    if let Some(element) = doc.element_mut(alpha) {
        element.set_attr("val", "0");
    }

    append_new(doc, bg_pr, DML_MAIN, "effectLst", "a");
}

#[inline]
fn append_new(doc: &mut XmlDocument, parent: NodeId, ns: &str, local: &str, prefix: &str) -> NodeId {
    let id = doc.new_element(parent, ns, local, prefix);
    doc.append(parent, id);
    id
}

/// Check that `c_sld` has a background made only of the transparent fill.
pub fn is_transparent(doc: &XmlDocument, c_sld: NodeId) -> bool {
    let Some(bg) = doc.find_child(c_sld, PML_MAIN, "bg") else {
        return false;
    };
    let children: Vec<NodeId> = doc.child_elements(bg).collect();
    let [bg_pr] = children.as_slice() else {
        return false;
    };
    if !doc.is(*bg_pr, PML_MAIN, "bgPr") {
        return false;
    }

    let fills: Vec<NodeId> = doc
        .child_elements(*bg_pr)
        .filter(|&c| !doc.is(c, DML_MAIN, "effectLst") && !doc.is(c, DML_MAIN, "effectDag"))
        .collect();
    let [fill] = fills.as_slice() else {
        return false;
    };
    if !doc.is(*fill, DML_MAIN, "solidFill") {
        return false;
    }

    doc.child_elements(*fill).any(|color| {
        doc.find_children(color, DML_MAIN, "alpha")
            .any(|alpha| doc.element(alpha).and_then(|e| e.attr("val")) == Some("0"))
    })
}
