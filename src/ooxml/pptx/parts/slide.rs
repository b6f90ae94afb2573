//! Slide, slide layout and slide master parts.
use super::collect_rids;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::Part;

/// A slide part.
///
/// Corresponds to `/ppt/slides/slideN.xml` in the package.
pub struct SlidePart<'a> {
    part: &'a dyn Part,
}

impl<'a> SlidePart<'a> {
    /// Create a SlidePart from an OPC Part.
    pub fn from_part(part: &'a dyn Part) -> Self {
        Self { part }
    }

    /// Partname of the layout this slide was created from.
    ///
    /// Every slide must carry a slide layout relationship.
    pub fn layout_partname(&self) -> Result<PackURI> {
        let rel = self.part.rels().part_with_reltype(rt::SLIDE_LAYOUT).map_err(|_| {
            OoxmlError::malformed(format!("slide {} has no layout relationship", self.part.partname()))
        })?;
        Ok(rel.target_partname()?)
    }
}

/// A slide layout part.
///
/// Corresponds to `/ppt/slideLayouts/slideLayoutN.xml` in the package.
pub struct SlideLayoutPart<'a> {
    part: &'a dyn Part,
}

impl<'a> SlideLayoutPart<'a> {
    /// Create a SlideLayoutPart from an OPC Part.
    pub fn from_part(part: &'a dyn Part) -> Self {
        Self { part }
    }

    /// Partname of the master owning this layout, when the layout links back to one.
    pub fn master_partname(&self) -> Option<PackURI> {
        self.part
            .rels()
            .part_with_reltype(rt::SLIDE_MASTER)
            .ok()
            .and_then(|rel| rel.target_partname().ok())
    }
}

/// A slide master part.
///
/// Corresponds to `/ppt/slideMasters/slideMasterN.xml` in the package.
pub struct SlideMasterPart<'a> {
    part: &'a dyn Part,
}

impl<'a> SlideMasterPart<'a> {
    /// Create a SlideMasterPart from an OPC Part.
    pub fn from_part(part: &'a dyn Part) -> Self {
        Self { part }
    }

    /// Get the relationship IDs of the layouts listed in `p:sldLayoutIdLst`, in order.
    pub fn slide_layout_rids(&self) -> Result<Vec<String>> {
        collect_rids(self.part, b"sldLayoutId")
    }
}
