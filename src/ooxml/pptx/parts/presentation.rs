//! Presentation part - the main part in a .pptx package.
//!
//! Corresponds to `/ppt/presentation.xml` in the package.
use super::collect_rids;
use crate::ooxml::error::Result;
use crate::ooxml::opc::part::Part;

/// The main presentation part.
///
/// This part references the slide masters and slides, in the order they appear in
/// `p:sldMasterIdLst` and `p:sldIdLst`.
///
/// # Example
///
/// ```rust,ignore
/// let pres_part = PresentationPart::from_part(opc_part);
/// for rid in pres_part.slide_rids()? {
///     let partname = opc_part.related_partname(&rid)?;
/// }
/// ```
pub struct PresentationPart<'a> {
    /// The underlying OPC part
    part: &'a dyn Part,
}

impl<'a> PresentationPart<'a> {
    /// Create a PresentationPart from an OPC Part.
    pub fn from_part(part: &'a dyn Part) -> Self {
        Self { part }
    }

    /// Get the relationship IDs of all slides in presentation order.
    pub fn slide_rids(&self) -> Result<Vec<String>> {
        collect_rids(self.part, b"sldId")
    }

    /// Get the relationship IDs of all slide masters.
    pub fn slide_master_rids(&self) -> Result<Vec<String>> {
        collect_rids(self.part, b"sldMasterId")
    }
}
