//! Package implementation for PowerPoint presentations.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::{OpcPackage, PackURI, PackageWriter};
use crate::ooxml::pptx::parts::{PresentationPart, SlideLayoutPart, SlideMasterPart, SlidePart};
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;

/// A slide master and the layouts it lists, in `p:sldLayoutIdLst` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterRef {
    pub partname: PackURI,
    pub layouts: Vec<PackURI>,
}

/// A PowerPoint (.pptx) package.
///
/// This is the main entry point for working with presentations. It wraps an OPC
/// package and records the master/layout/slide structure found when it was opened,
/// after checking that every part of that structure is present and of the right kind.
///
/// # Examples
///
/// ```rust,no_run
/// use lucent::ooxml::pptx::Package;
///
/// let pkg = Package::open("presentation.pptx")?;
/// for master in pkg.masters() {
///     println!("{} has {} layouts", master.partname, master.layouts.len());
/// }
/// println!("Presentation has {} slides", pkg.slides().len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package {
    /// The underlying OPC package
    opc: OpcPackage,

    /// Partname of the main presentation part
    presentation: PackURI,

    /// Slide masters in `p:sldMasterIdLst` order
    masters: Vec<MasterRef>,

    /// Slides in `p:sldIdLst` order
    slides: Vec<PackURI>,
}

impl Package {
    /// Open a .pptx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Create a .pptx package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_opc(OpcPackage::from_reader(reader)?)
    }

    /// Create a .pptx package from in-memory bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let presentation = opc.main_document_partname()?;
        let main_part = opc.get_part(&presentation).map_err(|_| {
            OoxmlError::malformed(format!("main presentation part {} is missing", presentation))
        })?;

        let content_type = main_part.content_type();
        if !ct::PML_MAIN_TYPES.contains(&content_type) {
            return Err(OoxmlError::unsupported(
                "a presentation main part content type",
                content_type,
            ));
        }

        let pres_part = PresentationPart::from_part(main_part);

        let mut masters = Vec::new();
        for rid in pres_part.slide_master_rids()? {
            let partname = resolve_required(&opc, main_part, &rid, ct::PML_SLIDE_MASTER)?;
            let master_part = opc.get_part(&partname)?;

            let mut layouts = Vec::new();
            for layout_rid in SlideMasterPart::from_part(master_part).slide_layout_rids()? {
                let layout = resolve_required(&opc, master_part, &layout_rid, ct::PML_SLIDE_LAYOUT)?;
                let owner = SlideLayoutPart::from_part(opc.get_part(&layout)?).master_partname();
                if owner.as_ref() != Some(&partname) {
                    return Err(OoxmlError::malformed(format!(
                        "layout {} does not link back to master {}",
                        layout, partname
                    )));
                }
                layouts.push(layout);
            }
            masters.push(MasterRef { partname, layouts });
        }

        let mut slides = Vec::new();
        for rid in pres_part.slide_rids()? {
            let partname = resolve_required(&opc, main_part, &rid, ct::PML_SLIDE)?;
            let layout = SlidePart::from_part(opc.get_part(&partname)?).layout_partname()?;
            check_target(&opc, &partname, &layout, ct::PML_SLIDE_LAYOUT)?;
            slides.push(partname);
        }

        debug!(
            presentation = %presentation,
            masters = masters.len(),
            layouts = masters.iter().map(|m| m.layouts.len()).sum::<usize>(),
            slides = slides.len(),
            "loaded presentation structure"
        );

        Ok(Self {
            opc,
            presentation,
            masters,
            slides,
        })
    }

    /// Partname of the main presentation part.
    #[inline]
    pub fn presentation_partname(&self) -> &PackURI {
        &self.presentation
    }

    /// Slide masters with their layouts, in presentation order.
    #[inline]
    pub fn masters(&self) -> &[MasterRef] {
        &self.masters
    }

    /// Slides in presentation order.
    #[inline]
    pub fn slides(&self) -> &[PackURI] {
        &self.slides
    }

    /// Get mutable access to the underlying OPC package.
    #[inline]
    pub fn opc_package_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }

    /// Save the package to a file, replacing it atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        PackageWriter::write(path, &self.opc)
            .map_err(|e| OoxmlError::WriteFailure(format!("{}: {}", path.display(), e)))
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(&self.opc).map_err(|e| OoxmlError::WriteFailure(e.to_string()))
    }
}

/// Resolve `rid` on `source` to a part that must exist with content type `expected`.
fn resolve_required(
    opc: &OpcPackage,
    source: &dyn Part,
    rid: &str,
    expected: &str,
) -> Result<PackURI> {
    let partname = source.related_partname(rid)?;
    check_target(opc, source.partname(), &partname, expected)?;
    Ok(partname)
}

fn check_target(
    opc: &OpcPackage,
    source: &PackURI,
    target: &PackURI,
    expected: &str,
) -> Result<()> {
    let part = opc.get_part(target).map_err(|_| {
        OoxmlError::malformed(format!("{} references missing part {}", source, target))
    })?;
    if part.content_type() != expected {
        return Err(OoxmlError::unsupported(expected, part.content_type()));
    }
    Ok(())
}
