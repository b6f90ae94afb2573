//! Constant values related to the Open Packaging Convention.
//!
//! This module contains content type URIs (like MIME-types) that specify a part's format,
//! XML namespaces, and relationship types used by presentation packages.

/// Content type URIs (like MIME-types) that specify a part's format
pub mod content_type {
    // OPC core content types
    pub const OPC_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

    // PresentationML main document content types
    pub const PML_PRESENTATION_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const PML_PRES_MACRO_MAIN: &str =
        "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml";
    pub const PML_TEMPLATE_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml";
    pub const PML_TEMPLATE_MACRO_MAIN: &str =
        "application/vnd.ms-powerpoint.template.macroEnabled.main+xml";
    pub const PML_SLIDESHOW_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideshow.main+xml";
    pub const PML_SLIDESHOW_MACRO_MAIN: &str =
        "application/vnd.ms-powerpoint.slideshow.macroEnabled.main+xml";

    // PresentationML slide-like parts
    pub const PML_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const PML_SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const PML_SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";

    // Generic XML
    pub const XML: &str = "application/xml";

    /// Every main-part content type accepted as a presentation.
    pub const PML_MAIN_TYPES: [&str; 6] = [
        PML_PRESENTATION_MAIN,
        PML_PRES_MACRO_MAIN,
        PML_TEMPLATE_MAIN,
        PML_TEMPLATE_MACRO_MAIN,
        PML_SLIDESHOW_MAIN,
        PML_SLIDESHOW_MACRO_MAIN,
    ];
}

/// XML namespace URIs used in OPC packages
pub mod namespace {
    /// DrawingML main namespace (`a:`)
    pub const DML_MAIN: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

    /// PresentationML main namespace (`p:`)
    pub const PML_MAIN: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

    /// Office relationships namespace (`r:`)
    pub const OFC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// OPC relationships namespace
    pub const OPC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";

    /// OPC content types namespace
    pub const OPC_CONTENT_TYPES: &str =
        "http://schemas.openxmlformats.org/package/2006/content-types";

    /// Namespace bound to the reserved `xml` prefix
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

    /// Namespace of `xmlns` declarations themselves
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Open XML relationship target modes
pub mod target_mode {
    /// Internal relationship target mode (default)
    pub const INTERNAL: &str = "Internal";

    /// External relationship target mode (e.g., hyperlinks to external URLs)
    pub const EXTERNAL: &str = "External";
}

/// Relationship type URIs used in OPC packages
pub mod relationship_type {
    // Office document
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

    // Presentation structure
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";

    // Images
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HD_PHOTO: &str = "http://schemas.microsoft.com/office/2007/relationships/hdphoto";
}
