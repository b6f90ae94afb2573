//! Provides the PackURI value type and utilities for working with package URIs.
//!
//! A PackURI represents a part name within an OPC package, following the URI format
//! defined by the Open Packaging Conventions specification.

/// Represents a package URI, which is a partname within an OPC package.
///
/// PackURIs always begin with a forward slash and use forward slashes as path separators.
/// The zip member holding the part is the same string without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/ppt/slides/slide1.xml")
    uri: String,
}

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// # Returns
    /// * `Ok(PackURI)` if the URI is valid
    /// * `Err` if the URI doesn't start with a forward slash
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Create a PackURI from a relative reference and a base URI.
    ///
    /// This translates a relative reference (like "../slideLayouts/slideLayout1.xml")
    /// onto a base URI (like "/ppt/slides") to produce an absolute PackURI
    /// ("/ppt/slideLayouts/slideLayout1.xml"). Absolute references replace the base.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// Get the base URI (directory portion) of this PackURI.
    ///
    /// For example, "/ppt/slides" for "/ppt/slides/slide1.xml".
    /// For the package pseudo-partname "/", returns "/".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Get the filename portion of this PackURI.
    ///
    /// For the package pseudo-partname "/", returns an empty string.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Get the extension portion of this PackURI, without the leading period.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Get the membername (URI with leading slash stripped).
    ///
    /// Returns an empty string for the package pseudo-partname "/".
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Get the PackURI of the .rels part corresponding to this PackURI.
    ///
    /// For example, "/ppt/slides/_rels/slide1.xml.rels" for "/ppt/slides/slide1.xml"
    /// and "/_rels/.rels" for the package itself.
    pub fn rels_uri(&self) -> Result<PackURI, String> {
        let base_uri = self.base_uri();
        let rels_filename = format!("{}.rels", self.filename());
        if base_uri == "/" {
            Self::new(format!("/_rels/{}", rels_filename))
        } else {
            Self::new(format!("{}/_rels/{}", base_uri, rels_filename))
        }
    }

    /// Get the full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Resolve "." and ".." segments and collapse repeated slashes.
    fn normalize_path(path: &str) -> String {
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    segments.pop();
                },
                _ => segments.push(segment),
            }
        }
        format!("/{}", segments.join("/"))
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";
