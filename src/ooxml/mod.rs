//! Office Open XML (OOXML) package handling.
//!
//! The module is organized into layers:
//!
//! 1. **OPC Layer** (`opc`): Low-level package handling (ZIP, parts, relationships)
//! 2. **XML Layer** (`xml`): Editable XML trees for individual parts
//! 3. **PresentationML** (`pptx`): Presentation structure and the transparency rewrite
//! 4. **Errors** (`error`): The error type returned by the presentation layer
pub mod error;
pub mod opc;
pub mod pptx;
pub mod xml;

pub use error::{OoxmlError, Result};
pub use opc::{OpcPackage, PackURI};
