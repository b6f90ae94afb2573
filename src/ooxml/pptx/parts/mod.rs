//! Parts for PowerPoint presentation documents.
//!
//! This module contains read-only wrapper types for the XML parts the loader walks:
//! the presentation, its slide masters, their layouts and the slides.
pub mod presentation;
pub mod slide;

pub use presentation::PresentationPart;
pub use slide::{SlideLayoutPart, SlideMasterPart, SlidePart};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::part::Part;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Collect the relationship ids of every `element` in a part, in document order.
///
/// The relationship id is the prefixed `id` attribute (`r:id`); the unprefixed numeric
/// `id` these list entries also carry is ignored.
pub(crate) fn collect_rids(part: &dyn Part, element: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(part.blob());
    reader.config_mut().trim_text(true);

    let mut rids = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == element {
                    let mut found = None;
                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| {
                            OoxmlError::malformed(format!("{}: {}", part.partname(), err))
                        })?;
                        if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
                            let rid = std::str::from_utf8(&attr.value).map_err(|err| {
                                OoxmlError::malformed(format!("{}: {}", part.partname(), err))
                            })?;
                            found = Some(rid.to_string());
                            break;
                        }
                    }
                    match found {
                        Some(rid) => rids.push(rid),
                        None => {
                            return Err(OoxmlError::malformed(format!(
                                "{} entry without relationship id in {}",
                                String::from_utf8_lossy(element),
                                part.partname()
                            )));
                        },
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(OoxmlError::malformed(format!("{}: {}", part.partname(), e)));
            },
            _ => {},
        }
        buf.clear();
    }

    Ok(rids)
}
