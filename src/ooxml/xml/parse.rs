//! Event-driven construction of an [`XmlDocument`] from part bytes.

use super::tree::{Attribute, Element, NodeId, NodeKind, XmlDocument};
use super::{Result, XmlError};
use crate::ooxml::opc::constants::namespace;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// In-scope namespace bindings, one frame per open element.
#[derive(Default)]
struct NamespaceScope {
    frames: Vec<Vec<(String, String)>>,
}

impl NamespaceScope {
    fn push(&mut self, attrs: &[Attribute]) {
        let frame = attrs
            .iter()
            .filter(|a| a.is_namespace_decl())
            .map(|a| {
                let prefix = a.name.strip_prefix("xmlns:").unwrap_or("");
                (prefix.to_string(), a.value.clone())
            })
            .collect();
        self.frames.push(frame);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    /// Namespace bound to `prefix`; the empty prefix is the default namespace.
    fn resolve(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(namespace::XML.to_string());
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p == prefix)
            .filter(|(_, uri)| !uri.is_empty())
            .map(|(_, uri)| uri.clone())
    }
}

#[inline]
fn split_qname(qname: &str) -> (&str, &str) {
    qname.split_once(':').unwrap_or(("", qname))
}

impl XmlDocument {
    /// Parse UTF-8 XML bytes into a document.
    ///
    /// The XML declaration, processing instructions and DOCTYPE are dropped; the
    /// serializer always writes a standard declaration. Whitespace outside the root
    /// element is dropped as well.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let xml = xml.strip_prefix(UTF8_BOM).unwrap_or(xml);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut doc = XmlDocument::new();
        let mut scope = NamespaceScope::default();
        let mut open: Vec<NodeId> = vec![doc.document()];
        let mut buf = Vec::new();

        loop {
            let parent = open.last().copied().unwrap_or(doc.document());
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let id = doc.push_element(parent, e, &mut scope)?;
                    open.push(id);
                },
                Event::Empty(ref e) => {
                    doc.push_element(parent, e, &mut scope)?;
                    scope.pop();
                },
                Event::End(_) => {
                    if open.len() <= 1 {
                        return Err(XmlError::Structure("end tag without start tag".into()));
                    }
                    open.pop();
                    scope.pop();
                },
                Event::Text(ref e) => {
                    if parent != doc.document() {
                        let text = std::str::from_utf8(e)?;
                        doc.push_text(parent, text);
                    }
                },
                Event::GeneralRef(ref e) => {
                    if parent == doc.document() {
                        return Err(XmlError::Structure("reference outside the root element".into()));
                    }
                    let name = std::str::from_utf8(e)?;
                    doc.push_text(parent, &format!("&{};", name));
                },
                Event::CData(ref e) => {
                    let text = std::str::from_utf8(e)?.to_string();
                    let id = doc.alloc(NodeKind::CData(text));
                    doc.append(parent, id);
                },
                Event::Comment(ref e) => {
                    let text = std::str::from_utf8(e)?.to_string();
                    let id = doc.alloc(NodeKind::Comment(text));
                    doc.append(parent, id);
                },
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {},
                Event::Eof => break,
            }
            buf.clear();
        }

        if open.len() > 1 {
            return Err(XmlError::Structure("unclosed element at end of input".into()));
        }
        if doc.root().is_none() {
            return Err(XmlError::Structure("document has no root element".into()));
        }

        Ok(doc)
    }

    /// Append an element for `start` under `parent`, opening its namespace frame.
    fn push_element(
        &mut self,
        parent: NodeId,
        start: &BytesStart<'_>,
        scope: &mut NamespaceScope,
    ) -> Result<NodeId> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_string();

        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            attrs.push(Attribute {
                name: std::str::from_utf8(attr.key.as_ref())?.to_string(),
                namespace: None,
                value: std::str::from_utf8(&attr.value)?.to_string(),
            });
        }

        scope.push(&attrs);

        for attr in &mut attrs {
            attr.namespace = if attr.is_namespace_decl() {
                Some(namespace::XMLNS.to_string())
            } else {
                match split_qname(&attr.name) {
                    ("", _) => None,
                    (prefix, _) => scope.resolve(prefix),
                }
            };
        }
        let namespace = scope.resolve(split_qname(&name).0);

        let id = self.alloc(NodeKind::Element(Element {
            name,
            namespace,
            attrs,
        }));
        self.append(parent, id);
        Ok(id)
    }

    /// Append raw text, merging with a directly preceding text node.
    fn push_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.children(parent).last()
            && let NodeKind::Text(_) = self.kind(last)
        {
            self.append_raw_text(last, text);
            return;
        }
        let id = self.alloc(NodeKind::Text(text.to_string()));
        self.append(parent, id);
    }
}
