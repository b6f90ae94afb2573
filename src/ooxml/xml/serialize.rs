//! Writing an [`XmlDocument`] back to bytes.

use super::tree::{NodeId, NodeKind, XmlDocument};

/// Declaration written at the top of every serialized part.
pub const XML_DECLARATION: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

impl XmlDocument {
    /// Serialize the document, declaration first.
    ///
    /// Only nodes reachable from the document node are written. Elements without
    /// children are written in the self-closing form.
    pub fn to_xml(&self) -> Vec<u8> {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        for &child in self.children(self.document()) {
            self.write_node(child, &mut out);
        }
        out.into_bytes()
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        enum Step {
            Open(NodeId),
            Close(NodeId),
        }

        let mut stack = vec![Step::Open(id)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Open(node) => match self.kind(node) {
                    NodeKind::Element(element) => {
                        out.push('<');
                        out.push_str(&element.name);
                        for attr in &element.attrs {
                            out.push(' ');
                            out.push_str(&attr.name);
                            out.push_str("=\"");
                            push_attr_value(&attr.value, out);
                            out.push('"');
                        }
                        let children = self.children(node);
                        if children.is_empty() {
                            out.push_str("/>");
                        } else {
                            out.push('>');
                            stack.push(Step::Close(node));
                            stack.extend(children.iter().rev().map(|&c| Step::Open(c)));
                        }
                    },
                    NodeKind::Text(text) => out.push_str(text),
                    NodeKind::CData(text) => {
                        out.push_str("<![CDATA[");
                        out.push_str(text);
                        out.push_str("]]>");
                    },
                    NodeKind::Comment(text) => {
                        out.push_str("<!--");
                        out.push_str(text);
                        out.push_str("-->");
                    },
                    NodeKind::Document => {
                        stack.extend(self.children(node).iter().rev().map(|&c| Step::Open(c)));
                    },
                },
                Step::Close(node) => {
                    if let Some(element) = self.element(node) {
                        out.push_str("</");
                        out.push_str(&element.name);
                        out.push('>');
                    }
                },
            }
        }
    }
}

/// Raw values read from single-quoted attributes may hold `"`; nothing else needs escaping.
#[inline]
fn push_attr_value(raw: &str, out: &mut String) {
    if raw.contains('"') {
        out.push_str(&raw.replace('"', "&quot;"));
    } else {
        out.push_str(raw);
    }
}
