use crate::ooxml::opc::constants::namespace;

/// Handle of a node inside an [`XmlDocument`].
///
/// Handles are indices into the document's arena and are never reused, so they
/// remain valid for the lifetime of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An attribute with its raw (escaped) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name as written, e.g. `r:embed`
    pub name: String,

    /// Resolved namespace URI; unprefixed attributes have none
    pub namespace: Option<String>,

    /// Value as written between the quotes, entity references intact
    pub value: String,
}

impl Attribute {
    /// Local part of the attribute name.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Check whether this attribute declares a namespace prefix (`xmlns` or `xmlns:*`).
    pub fn is_namespace_decl(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, e.g. `p:bgPr`
    pub name: String,

    /// Resolved namespace URI
    pub namespace: Option<String>,

    /// Attributes in source order, namespace declarations included
    pub attrs: Vec<Attribute>,
}

impl Element {
    /// Local part of the element name.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Check the resolved namespace and local name.
    #[inline]
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.local_name() == local && self.namespace.as_deref() == Some(ns)
    }

    /// Raw value of an attribute by its qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an unqualified attribute. `value` must already be escaped.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                namespace: None,
                value: value.to_string(),
            }),
        }
    }
}

#[inline]
fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Kind and payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    /// Raw character data, entity and character references intact
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An XML document held as an arena of nodes.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
}

impl XmlDocument {
    /// Create an empty document holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The document node.
    #[inline]
    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// The root element, if the document has one.
    pub fn root(&self) -> Option<NodeId> {
        self.children(self.document())
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    /// Kind and payload of a node.
    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// The element stored at `id`, if it is an element.
    #[inline]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Mutable access to the element stored at `id`.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Check whether `id` is an element with the given namespace and local name.
    #[inline]
    pub fn is(&self, id: NodeId, ns: &str, local: &str) -> bool {
        self.element(id).is_some_and(|e| e.is(ns, local))
    }

    /// Children of a node, in document order.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of a node; `None` for the document node and detached nodes.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Element children of a node.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// First child element with the given namespace and local name.
    pub fn find_child(&self, parent: NodeId, ns: &str, local: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.is(c, ns, local))
    }

    /// All child elements with the given namespace and local name.
    pub fn find_children<'a>(
        &'a self,
        parent: NodeId,
        ns: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(parent)
            .iter()
            .copied()
            .filter(move |&c| self.is(c, ns, local))
    }

    /// Every descendant of `id` in document order, `id` itself excluded.
    ///
    /// The returned list is a snapshot: edits made while walking it do not change it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Check whether following parents from `id` reaches `ancestor`.
    pub fn is_attached_under(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Unlink a node from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Insert a detached node as the `index`-th child of `parent`.
    ///
    /// An index past the end appends.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Append a node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert(parent, len, child);
    }

    /// Allocate a detached node.
    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Extend a text node with more raw text.
    pub(crate) fn append_raw_text(&mut self, id: NodeId, text: &str) {
        if let NodeKind::Text(existing) = &mut self.nodes[id.0].kind {
            existing.push_str(text);
        }
    }

    /// Create a detached element in namespace `ns`, named for insertion below `context`.
    ///
    /// The prefix already bound to `ns` at `context` is reused. When none is in scope the
    /// element declares `preferred_prefix` itself.
    pub fn new_element(
        &mut self,
        context: NodeId,
        ns: &str,
        local: &str,
        preferred_prefix: &str,
    ) -> NodeId {
        let (name, attrs) = match self.lookup_prefix(context, ns) {
            Some(Some(prefix)) => (format!("{}:{}", prefix, local), Vec::new()),
            Some(None) => (local.to_string(), Vec::new()),
            None => (
                format!("{}:{}", preferred_prefix, local),
                vec![Attribute {
                    name: format!("xmlns:{}", preferred_prefix),
                    namespace: Some(namespace::XMLNS.to_string()),
                    value: ns.to_string(),
                }],
            ),
        };

        self.alloc(NodeKind::Element(Element {
            name,
            namespace: Some(ns.to_string()),
            attrs,
        }))
    }

    /// Find the prefix bound to `ns` in scope at `id`.
    ///
    /// Returns `Some(None)` when `ns` is the default namespace there, `None` when it is
    /// not bound at all.
    pub fn lookup_prefix(&self, id: NodeId, ns: &str) -> Option<Option<String>> {
        let mut shadowed: Vec<&str> = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(element) = self.element(node) {
                for attr in element.attrs.iter().filter(|a| a.is_namespace_decl()) {
                    let prefix = attr.name.strip_prefix("xmlns:").unwrap_or("");
                    if shadowed.contains(&prefix) {
                        continue;
                    }
                    if attr.value == ns {
                        return Some((!prefix.is_empty()).then(|| prefix.to_string()));
                    }
                    shadowed.push(prefix);
                }
            }
            current = self.parent(node);
        }
        None
    }

    /// Raw values of every attribute on every element reachable from the document node.
    pub fn attribute_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.descendants(self.document())
            .into_iter()
            .filter_map(|id| self.element(id))
            .flat_map(|e| e.attrs.iter().map(|a| a.value.as_str()))
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}
