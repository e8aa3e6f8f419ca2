//! Detached, mutable clone of a DOM tree.
//!
//! Conversion never touches the caller's [`Node`] tree. It is copied into an
//! [`ego_tree::Tree`] where every node carries parent and sibling links, so the
//! whitespace normalizer can splice nodes out and the rules can look at
//! siblings and parents. Building, walking and serializing never recurse, so
//! nesting depth is bounded only by memory.

use std::fmt;

use ego_tree::iter::Edge as TreeEdge;
use ego_tree::Tree;

use crate::classify::is_void;
use crate::node::{Node, NodeType};

pub use ego_tree::NodeId;

#[derive(Debug, Clone)]
enum Data {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    Container(NodeType),
}

impl Data {
    fn from_node(node: &Node) -> Self {
        match node.node_type {
            NodeType::Element => Data::Element {
                name: node.node_name.to_uppercase(),
                attrs: node
                    .attribute_pairs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            NodeType::Text => Data::Text(node.node_value.clone().unwrap_or_default()),
            NodeType::Comment => Data::Comment(node.node_value.clone().unwrap_or_default()),
            other => Data::Container(other),
        }
    }
}

/// A DOM tree with a single root.
#[derive(Debug, Clone)]
pub struct Dom {
    tree: Tree<Data>,
}

impl Dom {
    /// Deep-clone `node` into a new tree. Shadow-root content is placed
    /// before the host's own children.
    pub fn from_node(node: &Node) -> Self {
        let mut tree = Tree::new(Data::from_node(node));
        let mut pending = vec![(node, tree.root().id())];

        while let Some((node, id)) = pending.pop() {
            let Some(mut parent) = tree.get_mut(id) else {
                continue;
            };
            let shadow = node.shadow_roots().flat_map(|root| root.children());
            for child in shadow.chain(node.children()) {
                let child_id = parent.append(Data::from_node(child)).id();
                pending.push((child, child_id));
            }
        }

        Self { tree }
    }

    /// Id of the root node
    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    /// Cursor on the root node
    pub fn root_node(&self) -> NodeRef<'_> {
        NodeRef {
            node: self.tree.root(),
        }
    }

    /// Borrow a read-only cursor on `id`; `None` for ids of another tree.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.tree.get(id).map(|node| NodeRef { node })
    }

    /// Unlink `id` from its parent and siblings.
    ///
    /// Returns the node where a document-order walk continues: the next sibling,
    /// otherwise the parent. Returns `None` for the root and for nodes that are
    /// already detached.
    pub fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let node = self.tree.get(id)?;
        let parent = node.parent()?.id();
        let resume = node.next_sibling().map_or(parent, |next| next.id());

        self.tree.get_mut(id)?.detach();
        Some(resume)
    }

    /// Replace the data of a text node. Other node kinds are left untouched.
    pub fn set_text(&mut self, id: NodeId, value: String) {
        if let Some(mut node) = self.tree.get_mut(id) {
            if let Data::Text(text) = node.value() {
                *text = value;
            }
        }
    }
}

/// One step of a depth-first walk: entering or leaving a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge<'a> {
    Open(NodeRef<'a>),
    Close(NodeRef<'a>),
}

/// A read-only cursor on a node of a [`Dom`].
#[derive(Clone, Copy, PartialEq)]
pub struct NodeRef<'a> {
    node: ego_tree::NodeRef<'a, Data>,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("name", &self.node_name())
            .finish()
    }
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a Data {
        self.node.value()
    }

    fn wrap(node: ego_tree::NodeRef<'a, Data>) -> Self {
        NodeRef { node }
    }

    /// The tree id of this node
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    /// The DOM node type
    pub fn node_type(&self) -> NodeType {
        match self.data() {
            Data::Element { .. } => NodeType::Element,
            Data::Text(_) => NodeType::Text,
            Data::Comment(_) => NodeType::Comment,
            Data::Container(kind) => *kind,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data(), Data::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data(), Data::Text(_))
    }

    /// Uppercase DOM node name (`"P"`, `"#text"`, ...)
    pub fn node_name(&self) -> &'a str {
        match self.data() {
            Data::Element { name, .. } => name.as_str(),
            Data::Text(_) => "#text",
            Data::Comment(_) => "#comment",
            Data::Container(NodeType::Document) => "#document",
            Data::Container(_) => "#document-fragment",
        }
    }

    /// Lowercase tag name; empty for non-element nodes
    pub fn tag_name(&self) -> String {
        match self.data() {
            Data::Element { name, .. } => name.to_lowercase(),
            _ => String::new(),
        }
    }

    /// Whether this is an element with the given (case-insensitive) tag name
    pub fn is_tag(&self, tag: &str) -> bool {
        match self.data() {
            Data::Element { name, .. } => name.eq_ignore_ascii_case(tag),
            _ => false,
        }
    }

    /// Value of a text or comment node
    pub fn node_value(&self) -> Option<&'a str> {
        match self.data() {
            Data::Text(value) | Data::Comment(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match self.data() {
            Data::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent().map(Self::wrap)
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.node.first_child().map(Self::wrap)
    }

    pub fn previous_sibling(&self) -> Option<NodeRef<'a>> {
        self.node.prev_sibling().map(Self::wrap)
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.node.next_sibling().map(Self::wrap)
    }

    /// All child nodes in document order
    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> {
        self.node.children().map(Self::wrap)
    }

    /// Only element children
    pub fn element_children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> {
        self.children().filter(|n| n.is_element())
    }

    /// The last element child
    pub fn last_element_child(&self) -> Option<NodeRef<'a>> {
        self.element_children().next_back()
    }

    /// Position of this node among its parent's element children
    pub fn element_index(&self) -> Option<usize> {
        let id = self.id();
        self.parent()?
            .element_children()
            .position(|sibling| sibling.id() == id)
    }

    /// All descendants in document order, excluding this node
    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'a>> {
        self.node.descendants().skip(1).map(Self::wrap)
    }

    /// Depth-first walk of this subtree, this node included
    pub fn traverse(&self) -> impl Iterator<Item = Edge<'a>> {
        self.node.traverse().map(|edge| match edge {
            TreeEdge::Open(node) => Edge::Open(Self::wrap(node)),
            TreeEdge::Close(node) => Edge::Close(Self::wrap(node)),
        })
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        match self.data() {
            Data::Text(value) => value.clone(),
            Data::Comment(_) => String::new(),
            _ => self
                .descendants()
                .filter_map(|n| match n.data() {
                    Data::Text(value) => Some(value.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Serialize this node and its subtree as HTML
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Serialize the children of this node as HTML
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        // children of a void element are never written
        let mut skipped: Option<NodeId> = None;

        for edge in self.node.traverse() {
            match edge {
                TreeEdge::Open(node) => {
                    if skipped.is_some() {
                        continue;
                    }
                    match node.value() {
                        Data::Text(value) => {
                            html_escape::encode_text_to_string(value, out);
                        }
                        Data::Comment(value) => {
                            out.push_str("<!--");
                            out.push_str(value);
                            out.push_str("-->");
                        }
                        Data::Element { name, attrs } => {
                            let tag = name.to_lowercase();
                            out.push('<');
                            out.push_str(&tag);
                            for (k, v) in attrs {
                                out.push(' ');
                                out.push_str(k);
                                if !v.is_empty() {
                                    out.push_str("=\"");
                                    html_escape::encode_double_quoted_attribute_to_string(v, out);
                                    out.push('"');
                                }
                            }
                            out.push('>');
                            if is_void(&tag) {
                                skipped = Some(node.id());
                            }
                        }
                        Data::Container(_) => {}
                    }
                }
                TreeEdge::Close(node) => {
                    if skipped.is_some() {
                        if skipped == Some(node.id()) {
                            skipped = None;
                        }
                        continue;
                    }
                    if let Data::Element { name, .. } = node.value() {
                        out.push_str("</");
                        out.push_str(&name.to_lowercase());
                        out.push('>');
                    }
                }
            }
        }
    }
}
