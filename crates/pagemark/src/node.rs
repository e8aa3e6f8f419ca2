//! CDP-style DOM Node structure used as conversion input.
//!
//! The shape is that of a DevTools Protocol `DOM.Node`, so a tree captured from a
//! browser tab (or built by any HTML parser) can be handed over as is. The
//! converter never mutates a `Node`; it clones it into a
//! [`Dom`](crate::dom::Dom) arena first.

use crate::{ConvertError, Result};

/// Node types matching DOM nodeType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Comment node (nodeType = 8)
    Comment = 8,
    /// Document node (nodeType = 9)
    Document = 9,
    /// Document fragment node (nodeType = 11)
    DocumentFragment = 11,
}

impl TryFrom<u32> for NodeType {
    type Error = ConvertError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(NodeType::Element),
            3 => Ok(NodeType::Text),
            8 => Ok(NodeType::Comment),
            9 => Ok(NodeType::Document),
            11 => Ok(NodeType::DocumentFragment),
            other => Err(ConvertError::InvalidInput(format!(
                "unsupported nodeType {other}"
            ))),
        }
    }
}

impl From<NodeType> for u32 {
    fn from(value: NodeType) -> Self {
        value as u32
    }
}

/// A DOM node following the CDP DOM.Node structure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Node {
    /// Node type (1 = Element, 3 = Text, etc.)
    pub node_type: NodeType,

    /// Node name (uppercase for elements, e.g., "DIV", "#text" for text nodes)
    pub node_name: String,

    /// Text content for text and comment nodes
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub node_value: Option<String>,

    /// Attributes as flat array [name, value, name, value, ...] (CDP style)
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub attributes: Option<Vec<String>>,

    /// Child nodes
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub children: Option<Vec<Node>>,

    /// Shadow roots attached to an element host
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub shadow_roots: Option<Vec<Node>>,
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Self {
            node_type: NodeType::Element,
            node_name: tag_name.to_uppercase(),
            node_value: None,
            attributes: Some(Vec::new()),
            children: Some(Vec::new()),
            shadow_roots: None,
        }
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        let flat_attrs: Vec<String> = attrs
            .into_iter()
            .flat_map(|(k, v)| [k.to_string(), v.to_string()])
            .collect();

        let mut node = Self::element(tag_name);
        node.attributes = Some(flat_attrs);
        node
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self {
            node_type: NodeType::Text,
            node_name: "#text".to_string(),
            node_value: Some(content.to_string()),
            attributes: None,
            children: None,
            shadow_roots: None,
        }
    }

    /// Create a new comment node
    pub fn comment(content: &str) -> Self {
        Self {
            node_type: NodeType::Comment,
            node_name: "#comment".to_string(),
            node_value: Some(content.to_string()),
            attributes: None,
            children: None,
            shadow_roots: None,
        }
    }

    /// Create an empty document node
    pub fn document() -> Self {
        Self {
            node_type: NodeType::Document,
            node_name: "#document".to_string(),
            node_value: None,
            attributes: None,
            children: Some(Vec::new()),
            shadow_roots: None,
        }
    }

    /// Create a document fragment node
    pub fn document_fragment() -> Self {
        let mut node = Self::document();
        node.node_type = NodeType::DocumentFragment;
        node.node_name = "#document-fragment".to_string();
        node
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Whether this node can be handed to the converter as a root:
    /// an element, a full document or a fragment.
    pub fn is_container(&self) -> bool {
        matches!(
            self.node_type,
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment
        )
    }

    /// Get the tag name (lowercase)
    pub fn tag_name(&self) -> String {
        self.node_name.to_lowercase()
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attribute_pairs()
            .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Iterate attributes as `(name, value)` pairs
    pub fn attribute_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        // CDP stores attributes as flat array: [name, value, name, value, ...]
        self.attributes
            .iter()
            .flat_map(|attrs| attrs.chunks_exact(2))
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    /// Check if an attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Get all child nodes
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().flat_map(|c| c.iter())
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children().filter(|n| n.is_element())
    }

    /// Get the shadow roots attached to this node
    pub fn shadow_roots(&self) -> impl Iterator<Item = &Node> {
        self.shadow_roots.iter().flat_map(|c| c.iter())
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// Attach a shadow root to this node
    pub fn attach_shadow_root(&mut self, root: Node) {
        self.shadow_roots.get_or_insert_with(Vec::new).push(root);
    }

    /// Set an attribute, replacing any existing value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let attrs = self.attributes.get_or_insert_with(Vec::new);

        if let Some(pair) = attrs
            .chunks_exact_mut(2)
            .find(|pair| pair[0].eq_ignore_ascii_case(name))
        {
            pair[1] = value.to_string();
            return;
        }

        attrs.push(name.to_string());
        attrs.push(value.to_string());
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node.node_type {
                NodeType::Text => text.push_str(node.node_value.as_deref().unwrap_or("")),
                NodeType::Comment => {}
                _ => stack.extend(node.children().collect::<Vec<_>>().into_iter().rev()),
            }
        }
        text
    }
}

// Deeply nested input would otherwise overflow the stack on drop
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending: Vec<Node> = Vec::new();
        pending.extend(self.children.take().into_iter().flatten());
        pending.extend(self.shadow_roots.take().into_iter().flatten());
        while let Some(mut node) = pending.pop() {
            pending.extend(node.children.take().into_iter().flatten());
            pending.extend(node.shadow_roots.take().into_iter().flatten());
        }
    }
}
