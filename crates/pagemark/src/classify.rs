//! Element classification by tag name.
//!
//! Static tag sets answer whether an element is block-level, void, or meaningful
//! even when it has no text. Both the whitespace normalizer and the rule engine
//! consult these.

use crate::dom::NodeRef;

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas",
    "center", "dd", "dir", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "html", "isindex", "li", "main", "menu",
    "nav", "noframes", "noscript", "ol", "output", "p", "pre", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements that have meaning even when blank
pub const MEANINGFUL_WHEN_BLANK: &[&str] = &[
    "a", "table", "thead", "tbody", "tfoot", "th", "td", "iframe", "script",
    "audio", "video",
];

fn in_set(tag: &str, set: &[&str]) -> bool {
    set.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    in_set(tag, BLOCK_ELEMENTS)
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    in_set(tag, VOID_ELEMENTS)
}

/// Check if a tag is meaningful when blank
pub fn is_meaningful_when_blank(tag: &str) -> bool {
    in_set(tag, MEANINGFUL_WHEN_BLANK)
}

/// Whether `node` is a block-level element
pub fn is_block_node(node: &NodeRef) -> bool {
    node.is_element() && is_block(node.node_name())
}

/// Whether `node` is a void element
pub fn is_void_node(node: &NodeRef) -> bool {
    node.is_element() && is_void(node.node_name())
}

/// Whether `node` is a whitespace-preserving container. `<pre>` always is;
/// `<code>` only when preformatted code handling is on.
pub fn is_pre_node(node: &NodeRef, preformatted_code: bool) -> bool {
    node.is_tag("pre") || (preformatted_code && node.is_tag("code"))
}

fn has_descendant_in(node: &NodeRef, set: &[&str]) -> bool {
    node.descendants()
        .any(|d| d.is_element() && in_set(d.node_name(), set))
}

/// Whether any descendant of `node` is a void element
pub fn has_void_descendant(node: &NodeRef) -> bool {
    has_descendant_in(node, VOID_ELEMENTS)
}

/// Whether any descendant of `node` is a block-level element
pub fn has_block_descendant(node: &NodeRef) -> bool {
    has_descendant_in(node, BLOCK_ELEMENTS)
}

/// Whether any descendant of `node` is meaningful when blank
pub fn has_meaningful_when_blank_descendant(node: &NodeRef) -> bool {
    has_descendant_in(node, MEANINGFUL_WHEN_BLANK)
}

/// A node is blank when it renders to nothing: no text beyond whitespace,
/// no void or meaningful-when-blank element on it or below it.
pub fn is_blank(node: &NodeRef) -> bool {
    let name = node.node_name();
    !is_void(name)
        && !is_meaningful_when_blank(name)
        && node.text_content().chars().all(is_js_whitespace)
        && !has_void_descendant(node)
        && !has_meaningful_when_blank_descendant(node)
}

/// Whitespace as matched by `\s` in browser regular expressions.
pub(crate) fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}
