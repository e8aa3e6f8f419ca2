//! HTML parsing support.
//!
//! Parses an HTML string with `scraper` (html5ever) and converts it to the
//! CDP-style [`Node`] structure the converter works on.

use ego_tree::iter::Edge;
use scraper::node::Element;
use scraper::{Html, Node as ScraperNode};

use crate::node::Node;

/// Parse an HTML fragment into a document-fragment [`Node`].
///
/// The parsed top-level nodes (elements, text and comments) become the
/// children of the returned fragment.
///
/// # Example
///
/// ```rust
/// use pagemark::{parse_html, MarkdownService};
///
/// let fragment = parse_html("<h1>Hello <em>World</em></h1>");
/// assert_eq!(fragment.children().count(), 1);
///
/// let service = MarkdownService::new();
/// let markdown = service.turndown(&fragment).unwrap();
/// assert_eq!(markdown, "Hello _World_\n=============");
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);
    let root = *document.root_element();

    // elements still waiting for their closing edge, the fragment at the bottom
    let mut open = vec![Node::document_fragment()];
    for edge in root.traverse() {
        match edge {
            Edge::Open(node) | Edge::Close(node) if node.id() == root.id() => {}
            Edge::Open(node) => {
                let child = match node.value() {
                    ScraperNode::Element(element) => {
                        open.push(element_node(element));
                        continue;
                    }
                    ScraperNode::Text(text) => Node::text(text),
                    ScraperNode::Comment(comment) => Node::comment(comment),
                    _ => continue,
                };
                if let Some(parent) = open.last_mut() {
                    parent.add_child(child);
                }
            }
            Edge::Close(node) => {
                if !node.value().is_element() || open.len() < 2 {
                    continue;
                }
                if let Some(element) = open.pop() {
                    if let Some(parent) = open.last_mut() {
                        parent.add_child(element);
                    }
                }
            }
        }
    }

    open.into_iter().next().unwrap_or_else(Node::document_fragment)
}

fn element_node(element: &Element) -> Node {
    let attrs: Vec<(&str, &str)> = element.attrs().collect();
    if attrs.is_empty() {
        Node::element(element.name())
    } else {
        Node::element_with_attrs(element.name(), attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    #[test]
    fn test_parse_returns_fragment() {
        let node = parse_html("<p>Hello World</p>");
        assert_eq!(node.node_type, NodeType::DocumentFragment);
        let children: Vec<_> = node.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].tag_name(), "p");
    }

    #[test]
    fn test_parse_keeps_text_and_comments() {
        let node = parse_html("lead <!-- note --><b class=\"x\">bold</b>");
        let children: Vec<_> = node.children().collect();
        assert_eq!(children.len(), 3);
        assert!(children[0].is_text());
        assert_eq!(children[1].node_type, NodeType::Comment);
        assert_eq!(children[2].attr("class"), Some("x"));
        assert_eq!(children[2].text_content(), "bold");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_html("").children().count(), 0);
    }

    #[test]
    fn test_parse_keeps_nesting_order() {
        let node = parse_html("<ul><li>a<b>b</b></li><li>c</li></ul>tail");
        let children: Vec<_> = node.children().collect();
        assert_eq!(children.len(), 2);
        let items: Vec<_> = children[0].element_children().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text_content(), "ab");
        assert_eq!(items[1].text_content(), "c");
        assert_eq!(children[1].text_content(), "tail");
    }

    #[test]
    fn test_parse_deep_nesting() {
        let depth = 20_000;
        let html = format!("{}x{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let node = parse_html(&html);

        let mut levels = 0;
        let mut cursor = &node;
        while let Some(child) = cursor.element_children().next() {
            levels += 1;
            cursor = child;
        }
        assert_eq!(levels, depth);
        assert_eq!(node.text_content(), "x");
    }
}
