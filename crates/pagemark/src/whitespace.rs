//! Whitespace normalization of a detached tree.
//!
//! Runs once before conversion. Whitespace runs inside text nodes become a
//! single space, a space is dropped when the text before it already ends in one
//! or when it follows a block boundary, and text nodes left empty are spliced
//! out. Comments are removed. `<pre>` subtrees (and `<code>` ones with
//! preformatted code handling) are left untouched.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::{is_block_node, is_pre_node, is_void_node};
use crate::dom::{Dom, NodeId};

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \r\n\t]+").expect("whitespace regex is valid"));

/// Collapse whitespace in `dom` in place
pub fn collapse_whitespace(dom: &mut Dom, preformatted_code: bool) {
    let root = dom.root();
    {
        let node = dom.root_node();
        if node.first_child().is_none() || is_pre_node(&node, preformatted_code) {
            return;
        }
    }

    let mut prev_text: Option<NodeId> = None;
    let mut keep_leading_ws = false;
    let mut prev: Option<NodeId> = None;
    let mut removed = 0usize;
    let mut emptied = Vec::new();
    let mut cursor = next_node(dom, prev, root, preformatted_code);

    while let Some(id) = cursor {
        if id == root {
            break;
        }
        let Some(node) = dom.get(id) else {
            break;
        };

        if node.is_text() {
            let value = node.node_value().unwrap_or("");
            let mut text = WHITESPACE_RUN.replace_all(value, " ").into_owned();

            let after_space = prev_text
                .map(|p| text_of(dom, p).ends_with(' '))
                .unwrap_or(true);
            if after_space && !keep_leading_ws && text.starts_with(' ') {
                text.remove(0);
            }

            if text.is_empty() {
                cursor = dom.detach(id);
                removed += 1;
                continue;
            }
            dom.set_text(id, text);
            prev_text = Some(id);
        } else if node.is_element() {
            if is_block_node(&node) || node.is_tag("br") {
                if let Some(p) = prev_text {
                    if trim_trailing_space(dom, p) {
                        emptied.push(p);
                    }
                }
                prev_text = None;
                keep_leading_ws = false;
            } else if is_void_node(&node) || is_pre_node(&node, preformatted_code) {
                prev_text = None;
                keep_leading_ws = true;
            } else if prev_text.is_some() {
                keep_leading_ws = false;
            }
        } else {
            cursor = dom.detach(id);
            removed += 1;
            continue;
        }

        let following = next_node(dom, prev, id, preformatted_code);
        prev = Some(id);
        cursor = following;
    }

    if let Some(p) = prev_text {
        if trim_trailing_space(dom, p) {
            emptied.push(p);
        }
    }
    // text emptied at a block boundary is only spliced out once the walk is
    // done, the walk may still be positioned next to it
    for id in emptied {
        dom.detach(id);
        removed += 1;
    }

    tracing::trace!(removed, "collapsed whitespace");
}

fn text_of(dom: &Dom, id: NodeId) -> &str {
    dom.get(id).and_then(|n| n.node_value()).unwrap_or("")
}

/// Drop one trailing space; returns whether the text is now empty
fn trim_trailing_space(dom: &mut Dom, id: NodeId) -> bool {
    let value = text_of(dom, id);
    match value.strip_suffix(' ') {
        Some(trimmed) => {
            let trimmed = trimmed.to_string();
            let empty = trimmed.is_empty();
            dom.set_text(id, trimmed);
            empty
        }
        None => value.is_empty(),
    }
}

/// Next node of the walk. Coming back up from a child, or at a whitespace
/// preserving element, the walk moves on to the next sibling or climbs to the
/// parent instead of descending.
fn next_node(
    dom: &Dom,
    prev: Option<NodeId>,
    current: NodeId,
    preformatted_code: bool,
) -> Option<NodeId> {
    let node = dom.get(current)?;
    let returning = prev
        .and_then(|p| dom.get(p))
        .and_then(|p| p.parent())
        .is_some_and(|parent| parent.id() == current);

    let next = if returning || is_pre_node(&node, preformatted_code) {
        node.next_sibling().or_else(|| node.parent())
    } else {
        node.first_child()
            .or_else(|| node.next_sibling())
            .or_else(|| node.parent())
    };
    next.map(|n| n.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn element(tag: &str, children: Vec<Node>) -> Node {
        let mut node = Node::element(tag);
        for child in children {
            node.add_child(child);
        }
        node
    }

    fn normalized(node: &Node, preformatted_code: bool) -> String {
        let mut dom = Dom::from_node(node);
        collapse_whitespace(&mut dom, preformatted_code);
        let root = dom.root();
        dom.root_node().inner_html()
    }

    #[test]
    fn test_collapses_runs_and_trims_at_block_edges() {
        let div = element(
            "div",
            vec![element("p", vec![Node::text("  Hello \n\t  world  ")])],
        );
        assert_eq!(normalized(&div, false), "<p>Hello world</p>");
    }

    #[test]
    fn test_drops_leading_space_after_space() {
        let div = element(
            "div",
            vec![
                Node::text("one "),
                element("b", vec![Node::text(" two")]),
                Node::text(" three"),
            ],
        );
        assert_eq!(normalized(&div, false), "one <b>two</b> three");
    }

    #[test]
    fn test_removes_empty_text_and_comments() {
        let div = element(
            "div",
            vec![
                element("p", vec![Node::text("a")]),
                Node::text("   \n  "),
                Node::comment("note"),
                element("p", vec![Node::text("b")]),
            ],
        );
        assert_eq!(normalized(&div, false), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_keeps_space_after_void_element() {
        let div = element(
            "div",
            vec![
                Node::text("a"),
                Node::element_with_attrs("img", vec![("src", "x.png")]),
                Node::text(" b"),
            ],
        );
        assert_eq!(normalized(&div, false), "a<img src=\"x.png\"> b");
    }

    #[test]
    fn test_leaves_pre_untouched() {
        let div = element(
            "div",
            vec![element("pre", vec![Node::text("  keep\n   this  ")])],
        );
        assert_eq!(normalized(&div, false), "<pre>  keep\n   this  </pre>");
    }

    #[test]
    fn test_preformatted_code_option() {
        let div = element(
            "div",
            vec![
                Node::text("run "),
                element("code", vec![Node::text("a   b")]),
            ],
        );
        assert_eq!(normalized(&div, false), "run <code>a b</code>");
        assert_eq!(normalized(&div, true), "run <code>a   b</code>");
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let div = element(
            "div",
            vec![
                Node::text("  lead "),
                element("em", vec![Node::text("  x  ")]),
                Node::text("\n\n"),
                element("p", vec![Node::text(" y ")]),
                Node::text(" tail "),
            ],
        );
        let mut dom = Dom::from_node(&div);
        collapse_whitespace(&mut dom, false);
        let once = dom.root_node().outer_html();
        collapse_whitespace(&mut dom, false);
        assert_eq!(dom.root_node().outer_html(), once);
    }

    #[test]
    fn test_space_emptied_at_block_boundary_is_removed() {
        let div = element(
            "div",
            vec![
                Node::element_with_attrs("img", vec![("src", "x")]),
                Node::text(" "),
                element("p", vec![Node::text("a")]),
            ],
        );
        assert_eq!(normalized(&div, false), "<img src=\"x\"><p>a</p>");
    }

    #[test]
    fn test_empty_root_is_untouched() {
        let div = Node::element("div");
        assert_eq!(normalized(&div, false), "");
    }
}
