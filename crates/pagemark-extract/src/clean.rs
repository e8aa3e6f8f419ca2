//! Page chrome removal and main content selection.
//!
//! Works on a parsed copy of the page:
//! 1. Every element matching a strip selector is marked for removal
//! 2. The first `<article>`, `<main>` or `[role="main"]` outside a removed
//!    subtree is the content container, falling back to `<body>`
//! 3. The container's inner HTML is serialized without removed subtrees and
//!    without password inputs
//! 4. Whitespace runs are squeezed to one space

use std::collections::HashSet;

use ego_tree::iter::Edge;
use ego_tree::NodeId;
use once_cell::sync::Lazy;
use pagemark::classify::is_void;
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};

use crate::{ExtractError, Result};

/// Elements that never carry readable page content
pub const DEFAULT_STRIP_SELECTORS: &[&str] = &[
    "script", "style", "link", "svg", "iframe", "nav", "header", "footer", "aside",
];

static CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "main", "[role=\"main\"]"]
        .iter()
        .map(|s| Selector::parse(s).expect("container selector is valid"))
        .collect()
});

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("body selector is valid"));

static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("whitespace regex is valid"));

/// Strips page chrome from full-page HTML and returns the main content as HTML
#[derive(Debug)]
pub struct PageCleaner {
    strip: Vec<Selector>,
}

impl PageCleaner {
    /// Build a cleaner from CSS selectors. Fails with
    /// [`ExtractError::InvalidSelector`] on the first selector that does not parse.
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Result<Self> {
        let strip = selectors
            .iter()
            .map(|s| {
                let s = s.as_ref();
                Selector::parse(s).map_err(|e| ExtractError::InvalidSelector(format!("{s}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { strip })
    }

    /// Clean a full page and return the inner HTML of its content container
    pub fn clean(&self, html: &str) -> String {
        let document = Html::parse_document(html);

        let mut removed: HashSet<NodeId> = HashSet::new();
        for selector in &self.strip {
            removed.extend(document.select(selector).map(|el| el.id()));
        }

        let is_removed = |el: &ElementRef| {
            removed.contains(&el.id()) || el.ancestors().any(|a| removed.contains(&a.id()))
        };

        let container = CONTAINER_SELECTORS
            .iter()
            .find_map(|selector| document.select(selector).find(|el| !is_removed(el)))
            .or_else(|| document.select(&BODY_SELECTOR).next())
            .unwrap_or_else(|| document.root_element());

        tracing::debug!(
            container = container.value().name(),
            removed = removed.len(),
            "selected content container"
        );

        let mut output = String::new();
        serialize_children(container, &removed, &mut output);
        squeeze_whitespace(&output)
    }
}

impl Default for PageCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_STRIP_SELECTORS).expect("default strip selectors are valid")
    }
}

/// Replace every run of two or more whitespace characters with one space, then trim
pub fn squeeze_whitespace(html: &str) -> String {
    WHITESPACE_RUNS.replace_all(html, " ").trim().to_string()
}

fn is_password_input(element: &Element) -> bool {
    element.name() == "input"
        && element
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("password"))
}

fn serialize_children(container: ElementRef, removed: &HashSet<NodeId>, output: &mut String) {
    let root = *container;
    // removed subtrees, password inputs and the inside of void elements
    let mut skipped: Option<NodeId> = None;

    for edge in root.traverse() {
        match edge {
            Edge::Open(node) | Edge::Close(node) if node.id() == root.id() => {}
            Edge::Open(node) => {
                if skipped.is_some() {
                    continue;
                }
                match node.value() {
                    Node::Text(text) => {
                        let text: &str = text;
                        html_escape::encode_text_to_string(text, output);
                    }
                    Node::Comment(comment) => {
                        output.push_str("<!--");
                        output.push_str(comment);
                        output.push_str("-->");
                    }
                    Node::Element(element) => {
                        if removed.contains(&node.id()) || is_password_input(element) {
                            skipped = Some(node.id());
                            continue;
                        }

                        output.push('<');
                        output.push_str(element.name());
                        for (attr, value) in element.attrs() {
                            output.push(' ');
                            output.push_str(attr);
                            output.push_str("=\"");
                            html_escape::encode_double_quoted_attribute_to_string(value, output);
                            output.push('"');
                        }
                        output.push('>');

                        if is_void(element.name()) {
                            skipped = Some(node.id());
                        }
                    }
                    _ => {}
                }
            }
            Edge::Close(node) => {
                if skipped.is_some() {
                    if skipped == Some(node.id()) {
                        skipped = None;
                    }
                    continue;
                }
                if let Node::Element(element) = node.value() {
                    output.push_str("</");
                    output.push_str(element.name());
                    output.push('>');
                }
            }
        }
    }
}
