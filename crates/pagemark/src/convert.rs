//! The conversion engine: walks a normalized tree and joins rule output.
//!
//! The walk keeps an explicit stack of open elements instead of recursing, so
//! nesting depth is bounded only by memory.

use std::collections::HashMap;

use crate::classify::{is_block_node, is_js_whitespace};
use crate::dom::{Dom, Edge, NodeId, NodeRef};
use crate::escape::escape_markdown;
use crate::options::ConversionOptions;
use crate::rules::{ReferenceList, RuleMatch, Rules};

/// Whitespace to put back around a node's trimmed output
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct FlankingWhitespace {
    pub leading: String,
    pub trailing: String,
}

/// Output collected so far for an open element
#[derive(Default)]
struct Frame {
    output: String,
    is_code: bool,
}

/// State for one conversion call
pub(crate) struct Converter<'r> {
    rules: &'r Rules,
    options: &'r ConversionOptions,
    /// Deferred output, one list per rule slot
    references: HashMap<usize, ReferenceList>,
}

impl<'r> Converter<'r> {
    pub fn new(rules: &'r Rules, options: &'r ConversionOptions) -> Self {
        Self {
            rules,
            options,
            references: HashMap::new(),
        }
    }

    /// Convert the children of the root of `dom`, then run the append hooks
    pub fn convert(mut self, dom: &Dom) -> String {
        let root = dom.root();
        let mut frames = vec![Frame::default()];
        // comments and nested containers contribute nothing, nor does their content
        let mut skipped: Option<NodeId> = None;

        for edge in dom.root_node().traverse() {
            match edge {
                Edge::Open(node) | Edge::Close(node) if node.id() == root => {}
                Edge::Open(node) => {
                    if skipped.is_some() {
                        continue;
                    }
                    let Some(frame) = frames.last_mut() else {
                        break;
                    };
                    if node.is_text() {
                        let value = node.node_value().unwrap_or("");
                        let text = if frame.is_code {
                            value.to_string()
                        } else {
                            escape_markdown(value)
                        };
                        frame.output = join(&frame.output, &text);
                    } else if node.is_element() {
                        let is_code = node.is_tag("code") || frame.is_code;
                        frames.push(Frame {
                            output: String::new(),
                            is_code,
                        });
                    } else {
                        frame.output = join(&frame.output, "");
                        skipped = Some(node.id());
                    }
                }
                Edge::Close(node) => {
                    if skipped.is_some() {
                        if skipped == Some(node.id()) {
                            skipped = None;
                        }
                        continue;
                    }
                    if !node.is_element() {
                        continue;
                    }
                    let Some(frame) = frames.pop() else {
                        break;
                    };
                    let replacement = self.replacement_for_node(node, frame.output, frame.is_code);
                    if let Some(parent) = frames.last_mut() {
                        parent.output = join(&parent.output, &replacement);
                    }
                }
            }
        }

        let output = frames.pop().map(|frame| frame.output).unwrap_or_default();
        self.post_process(output)
    }

    fn replacement_for_node(&mut self, node: NodeRef<'_>, content: String, is_code: bool) -> String {
        let rules = self.rules;
        let options = self.options;

        let whitespace = flanking_whitespace(&node, is_code, options);
        let content = if whitespace.leading.is_empty() && whitespace.trailing.is_empty() {
            content
        } else {
            js_trim(&content).to_string()
        };

        let block = is_block_node(&node);
        let replacement = match rules.for_node(&node, options) {
            RuleMatch::Custom(slot, _, rule) | RuleMatch::Builtin(slot, rule) => {
                let references = self.references.entry(slot).or_default();
                rule.replace(&node, &content, options, references)
            }
            RuleMatch::Keep if block => format!("\n\n{}\n\n", node.outer_html()),
            RuleMatch::Keep => node.outer_html(),
            RuleMatch::Remove => String::new(),
            RuleMatch::Blank if block => "\n\n".to_string(),
            RuleMatch::Blank => String::new(),
            RuleMatch::Default if block => format!("\n\n{content}\n\n"),
            RuleMatch::Default => content,
        };

        format!(
            "{}{replacement}{}",
            whitespace.leading, whitespace.trailing
        )
    }

    fn post_process(mut self, mut output: String) -> String {
        for (slot, rule) in self.rules.iter().enumerate() {
            let references = self.references.entry(slot).or_default();
            if let Some(appended) = rule.append(references, self.options) {
                output = join(&output, &appended);
            }
        }

        output
            .trim_start_matches(['\t', '\r', '\n'])
            .trim_end_matches(is_js_whitespace)
            .to_string()
    }
}

fn js_trim(text: &str) -> &str {
    text.trim_matches(is_js_whitespace)
}

fn is_ascii_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Join converted output so the blank lines between them are the larger of
/// what each side asks for, capped at one blank line.
pub(crate) fn join(output: &str, replacement: &str) -> String {
    let left = output.trim_end_matches('\n');
    let right = replacement.trim_start_matches('\n');
    let newlines = (output.len() - left.len())
        .max(replacement.len() - right.len())
        .min(2);

    let mut joined = String::with_capacity(left.len() + newlines + right.len());
    joined.push_str(left);
    joined.extend(std::iter::repeat('\n').take(newlines));
    joined.push_str(right);
    joined
}

struct Edges<'t> {
    leading: &'t str,
    leading_ascii: bool,
    leading_non_ascii: &'t str,
    trailing: &'t str,
    trailing_ascii: bool,
    trailing_non_ascii: &'t str,
}

/// Split the whitespace at both ends of `text`. Each end has an ASCII part
/// (space, tab, CR, LF) on the outside and the rest on the inside.
fn edges(text: &str) -> Edges<'_> {
    let body_start = text
        .find(|c: char| !is_js_whitespace(c))
        .unwrap_or(text.len());
    let leading = &text[..body_start];
    let ascii_end = leading
        .find(|c: char| !is_ascii_space(c))
        .unwrap_or(leading.len());

    let (trailing, trailing_ascii_start) = if body_start == text.len() {
        ("", 0)
    } else {
        let body_end = text
            .rfind(|c: char| !is_js_whitespace(c))
            .map(|i| i + text[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(text.len());
        let trailing = &text[body_end..];
        let ascii_start = trailing
            .rfind(|c: char| !is_ascii_space(c))
            .map(|i| i + trailing[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        (trailing, ascii_start)
    };

    Edges {
        leading,
        leading_ascii: ascii_end > 0,
        leading_non_ascii: &leading[ascii_end..],
        trailing,
        trailing_ascii: trailing_ascii_start < trailing.len(),
        trailing_non_ascii: &trailing[..trailing_ascii_start],
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Whether the sibling on `side` already supplies a separating space
fn is_flanked_by_whitespace(side: Side, node: &NodeRef<'_>, options: &ConversionOptions) -> bool {
    let sibling = match side {
        Side::Left => node.previous_sibling(),
        Side::Right => node.next_sibling(),
    };
    let Some(sibling) = sibling else {
        return false;
    };
    let touches_space = |text: &str| match side {
        Side::Left => text.ends_with(' '),
        Side::Right => text.starts_with(' '),
    };

    if sibling.is_text() {
        touches_space(sibling.node_value().unwrap_or(""))
    } else if options.preformatted_code && sibling.is_tag("code") {
        false
    } else if sibling.is_element() && !is_block_node(&sibling) {
        touches_space(&sibling.text_content())
    } else {
        false
    }
}

pub(crate) fn flanking_whitespace(
    node: &NodeRef<'_>,
    is_code: bool,
    options: &ConversionOptions,
) -> FlankingWhitespace {
    if is_block_node(node) || (options.preformatted_code && is_code) {
        return FlankingWhitespace::default();
    }

    let text = node.text_content();
    let edges = edges(&text);
    let leading = if edges.leading_ascii && is_flanked_by_whitespace(Side::Left, node, options) {
        edges.leading_non_ascii
    } else {
        edges.leading
    };
    let trailing = if edges.trailing_ascii && is_flanked_by_whitespace(Side::Right, node, options)
    {
        edges.trailing_non_ascii
    } else {
        edges.trailing
    };

    FlankingWhitespace {
        leading: leading.to_string(),
        trailing: trailing.to_string(),
    }
}
