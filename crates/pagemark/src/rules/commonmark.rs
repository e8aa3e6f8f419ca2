//! CommonMark rules for HTML to Markdown conversion.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Filter, Rule};
use crate::classify::is_js_whitespace;
use crate::dom::NodeRef;
use crate::options::{
    CodeBlockStyle, ConversionOptions, HeadingStyle, LinkReferenceStyle, LinkStyle,
};

static ATTRIBUTE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\n+\s*)+").expect("attribute regex is valid"));
static LANGUAGE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"language-(\S+)").expect("language regex is valid"));
static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n|\r").expect("line break regex is valid"));

/// Create all CommonMark rules, in lookup order
pub fn commonmark_rules() -> Vec<Rule> {
    vec![
        paragraph_rule(),
        line_break_rule(),
        heading_rule(),
        blockquote_rule(),
        list_rule(),
        list_item_rule(),
        indented_code_block_rule(),
        fenced_code_block_rule(),
        horizontal_rule(),
        inline_link_rule(),
        reference_link_rule(),
        emphasis_rule(),
        strong_rule(),
        code_rule(),
        image_rule(),
    ]
}

/// Collapse line breaks (and the indentation after them) inside an attribute value
fn clean_attribute(value: Option<&str>) -> String {
    match value {
        Some(value) => ATTRIBUTE_BREAKS.replace_all(value, "\n").into_owned(),
        None => String::new(),
    }
}

fn is_blank_text(text: &str) -> bool {
    text.chars().all(is_js_whitespace)
}

/// Length of the longest run of `c` in `text`
fn longest_run(text: &str, c: char) -> usize {
    text.chars()
        .fold((0, 0), |(longest, current), ch| {
            if ch == c {
                (longest.max(current + 1), current + 1)
            } else {
                (longest, 0)
            }
        })
        .0
}

fn paragraph_rule() -> Rule {
    Rule::for_tag("p", |_, content, _| format!("\n\n{content}\n\n"))
}

fn line_break_rule() -> Rule {
    Rule::for_tag("br", |_, _, options| format!("{}\n", options.br))
}

fn heading_rule() -> Rule {
    Rule::new(
        Filter::tags(&["h1", "h2", "h3", "h4", "h5", "h6"]),
        |node, content, options| {
            let level = node
                .tag_name()
                .get(1..)
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(1);

            match options.heading_style {
                HeadingStyle::Setext if level < 3 => {
                    let underline = if level == 1 { "=" } else { "-" };
                    format!(
                        "\n\n{content}\n{}\n\n",
                        underline.repeat(content.chars().count())
                    )
                }
                _ => format!("\n\n{} {content}\n\n", "#".repeat(level)),
            }
        },
    )
}

fn blockquote_rule() -> Rule {
    Rule::for_tag("blockquote", |_, content, _| {
        let content = content.trim_matches('\n');
        let quoted: Vec<String> = content.split('\n').map(|line| format!("> {line}")).collect();
        format!("\n\n{}\n\n", quoted.join("\n"))
    })
}

fn list_rule() -> Rule {
    Rule::new(Filter::tags(&["ul", "ol"]), |node, content, _| {
        let last_in_item = node
            .parent()
            .filter(|parent| parent.is_tag("li"))
            .and_then(|parent| parent.last_element_child())
            .is_some_and(|last| last == *node);

        if last_in_item {
            format!("\n{content}")
        } else {
            format!("\n\n{content}\n\n")
        }
    })
}

fn list_item_marker(node: &NodeRef<'_>, options: &ConversionOptions) -> String {
    let Some(parent) = node.parent().filter(|p| p.is_tag("ol")) else {
        return format!("{}   ", options.bullet_list_marker);
    };

    // Wide enough that start + index cannot overflow for any i64 start
    let index = node.element_index().unwrap_or(0) as i128;
    let number = parent
        .attr("start")
        .and_then(|start| start.trim().parse::<i64>().ok())
        .map_or(index + 1, |start| i128::from(start) + index);
    format!("{number}.  ")
}

fn list_item_rule() -> Rule {
    Rule::for_tag("li", |node, content, options| {
        let body = content.trim_start_matches('\n');
        let trimmed = body.trim_end_matches('\n');
        let mut body = if trimmed.len() < body.len() {
            format!("{trimmed}\n")
        } else {
            trimmed.to_string()
        };
        body = body.replace('\n', "\n    ");

        let mut out = list_item_marker(node, options);
        out.push_str(&body);
        if node.next_sibling().is_some() && !body.ends_with('\n') {
            out.push('\n');
        }
        out
    })
}

/// `<pre>` whose first child is `<code>`
fn is_code_block(tag: &str, node: &NodeRef<'_>) -> bool {
    tag == "pre" && node.first_child().is_some_and(|child| child.is_tag("code"))
}

fn indented_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, options| {
            options.code_block_style == CodeBlockStyle::Indented && is_code_block(tag, node)
        }),
        |node, _, _| {
            let code = node
                .first_child()
                .map(|code| code.text_content())
                .unwrap_or_default();
            format!("\n\n    {}\n\n", code.replace('\n', "\n    "))
        },
    )
}

fn fenced_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, options| {
            options.code_block_style == CodeBlockStyle::Fenced && is_code_block(tag, node)
        }),
        |node, _, options| {
            let Some(code_node) = node.first_child() else {
                return String::new();
            };
            let language = code_node
                .attr("class")
                .and_then(|class| LANGUAGE_CLASS.captures(class))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .unwrap_or("");
            let code = code_node.text_content();

            let fence_char = options.fence_char();
            let fence_len = (longest_run(&code, fence_char) + 1).max(3);
            let fence = fence_char.to_string().repeat(fence_len);

            let code = code.strip_suffix('\n').unwrap_or(&code);
            format!("\n\n{fence}{language}\n{code}\n{fence}\n\n")
        },
    )
}

fn horizontal_rule() -> Rule {
    Rule::for_tag("hr", |_, _, options| format!("\n\n{}\n\n", options.hr))
}

fn has_href(tag: &str, node: &NodeRef<'_>) -> bool {
    tag == "a" && node.attr("href").is_some_and(|href| !href.is_empty())
}

fn inline_link_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, options| {
            options.link_style == LinkStyle::Inlined && has_href(tag, node)
        }),
        |node, content, _| {
            let mut href = String::new();
            for c in node.attr("href").unwrap_or("").chars() {
                if c == '(' || c == ')' {
                    href.push('\\');
                }
                href.push(c);
            }

            let title = clean_attribute(node.attr("title"));
            let title = if title.is_empty() {
                title
            } else {
                format!(" \"{}\"", title.replace('"', "\\\""))
            };

            format!("[{content}]({href}{title})")
        },
    )
}

fn reference_link_rule() -> Rule {
    Rule::deferred(
        Filter::predicate(|tag, node, options| {
            options.link_style == LinkStyle::Referenced && has_href(tag, node)
        }),
        |node, content, options, references| {
            let href = node.attr("href").unwrap_or("");
            let title = clean_attribute(node.attr("title"));
            let title = if title.is_empty() {
                title
            } else {
                format!(" \"{title}\"")
            };

            match options.link_reference_style {
                LinkReferenceStyle::Collapsed => {
                    references.push(format!("[{content}]: {href}{title}"));
                    format!("[{content}][]")
                }
                LinkReferenceStyle::Shortcut => {
                    references.push(format!("[{content}]: {href}{title}"));
                    format!("[{content}]")
                }
                LinkReferenceStyle::Full => {
                    let number = references.len() + 1;
                    references.push(format!("[{number}]: {href}{title}"));
                    format!("[{content}][{number}]")
                }
            }
        },
        |references, _| {
            if references.is_empty() {
                return String::new();
            }
            format!("\n\n{}\n\n", references.take().join("\n"))
        },
    )
}

fn emphasis_rule() -> Rule {
    Rule::new(Filter::tags(&["em", "i"]), |_, content, options| {
        if is_blank_text(content) {
            return String::new();
        }
        let delimiter = options.em_delimiter;
        format!("{delimiter}{content}{delimiter}")
    })
}

fn strong_rule() -> Rule {
    Rule::new(Filter::tags(&["strong", "b"]), |_, content, options| {
        if is_blank_text(content) {
            return String::new();
        }
        let delimiter = &options.strong_delimiter;
        format!("{delimiter}{content}{delimiter}")
    })
}

fn code_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            if tag != "code" {
                return false;
            }
            let has_siblings = node.previous_sibling().is_some() || node.next_sibling().is_some();
            let in_bare_pre = node.parent().is_some_and(|p| p.is_tag("pre")) && !has_siblings;
            !in_bare_pre
        }),
        |_, content, _| {
            if content.is_empty() {
                return String::new();
            }
            let content = LINE_BREAKS.replace_all(content, " ");

            let space_padded = content.len() > 2
                && content.starts_with(' ')
                && content.ends_with(' ')
                && content.chars().any(|c| c != ' ');
            let padding = if content.starts_with('`') || content.ends_with('`') || space_padded {
                " "
            } else {
                ""
            };
            let delimiter = "`".repeat(longest_run(&content, '`') + 1);

            format!("{delimiter}{padding}{content}{padding}{delimiter}")
        },
    )
}

fn image_rule() -> Rule {
    Rule::for_tag("img", |node, _, _| {
        let alt = clean_attribute(node.attr("alt"));
        let src = node.attr("src").unwrap_or("");
        if src.is_empty() {
            return alt;
        }

        let title = clean_attribute(node.attr("title"));
        let title = if title.is_empty() {
            title
        } else {
            format!(" \"{title}\"")
        };
        format!("![{alt}]({src}{title})")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;
    use crate::rules::ReferenceList;
    use crate::node::Node;

    fn matching_rule(node: &Node, options: &ConversionOptions) -> Option<usize> {
        let dom = Dom::from_node(node);
        let root = dom.root_node();
        commonmark_rules()
            .iter()
            .position(|rule| rule.filter.matches(&root, options))
    }

    fn render(node: &Node, content: &str, options: &ConversionOptions) -> String {
        let dom = Dom::from_node(node);
        let root = dom.root_node();
        let rules = commonmark_rules();
        let rule = rules
            .iter()
            .find(|rule| rule.filter.matches(&root, options))
            .expect("a rule matches");
        rule.replace(&root, content, options, &mut ReferenceList::default())
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run("", '`'), 0);
        assert_eq!(longest_run("a``b`", '`'), 2);
        assert_eq!(longest_run("~~~~x~", '~'), 4);
    }

    #[test]
    fn test_clean_attribute() {
        assert_eq!(clean_attribute(Some("a\n   \n  b")), "a\nb");
        assert_eq!(clean_attribute(None), "");
    }

    #[test]
    fn test_heading_styles() {
        let h2 = Node::element("h2");
        assert_eq!(
            render(&h2, "Hello", &ConversionOptions::default()),
            "\n\nHello\n-----\n\n"
        );
        assert_eq!(
            render(&h2, "Hello", &ConversionOptions::page_extraction()),
            "\n\n## Hello\n\n"
        );
        let h4 = Node::element("h4");
        assert_eq!(
            render(&h4, "Deep", &ConversionOptions::default()),
            "\n\n#### Deep\n\n"
        );
    }

    #[test]
    fn test_blockquote_prefixes_every_line() {
        let quote = Node::element("blockquote");
        assert_eq!(
            render(&quote, "\n\none\n\ntwo\n\n", &ConversionOptions::default()),
            "\n\n> one\n> \n> two\n\n"
        );
    }

    #[test]
    fn test_code_block_filters_follow_style() {
        let mut pre = Node::element("pre");
        pre.add_child(Node::element("code"));
        let indented = ConversionOptions::default();
        let fenced = ConversionOptions::page_extraction();
        let by_indented = matching_rule(&pre, &indented);
        let by_fenced = matching_rule(&pre, &fenced);
        assert!(by_indented.is_some());
        assert!(by_fenced.is_some());
        assert_ne!(by_indented, by_fenced);

        let bare = Node::element("pre");
        assert_eq!(matching_rule(&bare, &indented), None);
    }

    #[test]
    fn test_fenced_code_block_language_and_fence() {
        let mut pre = Node::element("pre");
        let mut code = Node::element_with_attrs("code", vec![("class", "hl language-rust")]);
        code.add_child(Node::text("let a = \"```\";\n"));
        pre.add_child(code);
        assert_eq!(
            render(&pre, "", &ConversionOptions::page_extraction()),
            "\n\n````rust\nlet a = \"```\";\n````\n\n"
        );
    }

    #[test]
    fn test_inline_code_delimiters() {
        let code = Node::element("code");
        let options = ConversionOptions::default();
        assert_eq!(render(&code, "x", &options), "`x`");
        assert_eq!(render(&code, "a`b", &options), "``a`b``");
        assert_eq!(render(&code, "`tick", &options), "`` `tick ``");
        assert_eq!(render(&code, " a ", &options), "`  a  `");
        assert_eq!(render(&code, "   ", &options), "`   `");
        assert_eq!(render(&code, "a\nb", &options), "`a b`");
        assert_eq!(render(&code, "", &options), "");
    }

    #[test]
    fn test_image_without_src_uses_alt() {
        let img = Node::element_with_attrs("img", vec![("alt", "logo")]);
        assert_eq!(render(&img, "", &ConversionOptions::default()), "logo");

        let img = Node::element_with_attrs(
            "img",
            vec![("src", "/a.png"), ("alt", "A"), ("title", "T")],
        );
        assert_eq!(
            render(&img, "", &ConversionOptions::default()),
            "![A](/a.png \"T\")"
        );
    }

    #[test]
    fn test_inline_link_escapes() {
        let a = Node::element_with_attrs(
            "a",
            vec![("href", "http://x.com/(a)"), ("title", "say \"hi\"")],
        );
        assert_eq!(
            render(&a, "t", &ConversionOptions::default()),
            "[t](http://x.com/\\(a\\) \"say \\\"hi\\\"\")"
        );
    }

    #[test]
    fn test_link_without_href_has_no_rule() {
        let a = Node::element_with_attrs("a", vec![("href", "")]);
        assert_eq!(matching_rule(&a, &ConversionOptions::default()), None);
    }
}
