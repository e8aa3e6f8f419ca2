//! Property-based tests for conversion invariants.
use pagemark::budget::{finalize, TRUNCATION_MARKER};
use pagemark::whitespace::collapse_whitespace;
use pagemark::{escape_markdown, parse_html, ConversionOptions, Dom, MarkdownService};
use proptest::prelude::*;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

mod strategies {
    use super::*;

    /// A plain word that needs no escaping
    pub fn word() -> impl Strategy<Value = String> {
        "[a-z]{1,8}"
    }

    /// A block element holding one word
    pub fn block() -> impl Strategy<Value = String> {
        (0..4usize, word()).prop_map(|(kind, word)| match kind {
            0 => format!("<p>{word}</p>"),
            1 => format!("<h2>{word}</h2>"),
            2 => format!("<ul><li>{word}</li></ul>"),
            _ => format!("<blockquote><p>{word}</p></blockquote>"),
        })
    }

    /// Paragraph text dense with Markdown metacharacters, single spaces
    /// between words and an optional block marker up front
    pub fn paragraph_text() -> impl Strategy<Value = String> {
        (
            prop::sample::select(vec!["", "- ", "+ ", "> ", "# ", "1. ", "= "]),
            prop::collection::vec(r"[a-z0-9*_`~=\-\[\]\\]{1,6}", 1..8),
        )
            .prop_map(|(marker, words)| format!("{marker}{}", words.join(" ")))
    }

    /// Loose HTML soup mixing blocks, inline elements and whitespace
    pub fn html_soup() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just("<p>".to_string()),
                Just("</p>".to_string()),
                Just("<div>".to_string()),
                Just("</div>".to_string()),
                Just("<b>".to_string()),
                Just("</b>".to_string()),
                Just("<br>".to_string()),
                Just("<img src=\"x\">".to_string()),
                Just("<pre> a  b </pre>".to_string()),
                Just(" ".to_string()),
                Just("  \n\t ".to_string()),
                word(),
            ],
            0..30,
        )
        .prop_map(|parts| parts.concat())
    }
}

/// Drop the backslash of every backslash escape
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                if !next.is_ascii_punctuation() {
                    out.push(c);
                }
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

proptest! {
    #[test]
    fn blocks_are_separated_by_exactly_one_blank_line(
        blocks in prop::collection::vec(strategies::block(), 1..12)
    ) {
        let service = MarkdownService::with_options(ConversionOptions::page_extraction());
        let markdown = service.turndown(blocks.concat().as_str()).unwrap();

        prop_assert!(!markdown.contains("\n\n\n"));
        prop_assert_eq!(markdown.split("\n\n").count(), blocks.len());
    }

    #[test]
    fn fence_outgrows_backtick_runs(run in 0..=5usize, before in strategies::word()) {
        let html = format!("<pre><code>{before}{}x</code></pre>", "`".repeat(run));
        let service = MarkdownService::with_options(ConversionOptions::page_extraction());
        let markdown = service.turndown(html.as_str()).unwrap();

        let fence = markdown.lines().next().unwrap();
        prop_assert!(fence.chars().all(|c| c == '`'));
        prop_assert_eq!(fence.len(), (run + 1).max(3));
        prop_assert_eq!(markdown.lines().last().unwrap(), fence);
    }

    #[test]
    fn ordered_lists_count_from_start(
        start in 1..1000i64,
        items in prop::collection::vec((strategies::word(), any::<bool>()), 1..8)
    ) {
        let body: String = items
            .iter()
            .map(|(word, nested)| {
                if *nested {
                    format!("<li><p>{word}</p><p>more</p></li>")
                } else {
                    format!("<li>{word}</li>")
                }
            })
            .collect();
        let html = format!(r#"<ol start="{start}">{body}</ol>"#);
        let markdown = MarkdownService::new().turndown(html.as_str()).unwrap();

        let markers: Vec<&str> = markdown
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with(' '))
            .collect();
        prop_assert_eq!(markers.len(), items.len());
        for (i, (line, (word, _))) in markers.iter().zip(&items).enumerate() {
            let expected = format!("{}.  {word}", start + i as i64);
            prop_assert_eq!(*line, expected.as_str());
        }
    }

    #[test]
    fn truncation_is_deterministic(text in "[a-z0-9]{0,200}", max in 0..150usize) {
        let out = finalize(&text, max);
        if text.chars().count() > max {
            prop_assert!(out.truncated);
            prop_assert!(out.markdown.ends_with(TRUNCATION_MARKER));
            prop_assert_eq!(
                out.markdown.chars().count(),
                max + TRUNCATION_MARKER.chars().count()
            );
        } else {
            prop_assert!(!out.truncated);
            prop_assert_eq!(out.markdown, text);
        }
    }

    #[test]
    fn normalizing_twice_changes_nothing(html in strategies::html_soup()) {
        let mut dom = Dom::from_node(&parse_html(&html));
        collapse_whitespace(&mut dom, false);
        let once = dom.root_node().outer_html();
        collapse_whitespace(&mut dom, false);
        prop_assert_eq!(dom.root_node().outer_html(), once);
    }

    #[test]
    fn escaping_only_adds_backslashes(text in r"[a-z0-9 *_`#>+\-=~.\[\]\\]{0,40}") {
        let escaped = escape_markdown(&text);
        prop_assert_eq!(unescape(&escaped), text);
        for (i, c) in escaped.char_indices() {
            if matches!(c, '*' | '_' | '`' | '[' | ']') {
                prop_assert_eq!(escaped[..i].chars().last(), Some('\\'));
            }
        }
    }

    #[test]
    fn paragraph_text_reads_back_literally(text in strategies::paragraph_text()) {
        let service = MarkdownService::new();
        let markdown = service.turndown(format!("<p>{text}</p>").as_str()).unwrap();

        let mut paragraphs = 0;
        let mut literal = String::new();
        let mut other = Vec::new();
        for event in Parser::new(&markdown) {
            match event {
                Event::Start(Tag::Paragraph) => paragraphs += 1,
                Event::End(TagEnd::Paragraph) => {}
                Event::Text(chunk) => literal.push_str(&chunk),
                event => other.push(format!("{event:?}")),
            }
        }

        prop_assert_eq!(paragraphs, 1, "markdown: {:?}", markdown);
        prop_assert!(other.is_empty(), "events {:?} in {:?}", other, markdown);
        prop_assert_eq!(literal, text);
    }
}
