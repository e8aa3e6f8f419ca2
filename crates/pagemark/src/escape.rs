//! Markdown metacharacter escaping for plain text nodes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Escape table, applied in order. Patterns anchored with `^` only look at the
/// start of the text, the others at every occurrence.
static ESCAPES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\\", r"\\"),
        (r"\*", r"\*"),
        (r"^-", r"\-"),
        (r"^\+ ", r"\+ "),
        (r"^(=+)", r"\$1"),
        (r"^(#{1,6}) ", r"\$1 "),
        (r"`", r"\`"),
        (r"^~~~", r"\~~~"),
        (r"\[", r"\["),
        (r"\]", r"\]"),
        (r"^>", r"\>"),
        (r"_", r"\_"),
        (r"^(\d+)\. ", r"$1\. "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let regex = Regex::new(pattern).expect("escape pattern is a valid regex");
        (regex, replacement)
    })
    .collect()
});

/// Escape Markdown metacharacters so `text` renders literally.
///
/// Only plain text is escaped; Markdown produced by rules is never passed here.
pub fn escape_markdown(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (regex, replacement)| {
            regex.replace_all(&acc, *replacement).into_owned()
        })
}
