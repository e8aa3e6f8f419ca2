//! Size limiting of converted Markdown before it is handed to an LLM.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default character budget for page content
pub const DEFAULT_MAX_CHARS: usize = 15_000;

/// Appended to Markdown that was cut to fit the budget
pub const TRUNCATION_MARKER: &str = "... (content truncated)";

static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank line regex is valid"));

/// Markdown after post-processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budgeted {
    pub markdown: String,
    /// Whether the text was cut and the marker appended
    pub truncated: bool,
}

/// Replace every run of three or more newlines with exactly two
pub fn collapse_blank_lines(markdown: &str) -> String {
    BLANK_LINE_RUNS.replace_all(markdown, "\n\n").into_owned()
}

/// Keep the first `max_chars` characters and append [`TRUNCATION_MARKER`].
/// Text within the budget is returned as is.
pub fn truncate(markdown: &str, max_chars: usize) -> Budgeted {
    match markdown.char_indices().nth(max_chars) {
        Some((cut, _)) => Budgeted {
            markdown: format!("{}{TRUNCATION_MARKER}", &markdown[..cut]),
            truncated: true,
        },
        None => Budgeted {
            markdown: markdown.to_string(),
            truncated: false,
        },
    }
}

/// Trim, collapse blank lines, then enforce the budget
pub fn finalize(markdown: &str, max_chars: usize) -> Budgeted {
    let collapsed = collapse_blank_lines(markdown.trim());
    let budgeted = truncate(&collapsed, max_chars);
    if budgeted.truncated {
        tracing::debug!(
            chars = collapsed.chars().count(),
            max_chars,
            "truncated markdown"
        );
    }
    budgeted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb\n\nc\nd"), "a\n\nb\n\nc\nd");
    }

    #[test]
    fn test_truncate_at_char_boundary() {
        let cut = truncate("héllo wörld", 5);
        assert!(cut.truncated);
        assert_eq!(cut.markdown, format!("héllo{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_within_budget_is_unchanged() {
        let exact = truncate("12345", 5);
        assert!(!exact.truncated);
        assert_eq!(exact.markdown, "12345");
    }

    #[test]
    fn test_finalize() {
        let out = finalize("\n\n# T\n\n\n\nbody  \n", 100);
        assert_eq!(out.markdown, "# T\n\nbody");
        assert!(!out.truncated);

        let long = "x".repeat(DEFAULT_MAX_CHARS + 10);
        let out = finalize(&long, DEFAULT_MAX_CHARS);
        assert!(out.truncated);
        assert_eq!(
            out.markdown.chars().count(),
            DEFAULT_MAX_CHARS + TRUNCATION_MARKER.chars().count()
        );
    }
}
