//! Page snapshot to Markdown payload.

use pagemark::budget::finalize;
use pagemark::{Filter, MarkdownService, Rule};
use serde::Serialize;

use crate::clean::PageCleaner;
use crate::config::ExtractConfig;
use crate::page::{is_supported_url, ContentKind, PageMetadata, PageSnapshot};
use crate::{ExtractError, Result};

/// Markdown content of a page, ready to be put into a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    #[serde(flatten)]
    pub metadata: PageMetadata,
    pub kind: ContentKind,
    pub markdown: String,
    /// Whether the Markdown was cut to the character budget
    pub truncated: bool,
}

/// Cleans and converts page snapshots. Build once, share freely.
#[derive(Debug)]
pub struct PageExtractor {
    cleaner: PageCleaner,
    service: MarkdownService,
    max_chars: usize,
}

impl PageExtractor {
    pub fn new(config: ExtractConfig) -> Result<Self> {
        let cleaner = PageCleaner::new(config.strip_selectors.as_slice())?;

        let mut service = MarkdownService::with_options(config.options);
        for spec in config.keep {
            service.keep(Filter::try_from(spec)?);
        }
        for spec in config.remove {
            service.remove(Filter::try_from(spec)?);
        }
        service.add_rule("images", image_rule());

        Ok(Self {
            cleaner,
            service,
            max_chars: config.max_chars,
        })
    }

    /// Extract the readable content of a page.
    ///
    /// Fails with [`ExtractError::RestrictedPage`] for pages that cannot be
    /// read and with [`ExtractError::EmptyContent`] when nothing readable is left.
    pub fn extract(&self, snapshot: &PageSnapshot) -> Result<PageContent> {
        let url = &snapshot.metadata.url;
        if !is_supported_url(url) {
            return Err(ExtractError::RestrictedPage(url.clone()));
        }

        let cleaned = self.cleaner.clean(&snapshot.html);
        let markdown = self.service.turndown(cleaned.as_str())?;
        let budgeted = finalize(&markdown, self.max_chars);
        if budgeted.markdown.is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        tracing::debug!(
            url = %url,
            html_len = snapshot.html.len(),
            markdown_len = budgeted.markdown.len(),
            truncated = budgeted.truncated,
            "extracted page content"
        );

        Ok(PageContent {
            metadata: snapshot.metadata.clone(),
            kind: ContentKind::detect(url),
            markdown: budgeted.markdown,
            truncated: budgeted.truncated,
        })
    }

    /// The converter, for callers that want to register extra rules
    pub fn service(&self) -> &MarkdownService {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut MarkdownService {
        &mut self.service
    }
}

// Images keep their source but drop the title; alt text alone without a source
fn image_rule() -> Rule {
    Rule::for_tag("img", |node, _, _| {
        let alt = node.attr("alt").unwrap_or("");
        match node.attr("src") {
            Some(src) if !src.is_empty() => format!("![{alt}]({src})"),
            _ => alt.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark::FilterSpec;

    fn snapshot(html: &str, url: &str) -> PageSnapshot {
        PageSnapshot {
            html: html.to_string(),
            metadata: PageMetadata {
                title: "Page".to_string(),
                url: url.to_string(),
                favicon: None,
            },
        }
    }

    fn extract(html: &str) -> Result<PageContent> {
        let extractor = PageExtractor::new(ExtractConfig::default())?;
        extractor.extract(&snapshot(html, "https://example.com/"))
    }

    #[test]
    fn test_image_rule_drops_title() {
        let content = extract(r#"<body><p><img src="a.png" alt="A" title="T"></p></body>"#).unwrap();
        assert_eq!(content.markdown, "![A](a.png)");
    }

    #[test]
    fn test_image_without_source_is_alt_text() {
        let content = extract(r#"<body><p>see <img alt="diagram"></p></body>"#).unwrap();
        assert_eq!(content.markdown, "see diagram");
    }

    #[test]
    fn test_figure_kept_as_html() {
        let content =
            extract("<body><figure><img src=\"a.png\"><figcaption>Cap</figcaption></figure></body>")
                .unwrap();
        assert_eq!(
            content.markdown,
            "<figure><img src=\"a.png\"><figcaption>Cap</figcaption></figure>"
        );
    }

    #[test]
    fn test_restricted_page() {
        let extractor = PageExtractor::new(ExtractConfig::default()).unwrap();
        let err = extractor
            .extract(&snapshot("<p>x</p>", "chrome://settings"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::RestrictedPage(url) if url == "chrome://settings"));
    }

    #[test]
    fn test_empty_content() {
        let err = extract("<body><nav>Only navigation</nav><script>x()</script></body>").unwrap_err();
        assert!(matches!(err, ExtractError::EmptyContent));
    }

    #[test]
    fn test_budget() {
        let config = ExtractConfig {
            max_chars: 5,
            ..ExtractConfig::default()
        };
        let extractor = PageExtractor::new(config).unwrap();
        let content = extractor
            .extract(&snapshot("<body><p>abcdefgh</p></body>", "https://example.com/"))
            .unwrap();
        assert!(content.truncated);
        assert_eq!(content.markdown, "abcde... (content truncated)");
    }

    #[test]
    fn test_invalid_filter_spec() {
        let config = ExtractConfig {
            remove: vec![FilterSpec::Tag("not a tag".to_string())],
            ..ExtractConfig::default()
        };
        assert!(matches!(
            PageExtractor::new(config),
            Err(ExtractError::Convert(pagemark::ConvertError::InvalidFilterSpec(_)))
        ));
    }

    #[test]
    fn test_invalid_selector() {
        let config = ExtractConfig {
            strip_selectors: vec!["[".to_string()],
            ..ExtractConfig::default()
        };
        assert!(matches!(
            PageExtractor::new(config),
            Err(ExtractError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_video_kind() {
        let extractor = PageExtractor::new(ExtractConfig::default()).unwrap();
        let content = extractor
            .extract(&snapshot(
                "<body><main><p>Video description</p></main></body>",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            ))
            .unwrap();
        assert!(content.kind.is_video());
        assert_eq!(content.markdown, "Video description");
    }
}
