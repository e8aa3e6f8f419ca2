//! # pagemark-extract
//!
//! Turn a page snapshot (raw HTML plus the tab's title, URL and favicon) into
//! the Markdown payload handed to an LLM client.
//!
//! Page chrome (scripts, navigation, headers, footers, sidebars) is stripped,
//! the main content container is picked, the result is converted with
//! [`pagemark`] and cut to a character budget.
//!
//! ```rust
//! use pagemark_extract::{ExtractConfig, PageExtractor, PageMetadata, PageSnapshot};
//!
//! let extractor = PageExtractor::new(ExtractConfig::default()).unwrap();
//! let snapshot = PageSnapshot {
//!     html: "<body><nav>Menu</nav><article><h1>News</h1><p>Body text.</p></article></body>"
//!         .to_string(),
//!     metadata: PageMetadata {
//!         title: "News".to_string(),
//!         url: "https://example.com/news".to_string(),
//!         favicon: None,
//!     },
//! };
//!
//! let content = extractor.extract(&snapshot).unwrap();
//! assert_eq!(content.markdown, "# News\n\nBody text.");
//! assert!(!content.truncated);
//! ```

pub mod clean;
pub mod config;
pub mod extractor;
pub mod page;

pub use clean::PageCleaner;
pub use config::ExtractConfig;
pub use extractor::{PageContent, PageExtractor};
pub use page::{is_supported_url, ContentKind, PageMetadata, PageSnapshot, VideoSite};

use pagemark::ConvertError;

/// Error type for page extraction
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The page cannot be read (browser-internal or store pages)
    #[error("Restricted page: {0}")]
    RestrictedPage(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Nothing readable is left after cleaning and conversion
    #[error("Could not retrieve content from the page")]
    EmptyContent,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
