//! # pagemark
//!
//! Convert HTML pages and DOM trees to Markdown, ready to be sent to an LLM.
//!
//! The conversion follows [turndown](https://github.com/mixmark-io/turndown):
//! the input is cloned into a detached tree, whitespace is collapsed the way a
//! browser renders it, every element is rewritten by the first matching rule,
//! and sibling output is joined so that at most one blank line separates
//! blocks.
//!
//! Input is either an HTML string (parsed with html5ever, feature `html`) or a
//! CDP-style [`Node`] tree as a browser extension or DevTools client would
//! deliver it.
//!
//! ## Example (HTML string)
//!
//! ```rust
//! use pagemark::MarkdownService;
//!
//! let service = MarkdownService::new();
//! let markdown = service.turndown("<h1>Hello World</h1>").unwrap();
//! assert_eq!(markdown, "Hello World\n===========");
//! ```
//!
//! ## Example (Node-based)
//!
//! ```rust
//! use pagemark::{ConversionOptions, MarkdownService, Node};
//!
//! let service = MarkdownService::with_options(ConversionOptions::page_extraction());
//!
//! let mut body = Node::element("body");
//! let mut h1 = Node::element("h1");
//! h1.add_child(Node::text("Hello World"));
//! body.add_child(h1);
//!
//! let markdown = service.turndown(&body).unwrap();
//! assert_eq!(markdown, "# Hello World");
//! ```

pub mod budget;
pub mod classify;
mod convert;
pub mod dom;
pub mod escape;
#[cfg(feature = "html")]
pub mod html;
pub mod node;
pub mod options;
pub mod rules;
mod service;
pub mod whitespace;

pub use budget::{Budgeted, DEFAULT_MAX_CHARS, TRUNCATION_MARKER};
pub use dom::{Dom, Edge, NodeId, NodeRef};
pub use escape::escape_markdown;
#[cfg(feature = "html")]
pub use html::parse_html;
pub use node::{Node, NodeType};
pub use options::{
    CodeBlockStyle, ConversionOptions, HeadingStyle, LinkReferenceStyle, LinkStyle,
};
pub use rules::{Filter, FilterSpec, ReferenceList, Rule, RuleMatch, Rules};
pub use service::{Input, MarkdownService};

/// Error type for conversion
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The input is not an HTML string, element, document or fragment
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A filter is neither a tag name, a list of tag names nor a predicate
    #[error("Invalid filter: {0}")]
    InvalidFilterSpec(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
