//! MarkdownService - the main entry point for HTML to Markdown conversion.

use crate::convert::Converter;
use crate::dom::Dom;
use crate::escape::escape_markdown;
use crate::node::Node;
use crate::options::ConversionOptions;
use crate::rules::{Filter, Rule, Rules};
use crate::whitespace::collapse_whitespace;
use crate::{ConvertError, Result};

/// What [`MarkdownService::turndown`] accepts: an HTML string or a DOM node
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Html(&'a str),
    Node(&'a Node),
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(html: &'a str) -> Self {
        Input::Html(html)
    }
}

impl<'a> From<&'a String> for Input<'a> {
    fn from(html: &'a String) -> Self {
        Input::Html(html.as_str())
    }
}

impl<'a> From<&'a Node> for Input<'a> {
    fn from(node: &'a Node) -> Self {
        Input::Node(node)
    }
}

/// Converts HTML to Markdown with a rule table and a fixed set of options.
///
/// The rule table is configured up front (`add_rule`, `keep`, `remove`,
/// `use_plugin`) and only read during conversion, so a configured service can
/// be shared between threads. Every call works on its own detached copy of the
/// input.
#[derive(Debug)]
pub struct MarkdownService {
    options: ConversionOptions,
    rules: Rules,
}

impl MarkdownService {
    /// Create a new MarkdownService with default options
    pub fn new() -> Self {
        Self::with_options(ConversionOptions::default())
    }

    /// Create a MarkdownService with custom options
    pub fn with_options(options: ConversionOptions) -> Self {
        Self {
            options,
            rules: Rules::new(),
        }
    }

    /// Convert an HTML string or a DOM node to Markdown.
    ///
    /// Only the children of the input are converted; a node handed in is a
    /// container, never matched against rules itself. An empty string returns
    /// an empty string. Text and comment nodes fail with
    /// [`ConvertError::InvalidInput`].
    pub fn turndown<'a>(&self, input: impl Into<Input<'a>>) -> Result<String> {
        let mut dom = match input.into() {
            Input::Html("") => return Ok(String::new()),
            Input::Html(html) => Dom::from_node(&parse(html)?),
            Input::Node(node) if node.is_container() => Dom::from_node(node),
            Input::Node(node) => {
                return Err(ConvertError::InvalidInput(format!(
                    "{} is not an element, document or fragment node",
                    node.node_name
                )))
            }
        };

        collapse_whitespace(&mut dom, self.options.preformatted_code);
        let markdown = Converter::new(&self.rules, &self.options).convert(&dom);
        tracing::debug!(chars = markdown.len(), "converted to markdown");
        Ok(markdown)
    }

    /// Add a custom rule, checked before all other rules. Re-using a key
    /// replaces the earlier rule.
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Keep elements matching the filter as HTML
    pub fn keep(&mut self, filter: Filter) -> &mut Self {
        self.rules.keep(filter);
        self
    }

    /// Remove elements matching the filter
    pub fn remove(&mut self, filter: Filter) -> &mut Self {
        self.rules.remove(filter);
        self
    }

    /// Apply a plugin
    pub fn use_plugin<F>(&mut self, plugin: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        plugin(self);
        self
    }

    /// Escape markdown special characters in a string
    pub fn escape(&self, text: &str) -> String {
        escape_markdown(text)
    }

    /// Get the current options
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut ConversionOptions {
        &mut self.options
    }
}

impl Default for MarkdownService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "html")]
fn parse(html: &str) -> Result<Node> {
    Ok(crate::html::parse_html(html))
}

#[cfg(not(feature = "html"))]
fn parse(_html: &str) -> Result<Node> {
    Err(ConvertError::InvalidInput(
        "HTML string input needs the `html` feature".to_string(),
    ))
}
