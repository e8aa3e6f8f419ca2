//! Rule system for HTML to Markdown conversion.
//!
//! Rules are tried in a fixed order and the first match wins: custom rules
//! (newest first), built-in CommonMark rules, keep filters, remove filters,
//! then the default. Blank nodes skip the lookup and use the blank rule.

mod commonmark;
mod rule;

pub use commonmark::commonmark_rules;
pub use rule::{
    AppendFn, DeferredReplacementFn, Filter, FilterSpec, PredicateFn, ReferenceList, ReplacementFn,
    Rule,
};

use indexmap::IndexMap;

use crate::classify::is_blank;
use crate::dom::NodeRef;
use crate::options::ConversionOptions;

/// The outcome of a rule lookup for one element.
///
/// Rule matches carry the rule's slot, its position in [`Rules::iter`] order.
#[derive(Debug)]
pub enum RuleMatch<'a> {
    /// A rule registered through [`Rules::add`]
    Custom(usize, &'a str, &'a Rule),
    /// One of the CommonMark rules
    Builtin(usize, &'a Rule),
    /// Emit the element's outer HTML
    Keep,
    /// Drop the element
    Remove,
    /// The element renders to nothing
    Blank,
    /// No rule matched; pass the content through
    Default,
}

/// Collection of rules for conversion
#[derive(Debug)]
pub struct Rules {
    /// Custom rules added by the user (checked first, newest first)
    custom_rules: IndexMap<String, Rule>,
    /// Built-in CommonMark rules
    commonmark_rules: Vec<Rule>,
    /// Keep rules (preserve as HTML), newest first
    keep_rules: Vec<Filter>,
    /// Remove rules (remove entirely), newest first
    remove_rules: Vec<Filter>,
}

impl Rules {
    /// Create a new Rules instance with CommonMark rules
    pub fn new() -> Self {
        Self {
            custom_rules: IndexMap::new(),
            commonmark_rules: commonmark_rules(),
            keep_rules: Vec::new(),
            remove_rules: Vec::new(),
        }
    }

    /// Add a custom rule in front of every other rule. Re-using a key
    /// replaces the earlier rule.
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.shift_insert(0, key.to_string(), rule);
        tracing::debug!(key, custom_rules = self.custom_rules.len(), "added rule");
    }

    /// Add a keep filter
    pub fn keep(&mut self, filter: Filter) {
        tracing::debug!(?filter, "added keep filter");
        self.keep_rules.insert(0, filter);
    }

    /// Add a remove filter
    pub fn remove(&mut self, filter: Filter) {
        tracing::debug!(?filter, "added remove filter");
        self.remove_rules.insert(0, filter);
    }

    /// Find the rule to apply to an element
    pub fn for_node<'a>(&'a self, node: &NodeRef<'_>, options: &ConversionOptions) -> RuleMatch<'a> {
        if is_blank(node) {
            return RuleMatch::Blank;
        }

        if let Some((slot, (key, rule))) = self
            .custom_rules
            .iter()
            .enumerate()
            .find(|(_, (_, rule))| rule.filter.matches(node, options))
        {
            return RuleMatch::Custom(slot, key.as_str(), rule);
        }

        if let Some((index, rule)) = self
            .commonmark_rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.filter.matches(node, options))
        {
            return RuleMatch::Builtin(self.custom_rules.len() + index, rule);
        }

        if self.keep_rules.iter().any(|f| f.matches(node, options)) {
            return RuleMatch::Keep;
        }

        if self.remove_rules.iter().any(|f| f.matches(node, options)) {
            return RuleMatch::Remove;
        }

        RuleMatch::Default
    }

    /// Iterate custom then built-in rules, in lookup order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.custom_rules.values().chain(self.commonmark_rules.iter())
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
