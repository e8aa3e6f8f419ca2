//! Rule and Filter types for HTML conversion.

use crate::dom::NodeRef;
use crate::options::ConversionOptions;
use crate::{ConvertError, Result};

/// Replacement function: `(node, converted content, options) -> markdown`
pub type ReplacementFn =
    Box<dyn Fn(&NodeRef<'_>, &str, &ConversionOptions) -> String + Send + Sync>;

/// Replacement function that defers part of its output to the end of the document
pub type DeferredReplacementFn = Box<
    dyn Fn(&NodeRef<'_>, &str, &ConversionOptions, &mut ReferenceList) -> String + Send + Sync,
>;

/// Hook run once after the whole tree is converted; its output is appended
pub type AppendFn = Box<dyn Fn(&mut ReferenceList, &ConversionOptions) -> String + Send + Sync>;

/// Predicate used by [`Filter::Predicate`]: `(lowercase tag, node, options)`
pub type PredicateFn = Box<dyn Fn(&str, &NodeRef<'_>, &ConversionOptions) -> bool + Send + Sync>;

/// A filter determines which elements a rule applies to
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match using a predicate function
    Predicate(PredicateFn),
}

impl Filter {
    /// Create a filter for a single tag
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_lowercase())
    }

    /// Create a filter for multiple tags
    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &NodeRef<'_>, &ConversionOptions) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches a node
    pub fn matches(&self, node: &NodeRef<'_>, options: &ConversionOptions) -> bool {
        let tag = node.tag_name();
        match self {
            Filter::TagName(t) => tag == *t,
            Filter::TagNames(tags) => tags.contains(&tag),
            Filter::Predicate(f) => f(&tag, node, options),
        }
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::TagName(t) => f.debug_tuple("TagName").field(t).finish(),
            Filter::TagNames(tags) => f.debug_tuple("TagNames").field(tags).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A filter as it arrives from configuration data.
///
/// Deserializes from a JSON string or array of strings; any other value becomes
/// [`FilterSpec::Unsupported`] and is rejected when turned into a [`Filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    Tag(String),
    Tags(Vec<String>),
    Unsupported(String),
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FilterSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Tag(String),
            Tags(Vec<String>),
            Other(serde::de::IgnoredAny),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Tag(tag) => FilterSpec::Tag(tag),
            Raw::Tags(tags) => FilterSpec::Tags(tags),
            Raw::Other(_) => FilterSpec::Unsupported(
                "filter needs to be a tag name or an array of tag names".to_string(),
            ),
        })
    }
}

fn validate_tag(tag: &str) -> Result<String> {
    let valid = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':');
    if valid {
        Ok(tag.to_lowercase())
    } else {
        Err(ConvertError::InvalidFilterSpec(format!(
            "`{tag}` is not a tag name"
        )))
    }
}

impl TryFrom<FilterSpec> for Filter {
    type Error = ConvertError;

    fn try_from(spec: FilterSpec) -> Result<Self> {
        match spec {
            FilterSpec::Tag(tag) => Ok(Filter::TagName(validate_tag(&tag)?)),
            FilterSpec::Tags(tags) if tags.is_empty() => Err(ConvertError::InvalidFilterSpec(
                "empty tag name array".to_string(),
            )),
            FilterSpec::Tags(tags) => tags
                .iter()
                .map(|t| validate_tag(t))
                .collect::<Result<Vec<_>>>()
                .map(Filter::TagNames),
            FilterSpec::Unsupported(reason) => Err(ConvertError::InvalidFilterSpec(reason)),
        }
    }
}

/// Link reference definitions collected during one conversion.
///
/// Lives on the conversion context, never on a rule, so every `turndown` call
/// starts empty and concurrent conversions never share it. Each deferred rule
/// gets a list of its own.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReferenceList {
    entries: Vec<String>,
}

impl ReferenceList {
    /// Record a definition and return its 1-based number
    pub fn push(&mut self, entry: String) -> usize {
        self.entries.push(entry);
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain all definitions
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.entries)
    }
}

enum Replacement {
    Plain(ReplacementFn),
    Deferred(DeferredReplacementFn),
}

/// A rule defines how to convert a matched HTML element to Markdown
pub struct Rule {
    /// Filter to determine which elements this rule applies to
    pub filter: Filter,
    replacement: Replacement,
    append: Option<AppendFn>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(filter: Filter, replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_>, &str, &ConversionOptions) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: Replacement::Plain(Box::new(replacement)),
            append: None,
        }
    }

    /// Create a rule whose replacement can record reference definitions,
    /// flushed at the end of the document by `append`
    pub fn deferred<F, A>(filter: Filter, replacement: F, append: A) -> Self
    where
        F: Fn(&NodeRef<'_>, &str, &ConversionOptions, &mut ReferenceList) -> String
            + Send
            + Sync
            + 'static,
        A: Fn(&mut ReferenceList, &ConversionOptions) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: Replacement::Deferred(Box::new(replacement)),
            append: Some(Box::new(append)),
        }
    }

    /// Create a rule that matches a single tag
    pub fn for_tag<F>(tag: &str, replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_>, &str, &ConversionOptions) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tag(tag), replacement)
    }

    /// Create a rule that matches multiple tags
    pub fn for_tags<F>(tags: &[&str], replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_>, &str, &ConversionOptions) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tags(tags), replacement)
    }

    /// Apply this rule's replacement
    pub fn replace(
        &self,
        node: &NodeRef<'_>,
        content: &str,
        options: &ConversionOptions,
        references: &mut ReferenceList,
    ) -> String {
        match &self.replacement {
            Replacement::Plain(f) => f(node, content, options),
            Replacement::Deferred(f) => f(node, content, options, references),
        }
    }

    /// Run the end-of-document hook, if any
    pub fn append(
        &self,
        references: &mut ReferenceList,
        options: &ConversionOptions,
    ) -> Option<String> {
        self.append.as_ref().map(|f| f(references, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_spec_conversion() {
        assert!(matches!(
            Filter::try_from(FilterSpec::Tag("Figure".into())),
            Ok(Filter::TagName(t)) if t == "figure"
        ));
        assert!(matches!(
            Filter::try_from(FilterSpec::Tags(vec!["figure".into(), "figcaption".into()])),
            Ok(Filter::TagNames(t)) if t.len() == 2
        ));
        assert!(matches!(
            Filter::try_from(FilterSpec::Tags(vec![])),
            Err(ConvertError::InvalidFilterSpec(_))
        ));
        assert!(matches!(
            Filter::try_from(FilterSpec::Tag("two words".into())),
            Err(ConvertError::InvalidFilterSpec(_))
        ));
        assert!(matches!(
            Filter::try_from(FilterSpec::Unsupported("number".into())),
            Err(ConvertError::InvalidFilterSpec(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_filter_spec_from_json() {
        let specs: Vec<FilterSpec> =
            serde_json::from_str(r#"["nav", ["figure", "figcaption"], 42, {"tag": "x"}]"#).unwrap();
        assert_eq!(specs[0], FilterSpec::Tag("nav".into()));
        assert_eq!(
            specs[1],
            FilterSpec::Tags(vec!["figure".into(), "figcaption".into()])
        );
        assert!(matches!(specs[2], FilterSpec::Unsupported(_)));
        assert!(matches!(specs[3], FilterSpec::Unsupported(_)));
    }

    #[test]
    fn test_reference_list_numbering() {
        let mut refs = ReferenceList::default();
        assert!(refs.is_empty());
        assert_eq!(refs.push("[1]: a".into()), 1);
        assert_eq!(refs.push("[2]: b".into()), 2);
        assert_eq!(refs.take().len(), 2);
        assert_eq!(refs.len(), 0);
    }
}
