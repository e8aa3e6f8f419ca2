//! Extraction settings.

use pagemark::rules::FilterSpec;
use pagemark::{ConversionOptions, DEFAULT_MAX_CHARS};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::clean::DEFAULT_STRIP_SELECTORS;
use crate::Result;

/// Settings for a [`PageExtractor`](crate::PageExtractor)
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Character budget of the final Markdown, marker excluded
    pub max_chars: usize,
    pub options: ConversionOptions,
    /// Elements rendered as their outer HTML
    pub keep: Vec<FilterSpec>,
    /// Elements dropped together with their content
    pub remove: Vec<FilterSpec>,
    /// CSS selectors of page chrome stripped before conversion
    pub strip_selectors: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            options: ConversionOptions::page_extraction(),
            keep: vec![FilterSpec::Tags(vec![
                "figure".to_string(),
                "figcaption".to_string(),
            ])],
            remove: Vec::new(),
            strip_selectors: DEFAULT_STRIP_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// Options stay a raw map so a partial object is laid over the page preset
// rather than over the library defaults.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    max_chars: Option<usize>,
    #[serde(default)]
    options: Map<String, Value>,
    keep: Option<Vec<FilterSpec>>,
    #[serde(default)]
    remove: Vec<FilterSpec>,
    strip_selectors: Option<Vec<String>>,
}

impl ExtractConfig {
    /// Read settings from JSON. Every field is optional.
    ///
    /// ```rust
    /// use pagemark::HeadingStyle;
    /// use pagemark_extract::ExtractConfig;
    ///
    /// let config = ExtractConfig::from_json(r#"{"maxChars": 500, "options": {"emDelimiter": "*"}}"#).unwrap();
    /// assert_eq!(config.max_chars, 500);
    /// assert_eq!(config.options.em_delimiter, '*');
    /// assert_eq!(config.options.heading_style, HeadingStyle::Atx);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;
        let defaults = Self::default();

        let options = if raw.options.is_empty() {
            defaults.options
        } else {
            let mut merged = match serde_json::to_value(&defaults.options)? {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            merged.extend(raw.options);
            serde_json::from_value(Value::Object(merged))?
        };

        Ok(Self {
            max_chars: raw.max_chars.unwrap_or(defaults.max_chars),
            options,
            keep: raw.keep.unwrap_or(defaults.keep),
            remove: raw.remove,
            strip_selectors: raw.strip_selectors.unwrap_or(defaults.strip_selectors),
        })
    }
}
