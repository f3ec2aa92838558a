//! Index page generation
//!
//! Titled pages are listed in two groups: examples (titles carrying the
//! example prefix, shown without it) and general documentation.

use serde::{Deserialize, Serialize};

/// Default index layout
pub const DEFAULT_TEMPLATE: &str = "\n# Examples\n\n{examples}\n\n# Documentation\n\n{toc}\n\n";

/// Index page configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Layout with `{examples}` and `{toc}` placeholders
    pub template: String,
    /// Title prefix marking example pages
    pub example_prefix: String,
    /// Text used when no example pages exist
    pub empty_examples: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            example_prefix: "Example: ".to_string(),
            empty_examples: "(no examples found)".to_string(),
        }
    }
}

/// A rendered page as listed in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// Page path relative to the docs root
    pub path: String,
    pub title: Option<String>,
}

impl PageEntry {
    pub fn new(path: impl Into<String>, title: Option<String>) -> Self {
        Self {
            path: path.into(),
            title,
        }
    }
}

/// Build the index text; `None` when no page has a title.
pub fn build_index(entries: &[PageEntry], config: &IndexConfig) -> Option<String> {
    let mut titled: Vec<(&str, &str)> = entries
        .iter()
        .filter_map(|e| e.title.as_deref().map(|title| (title, e.path.as_str())))
        .collect();
    if titled.is_empty() {
        return None;
    }
    titled.sort();

    let mut examples = String::new();
    let mut toc = String::new();
    for (title, path) in titled {
        match title.strip_prefix(config.example_prefix.as_str()) {
            Some(name) if !config.example_prefix.is_empty() => {
                examples.push_str(&format!("* [{}]({})\n", name, path));
            }
            _ => toc.push_str(&format!("* [{}]({})\n", title, path)),
        }
    }
    if examples.is_empty() {
        examples = config.empty_examples.clone();
    }

    Some(
        config
            .template
            .replace("{examples}", &examples)
            .replace("{toc}", &toc),
    )
}
