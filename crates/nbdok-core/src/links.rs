//! Page locations and relative link rewriting
//!
//! Documentation pages live under the docs root, one level below the project
//! root, mirroring the directory layout of the notebooks they come from.
//! Relative references written in a notebook point at files next to the
//! notebook, so they need a prefix to keep working from the page.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Name of the index page at the docs root
pub const INDEX_PAGE: &str = "README.md";

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(!?\[[^\]]*\])\(([^)\s]+)([^)]*)\)").unwrap()
    })
}

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").unwrap())
}

/// Check if a link target is relative to the document that contains it
pub fn is_relative_target(url: &str) -> bool {
    !(url.starts_with('/') || url.starts_with('#') || scheme_regex().is_match(url))
}

/// Where a page sits below the docs root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Page path relative to the docs root, `/`-separated
    page: String,
    /// Directory of the source document relative to the project root
    source_dir: String,
    images_dir: String,
}

impl PageLocation {
    /// Location of `page` (e.g. `pkg/mod.md`), whose source document lives
    /// in the matching directory of the project root.
    pub fn new(page: impl Into<String>, images_dir: impl Into<String>) -> Self {
        let page = page.into().replace('\\', "/");
        let source_dir = match page.rfind('/') {
            Some(pos) => page[..pos].to_string(),
            None => String::new(),
        };
        Self {
            page,
            source_dir,
            images_dir: images_dir.into(),
        }
    }

    /// Page path relative to the docs root
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Number of directories between the docs root and the page
    pub fn depth(&self) -> usize {
        self.page.matches('/').count()
    }

    fn up(&self, levels: usize) -> String {
        "../".repeat(levels)
    }

    /// Link from the page back to the index
    pub fn back_link(&self) -> String {
        format!("{}{}", self.up(self.depth()), INDEX_PAGE)
    }

    /// Link from the page to a stored image
    pub fn image_link(&self, file_name: &str) -> String {
        format!("{}{}/{}", self.up(self.depth()), self.images_dir, file_name)
    }

    /// Prefix turning a reference relative to the source document into one
    /// relative to the page
    pub fn link_prefix(&self) -> String {
        let mut prefix = self.up(self.depth() + 1);
        if !self.source_dir.is_empty() {
            prefix.push_str(&self.source_dir);
            prefix.push('/');
        }
        prefix
    }

    /// Link from the page to a file next to its source document
    pub fn source_link(&self, file_name: &str) -> String {
        format!("{}{}", self.link_prefix(), file_name)
    }

    /// Rewrite relative `[text](url)` and `![alt](url)` references in `text`
    pub fn rewrite_links(&self, text: &str) -> String {
        if !text.contains("](") {
            return text.to_string();
        }
        let prefix = self.link_prefix();
        link_regex()
            .replace_all(text, |caps: &Captures<'_>| {
                let url = &caps[2];
                if is_relative_target(url) {
                    format!("{}({}{}{})", &caps[1], prefix, url, &caps[3])
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}
