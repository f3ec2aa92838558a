//! Documentation blocks
//!
//! A `DocBlock` is one rendered documentation unit for a module, class or
//! function, produced by the doc scanner and consumed by the page renderer.

use serde::{Deserialize, Serialize};

/// Placeholder rendered for a definition without a doc block
pub const NO_DOCUMENTATION: &str = "*(no documentation found)*";

/// A single line of documentation body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocLine {
    /// Plain text passed through unchanged
    Text(String),
    /// A parameter bullet
    Param {
        /// Leading indentation kept from the doc text
        indent: String,
        name: String,
        ty: Option<String>,
        description: String,
    },
    /// The return-value bullet
    Returns {
        indent: String,
        ty: Option<String>,
        description: String,
    },
    /// Marker for a definition that has no doc block
    Missing,
}

impl DocLine {
    /// Render the line as markdown
    pub fn to_markdown(&self) -> String {
        match self {
            DocLine::Text(text) => text.clone(),
            DocLine::Param {
                indent,
                name,
                ty,
                description,
            } => match ty {
                Some(ty) => format!("{}* **{}** *({})*:{}", indent, name, ty, description),
                None => format!("{}* **{}**:{}", indent, name, description),
            },
            DocLine::Returns {
                indent,
                ty,
                description,
            } => match ty {
                Some(ty) => format!("{}* **returns** *({})*:{}", indent, ty, description),
                None => format!("{}* **returns**:{}", indent, description),
            },
            DocLine::Missing => NO_DOCUMENTATION.to_string(),
        }
    }
}

/// One documentation unit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocBlock {
    /// Rendered heading line; `None` for module-level docs
    pub header: Option<String>,
    /// Nesting depth of the definition (1 for file scope, 0 for module docs)
    pub level: usize,
    /// Body lines in source order
    pub lines: Vec<DocLine>,
}

impl DocBlock {
    /// Create a block for a definition heading
    pub fn definition(header: impl Into<String>, level: usize) -> Self {
        Self {
            header: Some(header.into()),
            level,
            lines: Vec::new(),
        }
    }

    /// Create a module-level block
    pub fn module() -> Self {
        Self::default()
    }

    /// Add a body line
    pub fn push(&mut self, line: DocLine) {
        self.lines.push(line);
    }

    /// Render the block as markdown lines: heading first, then the body
    pub fn to_markdown_lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.lines.len() + 1);
        if let Some(ref header) = self.header {
            out.push(header.clone());
        }
        out.extend(self.lines.iter().map(DocLine::to_markdown));
        out
    }
}
