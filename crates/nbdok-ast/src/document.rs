//! Notebook documents and their cells
//!
//! This module defines the in-memory notebook: an ordered sequence of
//! code and markdown cells, each owning its captured execution outputs.

use serde::{Deserialize, Serialize};

/// Kind of a notebook cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Executable code
    Code,
    /// Markdown prose
    Markdown,
}

/// A captured execution output, owned by its cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Output {
    /// Stream or plain-text result lines
    Text(Vec<String>),
    /// Base64-encoded PNG payload
    Image(String),
    /// Error traceback lines (may contain ANSI escapes)
    Error(Vec<String>),
}

/// A single notebook cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Code or markdown
    pub cell_type: CellType,
    /// Source lines, each with its trailing newline except possibly the last
    pub source: Vec<String>,
    /// Captured outputs in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Output>,
}

impl Cell {
    /// Create a code cell from source lines
    pub fn code<I, S>(source: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cell_type: CellType::Code,
            source: source.into_iter().map(Into::into).collect(),
            outputs: Vec::new(),
        }
    }

    /// Create a markdown cell from source lines
    pub fn markdown<I, S>(source: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cell_type: CellType::Markdown,
            source: source.into_iter().map(Into::into).collect(),
            outputs: Vec::new(),
        }
    }

    /// Attach an output
    pub fn with_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Check if the cell has no source lines
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The first source line, if any
    pub fn first_line(&self) -> Option<&str> {
        self.source.first().map(|s| s.as_str())
    }

    /// The full source text
    pub fn text(&self) -> String {
        self.source.concat()
    }

    /// Return a copy of this cell with a different source
    pub fn with_source(&self, source: Vec<String>) -> Self {
        Self {
            cell_type: self.cell_type,
            source,
            outputs: self.outputs.clone(),
        }
    }
}

/// A complete notebook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    /// Path the notebook was loaded from, relative to the project root
    pub path: String,
    /// All cells in document order, including empty ones
    pub cells: Vec<Cell>,
}

impl Notebook {
    /// Create a new empty notebook
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cells: Vec::new(),
        }
    }

    /// Create a notebook from cells
    pub fn with_cells(path: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            path: path.into(),
            cells,
        }
    }

    /// Add a cell to the notebook
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Check if the notebook has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get the number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }
}
