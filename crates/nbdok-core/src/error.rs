//! Error types for nbdok conversions

use thiserror::Error;

/// Structural problems in a generated source file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The text does not start with the provenance header
    #[error("Missing provenance header (expected first line to start with {0:?})")]
    MissingHeader(&'static str),

    /// A sentinel carries an index other than the next dense position
    #[error("Cell sentinel out of order: expected {expected}, found {found} (line {line})")]
    SentinelOutOfOrder {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// The number of segments differs from the number of exportable cells
    #[error("Cell count mismatch: notebook has {expected} exportable cells, source has {found}")]
    CellCountMismatch { expected: usize, found: usize },

    /// A code segment maps onto a markdown cell or vice versa
    #[error("Cell {index} kind mismatch: notebook cell is {cell}, source segment is {segment}")]
    CellKindMismatch {
        index: usize,
        cell: &'static str,
        segment: &'static str,
    },
}

/// Errors that can occur while converting a single document
#[derive(Error, Debug)]
pub enum NbdokError {
    /// Generated source text is malformed
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Notebook JSON could not be parsed or serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Notebook JSON parsed but does not have the notebook shape
    #[error("Invalid notebook: {0}")]
    InvalidNotebook(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for nbdok operations
pub type Result<T> = std::result::Result<T, NbdokError>;
