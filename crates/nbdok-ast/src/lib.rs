//! nbdok-ast - Document model definitions
//!
//! This crate provides the in-memory representations shared by the nbdok
//! converters: notebooks with their cells and outputs, flat source
//! documents split into indexed segments, and documentation blocks.

pub mod docblock;
pub mod document;
pub mod source;

pub use docblock::{DocBlock, DocLine, NO_DOCUMENTATION};
pub use document::{Cell, CellType, Notebook, Output};
pub use source::{Segment, SegmentKind, SourceDocument};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
