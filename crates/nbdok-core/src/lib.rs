//! nbdok-core - Notebooks as source, source as docs
//!
//! Core library for nbdok. It converts the exportable cells of a notebook
//! into an annotated source file and back, and renders markdown
//! documentation pages from notebooks and plain source files.
//!
//! Everything here is pure: callers read and write files.
//!
//! # Example
//!
//! ```
//! use nbdok_ast::{Cell, Notebook};
//! use nbdok_core::{assemble, cell_sources, disassemble};
//!
//! let nb = Notebook::with_cells(
//!     "pkg/mod.ipynb",
//!     vec![
//!         Cell::markdown(["# Title"]),
//!         Cell::code(["#export\n", "def f():\n", "    return 1"]),
//!     ],
//! );
//!
//! let text = assemble(&nb);
//! assert!(text.starts_with("# AUTOGENERATED FROM: pkg/mod.ipynb\n"));
//!
//! let doc = disassemble(&text).unwrap();
//! assert_eq!(cell_sources(&doc)[1], nb.cells[1].source);
//! ```

pub mod classify;
pub mod diagnostics;
pub mod error;
pub mod index;
pub mod links;
pub mod notebook_json;
pub mod render;
pub mod scanner;
pub mod transcode;

// Re-export main types and functions
pub use classify::{classify, exportable_cells, is_doc_convertible, is_source_convertible, CellTag};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{FormatError, NbdokError, Result};
pub use index::{build_index, IndexConfig, PageEntry};
pub use links::PageLocation;
pub use notebook_json::{to_json_string, NotebookFile};
pub use render::{render_notebook_page, render_source_page, RenderConfig, RenderedPage};
pub use scanner::{render_blocks, scan, DocScanner, ScanConfig, ScanOutput, ScanState, SourceLink};
pub use transcode::{
    assemble, cell_sources, disassemble, exported_code, merge_sources, render_source,
    sentinel_line_offsets, source_document,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
