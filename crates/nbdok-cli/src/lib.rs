//! nbdok CLI - Command-line interface library
//!
//! This library provides the CLI functionality for nbdok:
//! - nb2py: Write annotated source files from notebooks
//! - py2nb: Merge edited source files back into their notebooks
//! - nb2doc: Render markdown documentation and its index
//! - nb2all: nb2py followed by nb2doc
//!
//! # Library Usage
//!
//! ```ignore
//! use nbdok_cli::{nb2doc_command, nb2py_command, Settings};
//!
//! let report = nb2py_command(root)?;
//! let report = nb2doc_command(root, &Settings::default(), false)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Export notebook code to source files
//! nbdok nb2py --root my-project
//!
//! # Regenerate the docs from scratch
//! nbdok nb2doc --clean
//!
//! # Bring source edits back into the notebooks
//! nbdok py2nb --verbose
//! ```

pub mod app;
pub mod config;
pub mod discover;

// Re-export main entry point and types
pub use app::{nb2all_command, nb2doc_command, nb2py_command, py2nb_command};
pub use app::{run_cli, BatchReport};
pub use config::{load_settings, DocsSettings, Settings};
pub use discover::ProjectFiles;
