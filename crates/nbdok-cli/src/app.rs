//! CLI Application logic
//!
//! Contains the command-line interface implementation. Every command runs
//! over all matching files of the project; a failure on one document is
//! logged and counted, and the batch carries on.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use nbdok_core::{
    assemble, build_index, disassemble, is_doc_convertible, is_source_convertible, merge_sources,
    render_notebook_page, render_source_page, to_json_string, Diagnostics, NotebookFile,
    PageEntry, PageLocation, RenderedPage,
};

use crate::config::{load_settings, Settings};
use crate::discover::{display_path, ProjectFiles, NOTEBOOK_EXT, SOURCE_EXT};

/// Name of the generated index page
pub const INDEX_FILE: &str = "README.md";

#[derive(Parser)]
#[command(name = "nbdok")]
#[command(author, version, about = "Notebooks as source, source as docs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Write a source file next to every notebook with exported code
    Nb2py,

    /// Generate markdown documentation and its index
    Nb2doc {
        /// Remove the docs directory first
        #[arg(long)]
        clean: bool,
    },

    /// Write edits made in generated source files back into their notebooks
    Py2nb,

    /// Run nb2py, then nb2doc
    Nb2all {
        /// Remove the docs directory first
        #[arg(long)]
        clean: bool,
    },
}

/// Outcome counts of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Documents written
    pub converted: usize,
    /// Documents with nothing to do
    pub skipped: usize,
    /// Documents that could not be converted
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, path: &Path, outcome: Result<bool>) {
        match outcome {
            Ok(true) => self.converted += 1,
            Ok(false) => {
                debug!("Skipped {}", path.display());
                self.skipped += 1;
            }
            Err(e) => {
                warn!("Failed to convert {}: {:#}", path.display(), e);
                self.failed += 1;
            }
        }
    }

    /// Add the counts of another batch
    pub fn merge(&mut self, other: BatchReport) {
        self.converted += other.converted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    fn log_summary(&self, command: &str) {
        info!(
            "{}: {} converted, {} skipped, {} failed",
            command, self.converted, self.skipped, self.failed
        );
    }
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !cli.root.is_dir() {
        anyhow::bail!("Project root not found: {}", cli.root.display());
    }
    let settings = load_settings(&cli.root, cli.config.as_deref())?;
    debug!("nbdok v{} in {}", nbdok_core::VERSION, cli.root.display());

    match cli.command {
        Commands::Nb2py => {
            nb2py_command(&cli.root)?;
        }
        Commands::Nb2doc { clean } => {
            nb2doc_command(&cli.root, &settings, clean)?;
        }
        Commands::Py2nb => {
            py2nb_command(&cli.root)?;
        }
        Commands::Nb2all { clean } => {
            nb2all_command(&cli.root, &settings, clean)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Write a file in one go, creating parent directories
fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write: {}", path.display()))
}

fn read_notebook(root: &Path, rel: &Path) -> Result<NotebookFile> {
    let path = root.join(rel);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read notebook: {}", path.display()))?;
    NotebookFile::parse(display_path(rel), &text)
        .with_context(|| format!("Failed to parse notebook: {}", path.display()))
}

fn log_diagnostics(diagnostics: Diagnostics) {
    for diag in diagnostics {
        warn!("{}", diag);
    }
}

/// Execute the nb2py command
pub fn nb2py_command(root: &Path) -> Result<BatchReport> {
    let files = ProjectFiles::discover(root)?;
    let mut report = BatchReport::default();

    for rel in &files.notebooks {
        report.record(rel, notebook_to_source(root, rel));
    }

    report.log_summary("nb2py");
    Ok(report)
}

fn notebook_to_source(root: &Path, rel: &Path) -> Result<bool> {
    let file = read_notebook(root, rel)?;
    if !is_source_convertible(file.notebook()) {
        return Ok(false);
    }

    let target = root.join(rel.with_extension(SOURCE_EXT));
    write_output(&target, assemble(file.notebook()))?;
    info!("Converted to py: {}", rel.display());
    Ok(true)
}

/// Execute the py2nb command
pub fn py2nb_command(root: &Path) -> Result<BatchReport> {
    let files = ProjectFiles::discover(root)?;
    let mut report = BatchReport::default();

    for rel in &files.generated_sources {
        report.record(rel, source_to_notebook(root, rel));
    }

    report.log_summary("py2nb");
    Ok(report)
}

fn source_to_notebook(root: &Path, rel: &Path) -> Result<bool> {
    let path = root.join(rel);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read source: {}", path.display()))?;
    let doc = disassemble(&text).with_context(|| format!("Malformed source: {}", path.display()))?;

    let nb_rel = rel.with_extension(NOTEBOOK_EXT);
    if doc.origin != display_path(&nb_rel) {
        debug!("{} was generated from {}", rel.display(), doc.origin);
    }

    let file = read_notebook(root, &nb_rel)?;
    let merged = merge_sources(file.notebook(), &doc)
        .with_context(|| format!("Cannot merge {} into {}", rel.display(), nb_rel.display()))?;
    if &merged == file.notebook() {
        return Ok(false);
    }

    let json = to_json_string(&file.with_notebook(&merged)?)?;
    write_output(&root.join(&nb_rel), json)?;
    info!("Converted to notebook: {}", rel.display());
    Ok(true)
}

/// Execute the nb2doc command
pub fn nb2doc_command(root: &Path, settings: &Settings, clean: bool) -> Result<BatchReport> {
    let docs_root = root.join(&settings.docs.dir);
    if (clean || settings.docs.clean) && docs_root.exists() {
        fs::remove_dir_all(&docs_root)
            .with_context(|| format!("Failed to remove: {}", docs_root.display()))?;
    }

    let files = ProjectFiles::discover(root)?;
    let mut report = BatchReport::default();
    let mut entries = Vec::new();

    for rel in &files.notebooks {
        let outcome = notebook_to_page(root, rel, settings)
            .and_then(|page| write_page(&docs_root, rel, page, settings, &mut entries));
        report.record(rel, outcome);
    }

    for rel in &files.pure_sources {
        let outcome = source_to_page(root, rel, settings)
            .and_then(|page| write_page(&docs_root, rel, page, settings, &mut entries));
        report.record(rel, outcome);
    }

    match build_index(&entries, &settings.index) {
        Some(index) => write_output(&docs_root.join(INDEX_FILE), index)?,
        None => info!("No titled pages, index not written"),
    }

    report.log_summary("nb2doc");
    Ok(report)
}

fn page_location(rel: &Path, settings: &Settings) -> PageLocation {
    PageLocation::new(display_path(&rel.with_extension("md")), &settings.docs.images_dir)
}

fn notebook_to_page(root: &Path, rel: &Path, settings: &Settings) -> Result<Option<RenderedPage>> {
    let file = read_notebook(root, rel)?;
    let notebook = file.notebook();
    if !is_doc_convertible(notebook) {
        return Ok(None);
    }

    let source_path = root.join(rel.with_extension(SOURCE_EXT));
    let assembled = if is_source_convertible(notebook) && source_path.exists() {
        Some(
            fs::read_to_string(&source_path)
                .with_context(|| format!("Failed to read source: {}", source_path.display()))?,
        )
    } else {
        None
    };

    Ok(Some(render_notebook_page(
        notebook,
        assembled.as_deref(),
        &page_location(rel, settings),
        &settings.scan,
        &settings.render_config(),
    )))
}

fn source_to_page(root: &Path, rel: &Path, settings: &Settings) -> Result<Option<RenderedPage>> {
    let path = root.join(rel);
    let source = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read source: {}", path.display()))?;
    let file_name = rel
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(render_source_page(
        &source,
        &file_name,
        &page_location(rel, settings),
        &settings.scan,
    ))
}

/// Store a page and its images, and remember it for the index
fn write_page(
    docs_root: &Path,
    rel: &Path,
    page: Option<RenderedPage>,
    settings: &Settings,
    entries: &mut Vec<PageEntry>,
) -> Result<bool> {
    let Some(page) = page else {
        return Ok(false);
    };
    let page_rel = rel.with_extension("md");
    let images_root = docs_root.join(&settings.docs.images_dir);

    for (name, bytes) in &page.images {
        let path = images_root.join(name);
        // Same name, same bytes
        if !path.exists() {
            write_output(&path, bytes)?;
        }
    }
    write_output(&docs_root.join(&page_rel), &page.text)?;
    log_diagnostics(page.diagnostics);

    info!("Converted to md: {}", rel.display());
    entries.push(PageEntry::new(display_path(&page_rel), page.title));
    Ok(true)
}

/// Execute the nb2all command
pub fn nb2all_command(root: &Path, settings: &Settings, clean: bool) -> Result<BatchReport> {
    let mut report = nb2py_command(root)?;
    report.merge(nb2doc_command(root, settings, clean)?);
    Ok(report)
}
