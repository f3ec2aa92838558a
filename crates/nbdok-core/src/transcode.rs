//! Code transcoder
//!
//! Converts between the exportable cells of a notebook and a flat source
//! file. The source file layout is:
//!
//! ```text
//! # AUTOGENERATED FROM: pkg/mod.ipynb
//!
//!
//! #%% Cell: 0
//! """doc
//! # Module title
//! """
//!
//!
//! #%% Cell: 1
//! def f():
//!     pass
//! ```
//!
//! Cells are separated by exactly two blank lines and the file ends with a
//! single newline. Sentinel indices are dense over the exportable cells and
//! are the join key when the text is read back into the notebook.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use nbdok_ast::{Cell, CellType, Notebook, Segment, SegmentKind, SourceDocument};

use crate::classify::{classify, CellTag, EXPORT_MARKER};
use crate::error::FormatError;

/// Prefix of the provenance header line
pub const HEADER_PREFIX: &str = "# AUTOGENERATED FROM: ";
/// Prefix of a cell sentinel line
pub const SENTINEL_PREFIX: &str = "#%% Cell: ";
/// Line opening a markdown cell in source text
pub const DOC_FENCE_OPEN: &str = "\"\"\"doc";
/// Line closing a markdown cell in source text
pub const DOC_FENCE_CLOSE: &str = "\"\"\"";

/// Maximum run of consecutive blank lines in generated source
const MAX_BLANK_RUN: usize = 2;

/// Build the sentinel line for a dense cell index
pub fn sentinel(index: usize) -> String {
    format!("{}{}", SENTINEL_PREFIX, index)
}

/// Parse a sentinel line, returning its index
pub fn parse_sentinel(line: &str) -> Option<usize> {
    static SENTINEL_RE: OnceLock<Regex> = OnceLock::new();
    let re = SENTINEL_RE.get_or_init(|| Regex::new(r"^#%% Cell: (\d+)$").unwrap());

    re.captures(line.trim_end())
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Split cell text into lines and drop the trailing blank ones
fn content_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    while lines.last().is_some_and(|l| is_blank(l)) {
        lines.pop();
    }
    lines
}

/// Cell lines as written below the sentinel: trailing blank lines
/// dropped and blank runs capped
fn segment_lines(text: &str) -> Vec<String> {
    // The sentinel line is never blank, so capping restarts at each cell
    let mut writer = LineWriter::new();
    for line in content_lines(text) {
        writer.push(&line);
    }
    writer.lines
}

/// Text of an exported code cell, without the export marker line
fn code_body(cell: &Cell) -> String {
    let text = cell.text();
    text.split_once('\n')
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_default()
}

/// An exported code cell as it appears in assembled source.
///
/// The first line stands in for the sentinel, so line `i` of the result
/// is `i` lines below the cell's sentinel.
pub fn exported_code(cell: &Cell) -> String {
    let mut lines = vec![EXPORT_MARKER.to_string()];
    lines.extend(segment_lines(&code_body(cell)));
    lines.join("\n")
}

/// Build the indexed source document for a notebook's exportable cells
pub fn source_document(notebook: &Notebook) -> SourceDocument {
    let mut doc = SourceDocument::new(notebook.path.clone());

    for cell in &notebook.cells {
        let index = doc.len();
        match classify(cell) {
            // The export marker line is replaced by the sentinel
            Some(CellTag::CodeExport) => {
                doc.push(Segment::code(index, segment_lines(&code_body(cell))))
            }
            Some(CellTag::MarkdownExport) => {
                doc.push(Segment::doc_comment(index, segment_lines(&cell.text())))
            }
            _ => {}
        }
    }

    doc
}

/// Render a source document as text
pub fn render_source(doc: &SourceDocument) -> String {
    let mut writer = LineWriter::new();
    writer.push(&format!("{}{}", HEADER_PREFIX, doc.origin));

    for segment in &doc.segments {
        writer.separate();
        writer.push(&sentinel(segment.index));
        match segment.kind {
            SegmentKind::Code => {
                for line in &segment.lines {
                    writer.push(line);
                }
            }
            SegmentKind::DocComment => {
                writer.push(DOC_FENCE_OPEN);
                for line in &segment.lines {
                    writer.push(line);
                }
                writer.push(DOC_FENCE_CLOSE);
            }
        }
    }

    writer.finish()
}

/// Assemble the exportable cells of a notebook into annotated source text
pub fn assemble(notebook: &Notebook) -> String {
    render_source(&source_document(notebook))
}

/// Split annotated source text back into indexed segments
pub fn disassemble(text: &str) -> Result<SourceDocument, FormatError> {
    let mut lines = text.split('\n');
    let header = lines.next().unwrap_or_default();
    let origin = header
        .strip_prefix(HEADER_PREFIX)
        .ok_or(FormatError::MissingHeader(HEADER_PREFIX))?;

    let mut doc = SourceDocument::new(origin.trim_end());
    let mut current: Option<(usize, Vec<&str>)> = None;

    for (n, line) in lines.enumerate() {
        if let Some(found) = parse_sentinel(line) {
            if let Some((index, buf)) = current.take() {
                doc.push(segment_from_lines(index, buf));
            }
            let expected = doc.len();
            if found != expected {
                return Err(FormatError::SentinelOutOfOrder {
                    expected,
                    found,
                    line: n + 2,
                });
            }
            current = Some((found, Vec::new()));
        } else if let Some((_, ref mut buf)) = current {
            buf.push(line);
        }
    }

    if let Some((index, buf)) = current.take() {
        doc.push(segment_from_lines(index, buf));
    }

    Ok(doc)
}

fn segment_from_lines(index: usize, mut lines: Vec<&str>) -> Segment {
    while lines.last().is_some_and(|l| is_blank(l)) {
        lines.pop();
    }

    let fenced = lines.len() >= 2
        && lines[0].trim_end() == DOC_FENCE_OPEN
        && lines[lines.len() - 1].trim_end() == DOC_FENCE_CLOSE;

    if fenced {
        let inner = lines[1..lines.len() - 1].iter().map(|l| l.to_string());
        Segment::doc_comment(index, inner.collect())
    } else {
        Segment::code(index, lines.into_iter().map(str::to_string).collect())
    }
}

/// Notebook source for a code cell restored from its segment lines
fn code_cell_source(lines: &[String]) -> Vec<String> {
    let restored = Segment::code(0, lines.to_vec()).terminated_lines();
    if restored.is_empty() {
        return vec![EXPORT_MARKER.to_string()];
    }
    let mut source = Vec::with_capacity(restored.len() + 1);
    source.push(format!("{}\n", EXPORT_MARKER));
    source.extend(restored);
    source
}

/// Notebook source for a markdown cell restored from its segment
fn doc_cell_source(segment: &Segment) -> Vec<String> {
    let restored = segment.terminated_lines();
    if restored.is_empty() {
        // An empty source would no longer be exported
        return vec![String::new()];
    }
    restored
}

fn fenced_lines(segment: &Segment) -> Vec<String> {
    let mut lines = Vec::with_capacity(segment.lines.len() + 2);
    lines.push(DOC_FENCE_OPEN.to_string());
    lines.extend(segment.lines.iter().cloned());
    lines.push(DOC_FENCE_CLOSE.to_string());
    lines
}

/// Notebook cell sources for every segment, in index order
pub fn cell_sources(doc: &SourceDocument) -> Vec<Vec<String>> {
    doc.segments
        .iter()
        .map(|segment| match segment.kind {
            SegmentKind::Code => code_cell_source(&segment.lines),
            SegmentKind::DocComment => doc_cell_source(segment),
        })
        .collect()
}

fn kind_name(cell_type: CellType) -> &'static str {
    match cell_type {
        CellType::Code => "code",
        CellType::Markdown => "markdown",
    }
}

/// Derive a new notebook whose exportable cells take their sources from
/// `doc`; every other cell is carried over unchanged.
pub fn merge_sources(notebook: &Notebook, doc: &SourceDocument) -> Result<Notebook, FormatError> {
    let positions: Vec<usize> = notebook
        .cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| classify(cell).is_some_and(CellTag::is_exportable))
        .map(|(pos, _)| pos)
        .collect();

    if positions.len() != doc.len() {
        return Err(FormatError::CellCountMismatch {
            expected: positions.len(),
            found: doc.len(),
        });
    }

    let mut cells: Vec<Cell> = notebook.cells.clone();
    for (segment, &pos) in doc.segments.iter().zip(&positions) {
        let cell = &notebook.cells[pos];
        let source = match (cell.cell_type, segment.kind) {
            (CellType::Code, SegmentKind::Code) => code_cell_source(&segment.lines),
            // Code that happens to look like a fenced doc comment
            (CellType::Code, SegmentKind::DocComment) => code_cell_source(&fenced_lines(segment)),
            (CellType::Markdown, SegmentKind::DocComment) => {
                if segment.lines.is_empty() && cell.source.iter().all(|l| is_blank(l)) {
                    cell.source.clone()
                } else {
                    doc_cell_source(segment)
                }
            }
            (CellType::Markdown, SegmentKind::Code) => {
                return Err(FormatError::CellKindMismatch {
                    index: segment.index,
                    cell: kind_name(cell.cell_type),
                    segment: "code",
                });
            }
        };
        cells[pos] = cell.with_source(source);
    }

    Ok(Notebook::with_cells(notebook.path.clone(), cells))
}

/// 0-based line of each sentinel in assembled text, keyed by cell index
pub fn sentinel_line_offsets(text: &str) -> BTreeMap<usize, usize> {
    text.split('\n')
        .enumerate()
        .filter_map(|(line, l)| parse_sentinel(l).map(|index| (index, line)))
        .collect()
}
