//! Notebook JSON codec
//!
//! Reads the `.ipynb` JSON tree into an immutable [`Notebook`] while keeping
//! the original tree, so that writing back only touches cell sources that
//! actually changed. Metadata, ids and execution counts survive untouched.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use nbdok_ast::{Cell, CellType, Notebook, Output};

use crate::error::{NbdokError, Result};

/// A parsed notebook together with the JSON tree it came from
#[derive(Debug, Clone)]
pub struct NotebookFile {
    raw: Value,
    notebook: Notebook,
    /// Position in the raw `cells` array of each notebook cell
    raw_positions: Vec<usize>,
}

impl NotebookFile {
    /// Parse notebook JSON text
    pub fn parse(path: impl Into<String>, text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(path, raw)
    }

    /// Build from an already-parsed JSON tree
    pub fn from_value(path: impl Into<String>, raw: Value) -> Result<Self> {
        let cells = raw
            .get("cells")
            .and_then(Value::as_array)
            .ok_or_else(|| NbdokError::InvalidNotebook("missing 'cells' array".to_string()))?;

        let mut notebook = Notebook::new(path);
        let mut raw_positions = Vec::with_capacity(cells.len());

        for (pos, cell) in cells.iter().enumerate() {
            let cell_type = match cell.get("cell_type").and_then(Value::as_str) {
                Some("code") => CellType::Code,
                Some("markdown") => CellType::Markdown,
                // Raw cells never take part in conversion
                Some(_) => continue,
                None => {
                    return Err(NbdokError::InvalidNotebook(format!(
                        "cell {} has no 'cell_type'",
                        pos
                    )))
                }
            };

            notebook.push(Cell {
                cell_type,
                source: cell.get("source").map(source_lines).unwrap_or_default(),
                outputs: cell
                    .get("outputs")
                    .and_then(Value::as_array)
                    .map(|outputs| outputs.iter().flat_map(parse_output).collect())
                    .unwrap_or_default(),
            });
            raw_positions.push(pos);
        }

        Ok(Self {
            raw,
            notebook,
            raw_positions,
        })
    }

    /// The parsed notebook
    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    /// The original JSON tree
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Derive a new JSON tree carrying the cell sources of `updated`.
    ///
    /// Only cells whose source differs from the parsed notebook are
    /// rewritten; `updated` must have the same cells in the same order.
    pub fn with_notebook(&self, updated: &Notebook) -> Result<Value> {
        if updated.len() != self.notebook.len() {
            return Err(NbdokError::InvalidNotebook(format!(
                "expected {} cells, got {}",
                self.notebook.len(),
                updated.len()
            )));
        }

        let mut raw = self.raw.clone();
        let cells = raw
            .get_mut("cells")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| NbdokError::InvalidNotebook("missing 'cells' array".to_string()))?;

        let changed = self
            .notebook
            .cells
            .iter()
            .zip(&updated.cells)
            .zip(&self.raw_positions)
            .filter(|((old, new), _)| old.source != new.source);

        for ((_, new), &pos) in changed {
            if let Some(obj) = cells.get_mut(pos).and_then(Value::as_object_mut) {
                obj.insert(
                    "source".to_string(),
                    Value::Array(new.source.iter().cloned().map(Value::String).collect()),
                );
            }
        }

        Ok(raw)
    }
}

/// Serialize a notebook tree with one-space indentation and a trailing newline
pub fn to_json_string(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| NbdokError::InvalidNotebook(e.to_string()))
}

/// Notebook text fields are either one string or a list of lines
fn source_lines(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s.split_inclusive('\n').map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn joined(value: &Value) -> String {
    source_lines(value).concat()
}

fn parse_output(output: &Value) -> Vec<Output> {
    let mut parsed = Vec::new();
    let Some(obj) = output.as_object() else {
        return parsed;
    };

    if let Some(text) = obj.get("text") {
        parsed.push(Output::Text(source_lines(text)));
    }

    if let Some(data) = obj.get("data").and_then(Value::as_object) {
        parse_data(data, &mut parsed);
    }

    if let Some(traceback) = obj.get("traceback") {
        parsed.push(Output::Error(source_lines(traceback)));
    }

    parsed
}

fn parse_data(data: &Map<String, Value>, parsed: &mut Vec<Output>) {
    if let Some(png) = data.get("image/png") {
        parsed.push(Output::Image(joined(png)));
    } else if let Some(plain) = data.get("text/plain") {
        parsed.push(Output::Text(source_lines(plain)));
    }
}
