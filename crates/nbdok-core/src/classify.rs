//! Cell classification
//!
//! A cell's role is derived solely from its type and the prefix of its
//! first source line. Empty cells carry no tag and take part in nothing.

use nbdok_ast::{Cell, CellType, Notebook};

/// First-line marker of a code cell exported to source text
pub const EXPORT_MARKER: &str = "#export";
/// First-line markers hiding a cell from every output
pub const HIDE_MARKERS: [&str; 2] = ["#hide", "<!-- hide -->"];
/// First-line marker of a conversion directive cell
pub const CONVERT_MARKER: &str = "#convert";
/// First-line marker of an example directive cell
pub const EXAMPLE_MARKER: &str = "#example";
/// Markdown first-line prefixes that make a notebook an example page
pub const EXAMPLE_SECTION_MARKERS: [&str; 2] = ["# Example", "#Example"];

/// Role of a non-empty cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellTag {
    /// Code written to the source file and scanned for docs
    CodeExport,
    /// Markdown written to the source file and the docs page
    MarkdownExport,
    /// Excluded from all outputs
    Hidden,
    /// Code rendered with its outputs on the docs page only
    Example,
    /// Directive cells (`#convert`, `#example`) with no output of their own
    None,
}

impl CellTag {
    /// Check if the cell takes part in source text
    pub fn is_exportable(self) -> bool {
        matches!(self, CellTag::CodeExport | CellTag::MarkdownExport)
    }
}

/// Classify a cell; `None` for cells without source.
pub fn classify(cell: &Cell) -> Option<CellTag> {
    let first = cell.first_line()?;
    let tag = match cell.cell_type {
        CellType::Code => {
            if first.starts_with(EXPORT_MARKER) {
                CellTag::CodeExport
            } else if starts_with_any(first, &HIDE_MARKERS) {
                CellTag::Hidden
            } else if first.starts_with(CONVERT_MARKER) || first.starts_with(EXAMPLE_MARKER) {
                CellTag::None
            } else {
                CellTag::Example
            }
        }
        CellType::Markdown => {
            if starts_with_any(first, &HIDE_MARKERS) {
                CellTag::Hidden
            } else {
                CellTag::MarkdownExport
            }
        }
    };
    Some(tag)
}

fn starts_with_any(line: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| line.starts_with(p))
}

/// Exportable cells in document order, paired with their dense index
pub fn exportable_cells(notebook: &Notebook) -> impl Iterator<Item = (usize, &Cell, CellTag)> {
    notebook
        .cells
        .iter()
        .filter_map(|cell| classify(cell).map(|tag| (cell, tag)))
        .filter(|(_, tag)| tag.is_exportable())
        .enumerate()
        .map(|(i, (cell, tag))| (i, cell, tag))
}

/// A notebook is source-convertible iff it has at least one code export cell
pub fn is_source_convertible(notebook: &Notebook) -> bool {
    notebook
        .cells
        .iter()
        .any(|c| classify(c) == Some(CellTag::CodeExport))
}

/// A notebook is doc-convertible iff it is source-convertible or has a
/// markdown export cell opening an example section.
pub fn is_doc_convertible(notebook: &Notebook) -> bool {
    is_source_convertible(notebook)
        || notebook.cells.iter().any(|c| {
            classify(c) == Some(CellTag::MarkdownExport)
                && c.first_line()
                    .is_some_and(|l| starts_with_any(l, &EXAMPLE_SECTION_MARKERS))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell_has_no_tag() {
        assert_eq!(classify(&Cell::code(Vec::<String>::new())), None);
        assert_eq!(classify(&Cell::markdown(Vec::<String>::new())), None);
    }

    #[test]
    fn test_code_cells() {
        assert_eq!(
            classify(&Cell::code(["#export\n", "x = 1"])),
            Some(CellTag::CodeExport)
        );
        assert_eq!(classify(&Cell::code(["#hide\n"])), Some(CellTag::Hidden));
        assert_eq!(classify(&Cell::code(["#convert"])), Some(CellTag::None));
        assert_eq!(classify(&Cell::code(["#example"])), Some(CellTag::None));
        assert_eq!(classify(&Cell::code(["print(1)"])), Some(CellTag::Example));
    }

    #[test]
    fn test_markdown_cells() {
        assert_eq!(
            classify(&Cell::markdown(["# Title\n"])),
            Some(CellTag::MarkdownExport)
        );
        assert_eq!(classify(&Cell::markdown(["#hide\n"])), Some(CellTag::Hidden));
        assert_eq!(
            classify(&Cell::markdown(["<!-- hide -->\n", "secret"])),
            Some(CellTag::Hidden)
        );
        // Export marker means nothing special in markdown
        assert_eq!(
            classify(&Cell::markdown(["#export"])),
            Some(CellTag::MarkdownExport)
        );
    }

    #[test]
    fn test_every_non_empty_cell_gets_exactly_one_tag() {
        let firsts = [
            "#export", "#hide", "<!-- hide -->", "#convert", "#example", "x = 1", "# T", "",
        ];
        for first in firsts {
            assert!(classify(&Cell::code([first])).is_some());
            assert!(classify(&Cell::markdown([first])).is_some());
        }
    }

    #[test]
    fn test_exportable_cells_dense_index() {
        let nb = Notebook::with_cells(
            "a.ipynb",
            vec![
                Cell::markdown(["# A\n"]),
                Cell::code(["print(1)"]),
                Cell::code(Vec::<String>::new()),
                Cell::code(["#export\n", "x = 1"]),
                Cell::markdown(["#hide"]),
                Cell::markdown(["text"]),
            ],
        );
        let indexed: Vec<_> = exportable_cells(&nb).map(|(i, _, tag)| (i, tag)).collect();
        assert_eq!(
            indexed,
            vec![
                (0, CellTag::MarkdownExport),
                (1, CellTag::CodeExport),
                (2, CellTag::MarkdownExport),
            ]
        );
    }

    #[test]
    fn test_convertibility() {
        let code = Notebook::with_cells("a.ipynb", vec![Cell::code(["#export\n", "x = 1"])]);
        assert!(is_source_convertible(&code));
        assert!(is_doc_convertible(&code));

        let example = Notebook::with_cells(
            "b.ipynb",
            vec![Cell::markdown(["# Example: Plots\n"]), Cell::code(["plot()"])],
        );
        assert!(!is_source_convertible(&example));
        assert!(is_doc_convertible(&example));

        let plain = Notebook::with_cells("c.ipynb", vec![Cell::markdown(["# Notes\n"])]);
        assert!(!is_source_convertible(&plain));
        assert!(!is_doc_convertible(&plain));
    }
}
