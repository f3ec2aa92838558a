//! Documentation page rendering
//!
//! Turns a notebook (plus its assembled source text, when one exists) or a
//! plain source file into one markdown page. Rendering is pure: decoded
//! images are returned keyed by their content-addressed file name and the
//! caller decides where to store them.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use nbdok_ast::{Cell, DocBlock, DocLine, Notebook, Output};

use crate::classify::{classify, CellTag};
use crate::diagnostics::{Diagnostic, Diagnostics, INVALID_IMAGE};
use crate::links::PageLocation;
use crate::scanner::{self, collapse_blank_lines, ScanConfig, SourceLink, MODULE_DOC_OPEN};
use crate::transcode::{exported_code, sentinel_line_offsets};

/// Prefix of the heading line that names a page
pub const TITLE_PREFIX: &str = "# ";

/// Rendering options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Language tag of fenced example code
    pub code_language: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            code_language: "python".to_string(),
        }
    }
}

/// A rendered documentation page
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    /// Markdown text, ending with exactly one newline
    pub text: String,
    /// First `# ` heading, if any; untitled pages stay out of the index
    pub title: Option<String>,
    /// Decoded PNG images keyed by file name
    pub images: BTreeMap<String, Vec<u8>>,
    pub diagnostics: Diagnostics,
}

/// Remove ANSI escape sequences
pub fn strip_ansi(text: &str) -> String {
    static ANSI_RE: OnceLock<Regex> = OnceLock::new();
    let re = ANSI_RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());
    re.replace_all(text, "").into_owned()
}

/// Content-addressed file name of an image: lowercase SHA-256 hex + `.png`
pub fn image_file_name(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!(
        "{}.png",
        digest.iter().map(|b| format!("{:02x}", b)).collect::<String>()
    )
}

/// Decode a base64 image payload, ignoring embedded line breaks
pub fn decode_image(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = payload.split_whitespace().collect();
    STANDARD.decode(compact)
}

/// First `# ` heading line of the notebook's exported markdown
pub fn notebook_title(notebook: &Notebook) -> Option<String> {
    notebook
        .cells
        .iter()
        .filter(|cell| classify(cell) == Some(CellTag::MarkdownExport))
        .flat_map(|cell| cell.source.iter())
        .find_map(|line| line.strip_prefix(TITLE_PREFIX))
        .map(|title| title.trim_end().to_string())
}

/// Title of a plain source file: the `# ` line right after its first
/// module doc opener
pub fn source_title(source: &str) -> Option<String> {
    let mut lines = source.lines();
    while let Some(line) = lines.next() {
        if line.starts_with(MODULE_DOC_OPEN) {
            return lines
                .next()
                .and_then(|next| next.strip_prefix(TITLE_PREFIX))
                .map(|title| title.trim_end().to_string());
        }
    }
    None
}

/// Accumulates one page
struct PageWriter<'a> {
    location: &'a PageLocation,
    scan: &'a ScanConfig,
    text: String,
    images: BTreeMap<String, Vec<u8>>,
    diagnostics: Diagnostics,
    file: String,
}

impl<'a> PageWriter<'a> {
    fn new(location: &'a PageLocation, scan: &'a ScanConfig, file: impl Into<String>) -> Self {
        Self {
            text: format!("[Back to Overview]({})\n\n", location.back_link()),
            location,
            scan,
            images: BTreeMap::new(),
            diagnostics: Diagnostics::new(),
            file: file.into(),
        }
    }

    fn push_markdown(&mut self, cell: &Cell) {
        self.text.push_str(&self.location.rewrite_links(&cell.text()));
        self.text.push_str("\n\n");
    }

    fn push_docs(&mut self, source: &str, link: Option<&SourceLink>) {
        let output = scanner::scan(source, self.scan, link);
        let blocks: Vec<DocBlock> = output
            .blocks
            .into_iter()
            .map(|block| self.rewrite_block(block))
            .collect();

        self.text.push_str(&scanner::render_blocks(&blocks));
        self.text.push('\n');
        for diag in output.diagnostics {
            self.diagnostics.push(diag.with_file(self.file.clone()));
        }
    }

    fn rewrite_block(&self, mut block: DocBlock) -> DocBlock {
        for line in &mut block.lines {
            match line {
                DocLine::Text(text)
                | DocLine::Param {
                    description: text, ..
                }
                | DocLine::Returns {
                    description: text, ..
                } => *text = self.location.rewrite_links(text),
                DocLine::Missing => {}
            }
        }
        block
    }

    fn push_example(&mut self, cell: &Cell, config: &RenderConfig) {
        self.text.push_str("\nExample:\n");
        self.text.push_str(&format!("```{}\n", config.code_language));
        self.text.push_str(&cell.text());
        self.text.push_str("\n```\n");

        let mut console = String::new();
        let mut images = Vec::new();
        for output in &cell.outputs {
            match output {
                Output::Text(lines) => console.push_str(&strip_ansi(&lines.concat())),
                Output::Error(lines) => {
                    for line in lines {
                        console.push_str(&strip_ansi(line));
                        console.push('\n');
                    }
                }
                Output::Image(payload) => images.push(payload),
            }
        }

        if !console.is_empty() {
            if !console.ends_with('\n') {
                console.push('\n');
            }
            self.text.push_str("\nOutput:\n```\n");
            self.text.push_str(&console);
            self.text.push_str("```\n");
        }

        for payload in images {
            match decode_image(payload) {
                Ok(bytes) => {
                    let name = image_file_name(&bytes);
                    self.text.push_str(&format!(
                        "![data]({})\n",
                        self.location.image_link(&name)
                    ));
                    self.images.entry(name).or_insert(bytes);
                }
                Err(e) => self.diagnostics.push(
                    Diagnostic::warning(format!("Image output is not valid base64: {}", e))
                        .with_code(INVALID_IMAGE)
                        .with_file(self.file.clone()),
                ),
            }
        }
        self.text.push_str("\n\n");
    }

    fn finish(self, title: Option<String>) -> RenderedPage {
        let collapsed = collapse_blank_lines(&self.text);
        let mut text = collapsed.trim_start_matches('\n').trim_end().to_string();
        text.push('\n');

        RenderedPage {
            text,
            title,
            images: self.images,
            diagnostics: self.diagnostics,
        }
    }
}

/// Render a notebook page.
///
/// `assembled` is the notebook's generated source text; when present,
/// definition headings link to their line in it.
pub fn render_notebook_page(
    notebook: &Notebook,
    assembled: Option<&str>,
    location: &PageLocation,
    scan: &ScanConfig,
    config: &RenderConfig,
) -> RenderedPage {
    let source_file = assembled.and_then(|_| {
        Path::new(&notebook.path)
            .with_extension("py")
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    });
    let offsets = assembled.map(sentinel_line_offsets).unwrap_or_default();

    let mut writer = PageWriter::new(location, scan, notebook.path.clone());
    let mut export_index = 0;

    for cell in &notebook.cells {
        let Some(tag) = classify(cell) else {
            continue;
        };
        match tag {
            CellTag::CodeExport => {
                let link = source_file
                    .as_deref()
                    .zip(offsets.get(&export_index))
                    .map(|(file, &offset)| SourceLink::new(location.source_link(file), offset));
                writer.push_docs(&exported_code(cell), link.as_ref());
            }
            CellTag::MarkdownExport => writer.push_markdown(cell),
            CellTag::Example => writer.push_example(cell, config),
            CellTag::Hidden | CellTag::None => {}
        }
        if tag.is_exportable() {
            export_index += 1;
        }
    }

    writer.finish(notebook_title(notebook))
}

/// Render a plain source file; `None` if it has no title.
///
/// `file_name` is the source's file name, linked from definition headings.
pub fn render_source_page(
    source: &str,
    file_name: &str,
    location: &PageLocation,
    scan: &ScanConfig,
) -> Option<RenderedPage> {
    let title = source_title(source)?;
    let link = SourceLink::new(location.source_link(file_name), 0);

    let mut writer = PageWriter::new(location, scan, file_name);
    writer.push_docs(source, Some(&link));
    Some(writer.finish(Some(title)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcode::assemble;

    // 1x1 transparent PNG
    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn location() -> PageLocation {
        PageLocation::new("pkg/mod.md", "nbdok_images")
    }

    fn render(nb: &Notebook, assembled: Option<&str>) -> RenderedPage {
        render_notebook_page(
            nb,
            assembled,
            &location(),
            &ScanConfig::default(),
            &RenderConfig::default(),
        )
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\u{1b}[0;31mValueError\u{1b}[0m: bad"), "ValueError: bad");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_image_file_name() {
        let name = image_file_name(b"abc");
        assert_eq!(
            name,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.png"
        );
    }

    #[test]
    fn test_decode_image_ignores_line_breaks() {
        assert_eq!(decode_image("YW\nJj\n").unwrap(), b"abc");
        assert!(decode_image("not base64!").is_err());
    }

    #[test]
    fn test_notebook_page() {
        let nb = Notebook::with_cells(
            "pkg/mod.ipynb",
            vec![
                Cell::markdown(["# Module Title\n", "\n", "See ![fig](fig.png)."]),
                Cell::code([
                    "#export\n",
                    "def add(a, b):\n",
                    "    \"\"\"\n",
                    "    Adds.\n",
                    "\n",
                    "    :param a: first\n",
                    "    :return: sum\n",
                    "    \"\"\"\n",
                    "    return a + b",
                ]),
                Cell::markdown(["#hide\n", "secret"]),
                Cell::code(["print(add(1, 2))"])
                    .with_output(Output::Text(vec!["3\n".to_string()])),
            ],
        );
        let assembled = assemble(&nb);
        let page = render(&nb, Some(&assembled));

        assert_eq!(page.title.as_deref(), Some("Module Title"));
        assert!(page.text.starts_with("[Back to Overview](../README.md)\n\n# Module Title\n"));
        assert!(page.text.contains("See ![fig](../../pkg/fig.png)."));
        assert!(page
            .text
            .contains("#### *def* **add** [[src]](../../pkg/mod.py#L13)\nAdds.\n\n* **a**: first\n* **returns**: sum\n"));
        assert!(page.text.contains(
            "Example:\n```python\nprint(add(1, 2))\n```\n\nOutput:\n```\n3\n```\n"
        ));
        assert!(!page.text.contains("secret"));
        assert!(page.text.ends_with("```\n"));
        assert!(!page.text.contains("\n\n\n"));

        // The linked line is the `def` line of the assembled source
        let lines: Vec<&str> = assembled.lines().collect();
        assert_eq!(lines[12], "def add(a, b):");
    }

    #[test]
    fn test_source_link_after_long_blank_run() {
        let nb = Notebook::with_cells(
            "pkg/mod.ipynb",
            vec![Cell::code([
                "#export\n",
                "x = 1\n",
                "\n",
                "\n",
                "\n",
                "\n",
                "def f():\n",
                "    \"\"\"F.\"\"\"",
            ])],
        );
        let assembled = assemble(&nb);
        let page = render(&nb, Some(&assembled));

        assert!(page.text.contains("#### *def* **f** [[src]](../../pkg/mod.py#L8)\n"));
        let lines: Vec<&str> = assembled.lines().collect();
        assert_eq!(lines[7], "def f():");
    }

    #[test]
    fn test_notebook_page_without_source_has_no_links() {
        let nb = Notebook::with_cells(
            "mod.ipynb",
            vec![Cell::code(["#export\n", "def f():\n", "    \"\"\"F.\"\"\""])],
        );
        let page = render(&nb, None);
        assert!(page.text.contains("#### *def* **f**\nF.\n"));
        assert!(!page.text.contains("[[src]]"));
        assert_eq!(page.title, None);
    }

    #[test]
    fn test_example_outputs_and_images() {
        let nb = Notebook::with_cells(
            "plots.ipynb",
            vec![
                Cell::markdown(["# Example: Plots"]),
                Cell::code(["plot()"])
                    .with_output(Output::Image(PNG.to_string()))
                    .with_output(Output::Error(vec![
                        "\u{1b}[31mTraceback\u{1b}[0m".to_string(),
                        "Boom".to_string(),
                    ])),
                Cell::code(["plot()  # again"]).with_output(Output::Image(PNG.to_string())),
                Cell::code(["broken()"]).with_output(Output::Image("***".to_string())),
            ],
        );
        let page = render(&nb, None);

        assert_eq!(page.images.len(), 1);
        let name = page.images.keys().next().unwrap().clone();
        assert_eq!(name.len(), 64 + 4);
        assert_eq!(page.text.matches(&format!("![data](../nbdok_images/{})", name)).count(), 2);
        assert!(page.text.contains("Output:\n```\nTraceback\nBoom\n```\n"));

        let codes: Vec<_> = page.diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
        assert_eq!(codes, vec![INVALID_IMAGE]);
    }

    #[test]
    fn test_example_without_output() {
        let nb = Notebook::with_cells("a.ipynb", vec![Cell::code(["x = 1"])]);
        let page = render(&nb, None);
        assert!(page.text.contains("Example:\n```python\nx = 1\n```\n"));
        assert!(!page.text.contains("Output:"));
    }

    #[test]
    fn test_code_language() {
        let nb = Notebook::with_cells("a.ipynb", vec![Cell::code(["x = 1"])]);
        let config = RenderConfig {
            code_language: "py".to_string(),
        };
        let page = render_notebook_page(&nb, None, &location(), &ScanConfig::default(), &config);
        assert!(page.text.contains("```py\nx = 1"));
    }

    #[test]
    fn test_doc_text_links_rewritten() {
        let nb = Notebook::with_cells(
            "pkg/mod.ipynb",
            vec![Cell::code([
                "#export\n",
                "def f():\n",
                "    \"\"\"See [guide](guide.md).\"\"\"",
            ])],
        );
        let page = render(&nb, None);
        assert!(page.text.contains("See [guide](../../pkg/guide.md)."));
    }

    #[test]
    fn test_bullet_links_rewritten() {
        let nb = Notebook::with_cells(
            "pkg/mod.ipynb",
            vec![Cell::code([
                "#export\n",
                "def load(cfg):\n",
                "    \"\"\"\n",
                "    :param cfg: see [format](config.md)\n",
                "    :return: a [Table](table.md#rows)\n",
                "    \"\"\"",
            ])],
        );
        let page = render(&nb, None);
        assert!(page.text.contains("* **cfg**: see [format](../../pkg/config.md)\n"));
        assert!(page.text.contains("* **returns**: a [Table](../../pkg/table.md#rows)\n"));
    }

    #[test]
    fn test_scanner_diagnostics_carry_file() {
        let nb = Notebook::with_cells(
            "pkg/mod.ipynb",
            vec![Cell::code([
                "#export\n",
                "def f(x):\n",
                "    \"\"\"\n",
                "    :type x: int\n",
                "    \"\"\"",
            ])],
        );
        let page = render(&nb, None);
        let diag = page.diagnostics.iter().next().unwrap();
        assert_eq!(diag.file.as_deref(), Some("pkg/mod.ipynb"));
        assert_eq!(diag.line, Some(4));
    }

    #[test]
    fn test_source_page() {
        let source = "\"\"\"doc\n# Tool\n\nHelpers.\n\"\"\"\n\ndef run():\n    \"\"\"Runs.\"\"\"\n";
        let loc = PageLocation::new("pkg/tool.md", "img");
        let page = render_source_page(source, "tool.py", &loc, &ScanConfig::default()).unwrap();

        assert_eq!(page.title.as_deref(), Some("Tool"));
        assert_eq!(
            page.text,
            "[Back to Overview](../README.md)\n\n# Tool\n\nHelpers.\n\n#### *def* **run** [[src]](../../pkg/tool.py#L7)\nRuns.\n"
        );
    }

    #[test]
    fn test_source_page_without_title() {
        let source = "def run():\n    \"\"\"Runs.\"\"\"\n";
        let loc = PageLocation::new("tool.md", "img");
        assert!(render_source_page(source, "tool.py", &loc, &ScanConfig::default()).is_none());
    }
}
