//! Doc scanner
//!
//! A single-pass, line-oriented scanner that finds public `def`/`class`
//! definitions and the structured doc blocks attached to them, producing
//! [`DocBlock`]s. It relies on line prefixes and indentation only.
//!
//! The scanner is a three-state machine plus one flag tracking whether the
//! current position is inside a triple-quoted literal:
//!
//! | state               | event                                  | next                |
//! |---------------------|----------------------------------------|---------------------|
//! | `Seeking`           | public definition                      | `DocHeaderExpected` |
//! | `Seeking`           | `"""doc` opening a literal             | `ReadingDoc`        |
//! | `DocHeaderExpected` | `"""` opening a literal                | `ReadingDoc`        |
//! | `DocHeaderExpected` | `"""..."""` on one line                | `Seeking`           |
//! | `DocHeaderExpected` | definition / `"""doc` / end of input   | placeholder emitted |
//! | `ReadingDoc`        | line containing `"""`                  | `Seeking`           |
//! | `ReadingDoc`        | any other line                         | `ReadingDoc`        |

use serde::{Deserialize, Serialize};

use nbdok_ast::{DocBlock, DocLine};

use crate::diagnostics::{
    Diagnostic, Diagnostics, RTYPE_WITHOUT_RETURN, TRAILING_AFTER_CLOSE, TYPE_WITHOUT_PARAM,
    UNTERMINATED_DOC,
};

/// Triple-quote literal marker
pub const TRIPLE_QUOTE: &str = "\"\"\"";
/// Opening marker of a module-level doc block
pub const MODULE_DOC_OPEN: &str = "\"\"\"doc";

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Columns per nesting level
    pub indent_unit: usize,
    /// Heading depth added on top of the nesting level
    pub heading_base: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            indent_unit: 4,
            heading_base: 3,
        }
    }
}

/// Where definition headers link to in the generated source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    /// Link target, relative to the rendered page
    pub path: String,
    /// 0-based line in the target of the scanned text's first line
    pub line_offset: usize,
}

impl SourceLink {
    pub fn new(path: impl Into<String>, line_offset: usize) -> Self {
        Self {
            path: path.into(),
            line_offset,
        }
    }
}

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the next definition or module doc
    Seeking,
    /// A definition header was emitted; its doc block may follow
    DocHeaderExpected,
    /// Inside an open doc block whose opening line sat at `indent`
    ReadingDoc { indent: usize },
}

/// Result of scanning one source text
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub blocks: Vec<DocBlock>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefinitionKind {
    Def,
    AsyncDef,
    Class,
}

impl DefinitionKind {
    fn label(self) -> &'static str {
        match self {
            DefinitionKind::Def => "def",
            DefinitionKind::AsyncDef => "async def",
            DefinitionKind::Class => "class",
        }
    }
}

/// A definition line, already de-indented
#[derive(Debug, Clone, PartialEq, Eq)]
struct Definition<'a> {
    kind: DefinitionKind,
    name: &'a str,
    /// Parenthesized base list of a class, verbatim
    bases: &'a str,
}

impl<'a> Definition<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let (kind, rest) = if let Some(rest) = line.strip_prefix("def ") {
            (DefinitionKind::Def, rest)
        } else if let Some(rest) = line.strip_prefix("async def ") {
            (DefinitionKind::AsyncDef, rest)
        } else if let Some(rest) = line.strip_prefix("class ") {
            (DefinitionKind::Class, rest)
        } else {
            return None;
        };

        let rest = rest.trim_start();
        let name_end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() {
            return None;
        }

        let bases = match kind {
            DefinitionKind::Class => parenthesized(&rest[name_end..]),
            _ => "",
        };

        Some(Self { kind, name, bases })
    }

    fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// The `(...)` group at the start of `text`, up to its matching `)`
fn parenthesized(text: &str) -> &str {
    if !text.starts_with('(') {
        return "";
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &text[..=i];
                }
            }
            _ => {}
        }
    }
    // Base list continues on the next line
    text.trim_end().trim_end_matches(':')
}

/// Strip up to `indent` leading whitespace bytes
fn dedent(line: &str, indent: usize) -> &str {
    let strip = line
        .bytes()
        .take(indent)
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    &line[strip..]
}

fn is_module_doc_open(line: &str) -> bool {
    line.strip_prefix(MODULE_DOC_OPEN).is_some_and(|rest| {
        rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with(TRIPLE_QUOTE)
    })
}

/// `name: rest` split at the first colon
fn split_field(text: &str) -> (&str, &str) {
    match text.find(':') {
        Some(pos) => (text[..pos].trim(), &text[pos + 1..]),
        None => (text.trim(), ""),
    }
}

/// Line-oriented doc scanner
pub struct DocScanner<'a> {
    config: &'a ScanConfig,
    link: Option<&'a SourceLink>,
    state: ScanState,
    in_literal: bool,
    blocks: Vec<DocBlock>,
    diagnostics: Diagnostics,
}

impl<'a> DocScanner<'a> {
    /// Create a scanner
    pub fn new(config: &'a ScanConfig) -> Self {
        Self {
            config,
            link: None,
            state: ScanState::Seeking,
            in_literal: false,
            blocks: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Append source links to definition headers
    pub fn with_link(mut self, link: Option<&'a SourceLink>) -> Self {
        self.link = link;
        self
    }

    /// Current state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Whether the scanner is inside a triple-quoted literal
    pub fn in_literal(&self) -> bool {
        self.in_literal
    }

    /// Scan a whole text
    pub fn scan(mut self, source: &str) -> ScanOutput {
        for (idx, line) in source.split('\n').enumerate() {
            self.step(idx, line);
        }
        self.finish()
    }

    /// Feed one physical line (`idx` is 0-based)
    pub fn step(&mut self, idx: usize, raw: &str) {
        let line = raw.trim_start();
        let indent = raw.len() - line.len();

        let markers = line.matches(TRIPLE_QUOTE).count();
        let opens_literal = !self.in_literal && markers > 0;
        if markers % 2 == 1 {
            self.in_literal = !self.in_literal;
        }

        self.state = match self.state {
            ScanState::ReadingDoc { indent: doc_indent } => self.read_doc(idx, raw, doc_indent),
            state => self.seek(idx, line, indent, state, opens_literal),
        };
    }

    /// Close the scan and return what was found
    pub fn finish(mut self) -> ScanOutput {
        match self.state {
            ScanState::DocHeaderExpected => self.emit_missing(),
            ScanState::ReadingDoc { .. } => self.diagnostics.push(
                Diagnostic::warning("Doc block is never closed")
                    .with_code(UNTERMINATED_DOC)
                    .with_help("Close the doc block with \"\"\""),
            ),
            ScanState::Seeking => {}
        }
        self.state = ScanState::Seeking;

        ScanOutput {
            blocks: self.blocks,
            diagnostics: self.diagnostics,
        }
    }

    fn seek(
        &mut self,
        idx: usize,
        line: &str,
        indent: usize,
        state: ScanState,
        opens_literal: bool,
    ) -> ScanState {
        let expecting = state == ScanState::DocHeaderExpected;

        if let Some(def) = Definition::parse(line) {
            if expecting {
                self.emit_missing();
            }
            if def.is_private() {
                return ScanState::Seeking;
            }
            self.blocks.push(self.header_block(idx, indent, &def));
            return ScanState::DocHeaderExpected;
        }

        if opens_literal && is_module_doc_open(line) {
            if expecting {
                self.emit_missing();
            }
            self.blocks.push(DocBlock::module());
            return self.open_doc(idx, &line[MODULE_DOC_OPEN.len()..], indent);
        }

        if expecting && opens_literal && line.starts_with(TRIPLE_QUOTE) {
            return self.open_doc(idx, &line[TRIPLE_QUOTE.len()..], indent);
        }

        state
    }

    fn header_block(&self, idx: usize, indent: usize, def: &Definition<'_>) -> DocBlock {
        let level = indent / self.config.indent_unit.max(1) + 1;
        let mut header = format!(
            "{} *{}* **{}**{}",
            "#".repeat(self.config.heading_base + level),
            def.kind.label(),
            def.name,
            def.bases
        );
        if let Some(link) = self.link {
            header.push_str(&format!(" [[src]]({}#L{})", link.path, self.line_number(idx)));
        }
        DocBlock::definition(header, level)
    }

    /// Handle the remainder of a line that opened a doc block
    fn open_doc(&mut self, idx: usize, rest: &str, indent: usize) -> ScanState {
        match rest.find(TRIPLE_QUOTE) {
            Some(end) => {
                let text = rest[..end].trim();
                if !text.is_empty() {
                    self.add_doc_line(idx, text);
                }
                self.check_after_close(idx, &rest[end + TRIPLE_QUOTE.len()..]);
                ScanState::Seeking
            }
            None => {
                let text = rest.trim();
                if !text.is_empty() {
                    self.add_doc_line(idx, text);
                }
                ScanState::ReadingDoc { indent }
            }
        }
    }

    fn read_doc(&mut self, idx: usize, raw: &str, doc_indent: usize) -> ScanState {
        let text = dedent(raw, doc_indent);
        match text.find(TRIPLE_QUOTE) {
            Some(end) => {
                let before = text[..end].trim_end();
                if !before.trim().is_empty() {
                    self.add_doc_line(idx, before);
                }
                self.check_after_close(idx, &text[end + TRIPLE_QUOTE.len()..]);
                ScanState::Seeking
            }
            None => {
                self.add_doc_line(idx, text.trim_end());
                ScanState::ReadingDoc { indent: doc_indent }
            }
        }
    }

    fn check_after_close(&mut self, idx: usize, after: &str) {
        if !after.trim().is_empty() {
            self.diagnostics.push(
                Diagnostic::warning("Text after the closing \"\"\" was dropped")
                    .with_code(TRAILING_AFTER_CLOSE)
                    .with_line(self.line_number(idx)),
            );
        }
    }

    /// 1-based line in the linked file, or in the scanned text
    fn line_number(&self, idx: usize) -> usize {
        idx + self.link.map_or(0, |link| link.line_offset) + 1
    }

    fn emit_missing(&mut self) {
        if let Some(block) = self.blocks.last_mut() {
            block.push(DocLine::Missing);
        }
    }

    /// Rewrite one captured doc line into the current block
    fn add_doc_line(&mut self, idx: usize, text: &str) {
        let trimmed = text.trim_start();
        let lead = text[..text.len() - trimmed.len()].to_string();

        let Some(block) = self.blocks.last_mut() else {
            return;
        };

        if let Some(rest) = trimmed.strip_prefix(":param ") {
            let (name, description) = split_field(rest);
            block.push(DocLine::Param {
                indent: lead,
                name: name.to_string(),
                ty: None,
                description: description.to_string(),
            });
        } else if let Some(rest) = trimmed.strip_prefix(":type ") {
            let (name, ty) = split_field(rest);
            match block.lines.last_mut() {
                Some(DocLine::Param {
                    name: param,
                    ty: slot,
                    ..
                }) if param == name => *slot = Some(ty.trim().to_string()),
                _ => self.diagnostics.push(
                    Diagnostic::warning(format!("':type {}:' has no preceding bullet", name))
                        .with_code(TYPE_WITHOUT_PARAM)
                        .with_line(self.line_number(idx))
                        .with_help("':param X:' must come directly before ':type X:'"),
                ),
            }
        } else if let Some(rest) = trimmed
            .strip_prefix(":return:")
            .or_else(|| trimmed.strip_prefix(":returns:"))
        {
            block.push(DocLine::Returns {
                indent: lead,
                ty: None,
                description: rest.to_string(),
            });
        } else if let Some(rest) = trimmed.strip_prefix(":rtype:") {
            match block.lines.last_mut() {
                Some(DocLine::Returns { ty: slot, .. }) => *slot = Some(rest.trim().to_string()),
                _ => self.diagnostics.push(
                    Diagnostic::warning("':rtype:' has no preceding bullet")
                        .with_code(RTYPE_WITHOUT_RETURN)
                        .with_line(self.line_number(idx))
                        .with_help("':return:' must come directly before ':rtype:'"),
                ),
            }
        } else {
            block.push(DocLine::Text(text.to_string()));
        }
    }
}

/// Scan `source` for documented definitions
pub fn scan(source: &str, config: &ScanConfig, link: Option<&SourceLink>) -> ScanOutput {
    DocScanner::new(config).with_link(link).scan(source)
}

/// Collapse every run of blank lines to a single empty line
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in text.split('\n') {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        out.push(if blank { "" } else { line });
        previous_blank = blank;
    }
    out.join("\n")
}

/// Render blocks as markdown, each preceded by a blank line
pub fn render_blocks(blocks: &[DocBlock]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        lines.push(String::new());
        lines.extend(block.to_markdown_lines());
    }
    lines.push(String::new());

    let text = collapse_blank_lines(&lines.join("\n"));
    text.trim_start_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbdok_ast::NO_DOCUMENTATION;

    fn run(source: &str) -> ScanOutput {
        scan(source, &ScanConfig::default(), None)
    }

    #[test]
    fn test_public_function_with_params() {
        let source = r#"def public_fn(a, b):
    """
    Adds two values.

    :param a: first value
    :return: the sum
    """
    return a + b
"#;
        let out = run(source);
        assert_eq!(out.blocks.len(), 1);

        let block = &out.blocks[0];
        assert_eq!(block.header.as_deref(), Some("#### *def* **public_fn**"));
        assert_eq!(block.level, 1);
        assert_eq!(
            block.to_markdown_lines(),
            vec![
                "#### *def* **public_fn**",
                "Adds two values.",
                "",
                "* **a**: first value",
                "* **returns**: the sum",
            ]
        );
        let bullets: Vec<_> = block
            .lines
            .iter()
            .filter(|l| !matches!(l, DocLine::Text(_)))
            .collect();
        assert!(matches!(bullets[0], DocLine::Param { .. }));
        assert!(matches!(bullets[1], DocLine::Returns { .. }));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_private_definitions_are_suppressed() {
        let source = "def _helper(x):\n    \"\"\"Private.\"\"\"\n\nclass _Hidden:\n    \"\"\"\n    Nope.\n    \"\"\"\n";
        let out = run(source);
        assert!(out.blocks.is_empty());
    }

    #[test]
    fn test_private_definition_does_not_steal_doc() {
        let source = "def shown():\n    pass\n\ndef _hidden():\n    \"\"\"Not for shown.\"\"\"\n";
        let out = run(source);
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.blocks[0].lines, vec![DocLine::Missing]);
    }

    #[test]
    fn test_missing_doc_placeholder() {
        let source = "def first():\n    pass\n\ndef second():\n    \"\"\"Has docs.\"\"\"\n";
        let out = run(source);
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(out.blocks[0].lines, vec![DocLine::Missing]);
        assert_eq!(out.blocks[1].lines, vec![DocLine::Text("Has docs.".to_string())]);
        assert!(render_blocks(&out.blocks).contains(NO_DOCUMENTATION));
    }

    #[test]
    fn test_missing_doc_at_end_of_input() {
        let out = run("def last():\n    return 1");
        assert_eq!(out.blocks[0].lines, vec![DocLine::Missing]);
    }

    #[test]
    fn test_one_line_doc() {
        let out = run("def f():\n    \"\"\"Does f.\"\"\"\n    return 1\n\ndef g():\n    \"\"\"Does g.\"\"\"\n");
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(out.blocks[0].lines, vec![DocLine::Text("Does f.".to_string())]);
        assert_eq!(out.blocks[1].lines, vec![DocLine::Text("Does g.".to_string())]);
    }

    #[test]
    fn test_class_with_bases_and_methods() {
        let source = r#"class Reader(Base, metaclass=Meta):
    """A reader."""

    def read(self, n):
        """
        Read bytes.

        :param n: count
        :type n: int
        :return: data
        :rtype: bytes
        """
"#;
        let out = run(source);
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(
            out.blocks[0].header.as_deref(),
            Some("#### *class* **Reader**(Base, metaclass=Meta)")
        );
        assert_eq!(out.blocks[1].header.as_deref(), Some("##### *def* **read**"));
        assert_eq!(out.blocks[1].level, 2);
        assert_eq!(
            out.blocks[1].to_markdown_lines()[3..],
            ["* **n** *(int)*: count", "* **returns** *(bytes)*: data"]
        );
    }

    #[test]
    fn test_type_without_param_is_reported_and_dropped() {
        let source = "def f(x):\n    \"\"\"\n    Text.\n    :type x: int\n    :rtype: str\n    \"\"\"\n";
        let out = run(source);
        assert_eq!(out.blocks[0].lines, vec![DocLine::Text("Text.".to_string())]);

        let codes: Vec<_> = out
            .diagnostics
            .iter()
            .filter_map(|d| d.code.as_deref())
            .collect();
        assert_eq!(codes, vec![TYPE_WITHOUT_PARAM, RTYPE_WITHOUT_RETURN]);
        assert_eq!(out.diagnostics.iter().next().and_then(|d| d.line), Some(4));
    }

    #[test]
    fn test_module_doc() {
        let source = "\"\"\"doc\n# Title\n\nSome text.\n\"\"\"\n\nimport os\n";
        let out = run(source);
        assert_eq!(out.blocks.len(), 1);
        assert!(out.blocks[0].header.is_none());
        assert_eq!(
            out.blocks[0].to_markdown_lines(),
            vec!["# Title", "", "Some text."]
        );
    }

    #[test]
    fn test_module_doc_after_undocumented_definition() {
        let source = "def f():\n    pass\n\"\"\"doc\nMore.\n\"\"\"\n";
        let out = run(source);
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(out.blocks[0].lines, vec![DocLine::Missing]);
        assert_eq!(out.blocks[1].lines, vec![DocLine::Text("More.".to_string())]);
    }

    #[test]
    fn test_doc_starting_with_doc_word_is_not_module_doc() {
        let out = run("def f():\n    \"\"\"document things\"\"\"\n");
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(
            out.blocks[0].lines,
            vec![DocLine::Text("document things".to_string())]
        );
    }

    #[test]
    fn test_wrapped_signature_still_gets_doc() {
        let source = "def f(a,\n      b):\n    \"\"\"Wrapped.\"\"\"\n";
        let out = run(source);
        assert_eq!(out.blocks[0].lines, vec![DocLine::Text("Wrapped.".to_string())]);
    }

    #[test]
    fn test_indentation_stripped_by_open_column() {
        let source = "class A:\n    def m(self):\n        \"\"\"\n        Line one.\n            Indented.\n        \"\"\"\n";
        let out = run(source);
        let method = &out.blocks[1];
        assert_eq!(
            method.lines,
            vec![
                DocLine::Text("Line one.".to_string()),
                DocLine::Text("    Indented.".to_string()),
            ]
        );
    }

    #[test]
    fn test_source_link() {
        let link = SourceLink::new("../mod.py", 10);
        let out = scan("\ndef f():\n    \"\"\"x\"\"\"\n", &ScanConfig::default(), Some(&link));
        assert_eq!(
            out.blocks[0].header.as_deref(),
            Some("#### *def* **f** [[src]](../mod.py#L12)")
        );
    }

    #[test]
    fn test_trailing_text_after_close() {
        let out = run("def f():\n    \"\"\"\n    Body.\n    \"\"\" junk\n");
        assert_eq!(out.blocks[0].lines, vec![DocLine::Text("Body.".to_string())]);
        assert_eq!(
            out.diagnostics.iter().next().and_then(|d| d.code.clone()),
            Some(TRAILING_AFTER_CLOSE.to_string())
        );
    }

    #[test]
    fn test_unterminated_doc_is_reported() {
        let out = run("def f():\n    \"\"\"\n    Body.");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.blocks[0].lines, vec![DocLine::Text("Body.".to_string())]);
    }

    #[test]
    fn test_state_transitions() {
        let config = ScanConfig::default();
        let mut scanner = DocScanner::new(&config);
        assert_eq!(scanner.state(), ScanState::Seeking);

        scanner.step(0, "def f():");
        assert_eq!(scanner.state(), ScanState::DocHeaderExpected);

        scanner.step(1, "    \"\"\"");
        assert_eq!(scanner.state(), ScanState::ReadingDoc { indent: 4 });
        assert!(scanner.in_literal());

        scanner.step(2, "    text");
        assert_eq!(scanner.state(), ScanState::ReadingDoc { indent: 4 });

        scanner.step(3, "    \"\"\"");
        assert_eq!(scanner.state(), ScanState::Seeking);
        assert!(!scanner.in_literal());
    }

    #[test]
    fn test_render_blocks_collapses_blank_lines() {
        let source = "def f():\n    \"\"\"\n    A.\n\n\n\n    B.\n    \"\"\"\n\ndef g():\n    pass\n";
        let text = render_blocks(&run(source).blocks);
        assert_eq!(
            text,
            format!(
                "#### *def* **f**\nA.\n\nB.\n\n#### *def* **g**\n{}\n",
                NO_DOCUMENTATION
            )
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n  \n\t\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\nb"), "a\nb");
    }
}
