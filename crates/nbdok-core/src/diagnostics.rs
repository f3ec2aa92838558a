//! Conversion diagnostics for nbdok
//!
//! Non-fatal problems found while scanning docs or rendering pages are
//! collected as warnings instead of aborting the conversion. Each one
//! means something was dropped or may render incorrectly.

use serde::{Deserialize, Serialize};

/// `:type` line without a preceding `:param` bullet
pub const TYPE_WITHOUT_PARAM: &str = "DOC001";
/// `:rtype` line without a preceding `:return` bullet
pub const RTYPE_WITHOUT_RETURN: &str = "DOC002";
/// Text after a closing doc marker
pub const TRAILING_AFTER_CLOSE: &str = "DOC003";
/// Doc block still open at end of input
pub const UNTERMINATED_DOC: &str = "DOC004";
/// Image payload that is not valid base64
pub const INVALID_IMAGE: &str = "IMG001";

/// A diagnostic warning
///
/// # Example
///
/// ```
/// use nbdok_core::diagnostics::Diagnostic;
///
/// let diag = Diagnostic::warning("Invalid doc format")
///     .with_code("DOC001")
///     .with_line(14)
///     .with_help("':param X:' must come before ':type X:'");
/// assert!(diag.to_string().starts_with("warning[DOC001]"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The diagnostic message
    pub message: String,

    /// Optional code (e.g., "DOC001")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// 1-indexed line in the scanned text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// Optional file path where the issue occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Additional help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a warning
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            line: None,
            file: None,
            help: None,
        }
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the line number
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the file path
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: warning[code]: message
        write!(f, "warning")?;
        if let Some(ref code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;

        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "\n  --> {}:{}", file, line)?,
            (Some(file), None) => write!(f, "\n  --> {}", file)?,
            (None, Some(line)) => write!(f, "\n  --> line {}", line)?,
            (None, None) => {}
        }

        if let Some(ref help) = self.help {
            write!(f, "\n  = help: {}", help)?;
        }

        Ok(())
    }
}

/// A collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Get all diagnostics
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Get the count
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}
