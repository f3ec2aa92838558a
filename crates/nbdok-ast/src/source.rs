//! Annotated source-text documents
//!
//! A source document is the flat text form of a notebook: one segment per
//! exportable cell, keyed by its dense index among the exportable cells.

use serde::{Deserialize, Serialize};

/// Kind of a source segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Code taken from an export cell
    Code,
    /// Prose from a markdown cell, fenced as a doc comment
    DocComment,
}

/// One indexed segment of a source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Dense 0-based index over the exportable cells
    pub index: usize,
    /// Code or doc comment
    pub kind: SegmentKind,
    /// Segment lines without terminators (sentinel and fence excluded)
    pub lines: Vec<String>,
}

impl Segment {
    /// Create a code segment
    pub fn code(index: usize, lines: Vec<String>) -> Self {
        Self {
            index,
            kind: SegmentKind::Code,
            lines,
        }
    }

    /// Create a doc-comment segment
    pub fn doc_comment(index: usize, lines: Vec<String>) -> Self {
        Self {
            index,
            kind: SegmentKind::DocComment,
            lines,
        }
    }

    /// Lines re-joined as notebook source lines: every line but the last
    /// gets its newline back.
    pub fn terminated_lines(&self) -> Vec<String> {
        let last = self.lines.len().saturating_sub(1);
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i < last {
                    format!("{}\n", line)
                } else {
                    line.clone()
                }
            })
            .collect()
    }
}

/// A flat source document generated from a notebook
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Path of the notebook this document was generated from
    pub origin: String,
    /// Segments ordered by index
    pub segments: Vec<Segment>,
}

impl SourceDocument {
    /// Create an empty source document for an origin
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            segments: Vec::new(),
        }
    }

    /// Add a segment
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if there are no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminated_lines() {
        let seg = Segment::code(0, vec!["a".into(), "".into(), "b".into()]);
        assert_eq!(seg.terminated_lines(), vec!["a\n", "\n", "b"]);
    }

    #[test]
    fn test_terminated_lines_empty() {
        let seg = Segment::doc_comment(3, Vec::new());
        assert!(seg.terminated_lines().is_empty());
    }

    #[test]
    fn test_push_segments() {
        let mut doc = SourceDocument::new("a.ipynb");
        doc.push(Segment::code(0, vec!["x = 1".into()]));
        doc.push(Segment::doc_comment(1, vec!["# Title".into()]));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.segments[1].kind, SegmentKind::DocComment);
        assert!(!doc.is_empty());
    }
}
