//! Findings and source spans.
//!
//! A `Finding` is the only artifact that crosses the boundary into the
//! downstream scrub pipeline. It is immutable once emitted and traceable
//! to exactly one capture set from one query against one tree.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A byte and line/column range into one source file.
///
/// Byte offsets index the original source text exactly; `start_line` and
/// `end_line` are 1-based, columns are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    /// Slice the span out of the source text it was produced from.
    #[must_use]
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start_byte..self.end_byte).unwrap_or("")
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// A reported pattern occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Category of the query that produced this finding
    /// (e.g. "security.eval_exec").
    pub category: String,
    /// Name of the capture the span and text were taken from.
    pub capture_name: String,
    /// File the finding was located in.
    pub file: PathBuf,
    /// Location of the captured node.
    pub span: Span,
    /// Text of the captured node.
    pub bound_text: String,
    /// Tags declared on the query.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// A per-file condition reported alongside findings, most commonly a
/// degraded parse. Files with diagnostics still contribute whatever
/// findings their recovered tree yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub message: String,
    #[serde(default)]
    pub span: Option<Span>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> Span {
        Span {
            start_byte: start,
            end_byte: end,
            start_line: 1,
            start_column: start,
            end_line: 1,
            end_column: end,
        }
    }

    #[test]
    fn test_span_slice() {
        let source = "eval(x)";
        assert_eq!(span(0, 4).slice(source), "eval");
        assert_eq!(span(0, 99).slice(source), "");
    }

    #[test]
    fn test_finding_json_round_trip() {
        let finding = Finding {
            category: "security.eval_exec".to_string(),
            capture_name: "security.eval_exec".to_string(),
            file: PathBuf::from("app.py"),
            span: span(0, 4),
            bound_text: "eval".to_string(),
            tags: ["security".to_string()].into_iter().collect(),
        };

        let json = serde_json::to_string(&finding).unwrap();
        let back: Finding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, finding);
    }
}
