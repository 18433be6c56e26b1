//! Structural code-pattern scanner.
//!
//! syntry parses source files into concrete syntax trees, evaluates
//! declarative structural queries against them and emits a stream of
//! categorized findings for the downstream scrub pipeline. It is an
//! in-process library: the caller supplies `(language, path, text)`
//! triples and consumes `Finding` records; orchestration, reporting and
//! remediation live elsewhere.

pub mod scan;

pub use scan::{scan_corpus, scan_file, ScanOutcome, SourceFile};

// Re-export core types for convenience
pub use syntry_core::{Diagnostic, EngineError, Finding, Language, Span};
pub use syntry_grammars::{GrammarRegistry, SyntaxNode, SyntaxTree};
pub use syntry_query::{catalog, CaptureSet, Matches, PredicateRegistry, Query};
