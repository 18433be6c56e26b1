//! Engine error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

use crate::{Language, Span};

/// Errors surfaced by the scanner core. Every variant is attributable to a
/// specific input; none represents a bare crash.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no grammar registered for language: {0}")]
    UnsupportedLanguage(Language),

    #[error("failed to parse {}: no tree produced (error near {span})", file.display())]
    Parse { file: PathBuf, span: Span },

    #[error("query syntax error at offset {offset}: {message}")]
    QuerySyntax { offset: usize, message: String },

    #[error("unknown predicate: #{name}?")]
    UnknownPredicate { name: String },

    #[error("predicate references capture @{name} that is not bound in the pattern")]
    UnboundCapture { name: String },

    /// Internal consistency fault: compile-time validation guarantees every
    /// predicate capture is bound, so hitting this at runtime means a
    /// compiler defect.
    #[error("internal: predicate read missing capture @{name} at runtime")]
    MissingCapture { name: String },
}
