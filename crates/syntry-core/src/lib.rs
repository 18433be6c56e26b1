//! Core types for the syntry pattern scanner.
//!
//! This crate provides the vocabulary shared across all syntry components:
//! - Programming language identifiers (Language)
//! - Source spans and findings (Span, Finding, Diagnostic)
//! - The engine error taxonomy (EngineError)

mod error;
mod finding;
mod language;

pub use error::EngineError;
pub use finding::{Diagnostic, Finding, Span};
pub use language::Language;
