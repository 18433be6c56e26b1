//! Tree-sitter grammar registry and syntax tree views.
//!
//! This crate provides:
//! - A registry mapping `Language` identifiers to tree-sitter grammars
//! - Parsing of source text into owned `SyntaxTree` values
//! - Borrowed `SyntaxNode` views used by the matcher engine

mod registry;
mod tree;

pub use registry::GrammarRegistry;
pub use tree::{Descendants, SyntaxNode, SyntaxTree};
