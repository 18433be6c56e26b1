//! Grammar registry: language identifier to tree-sitter grammar.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use syntry_core::{EngineError, Language, Span};

use crate::tree::SyntaxTree;

/// Maps language identifiers to tree-sitter grammars. Populated once
/// before scanning starts and treated as read-only thereafter; shareable
/// across worker threads.
///
/// Adding a language is purely a registry entry. The matcher engine only
/// ever sees the `kind`/child-shape abstraction of `SyntaxNode`.
pub struct GrammarRegistry {
    grammars: HashMap<Language, tree_sitter::Language>,
}

impl GrammarRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grammars: HashMap::new(),
        }
    }

    /// Create a registry with all bundled grammars registered.
    #[must_use]
    pub fn with_default_grammars() -> Self {
        let mut registry = Self::new();
        registry.register(Language::C, tree_sitter_c::LANGUAGE.into());
        registry.register(Language::Cpp, tree_sitter_cpp::LANGUAGE.into());
        registry.register(Language::Python, tree_sitter_python::LANGUAGE.into());
        registry.register(
            Language::JavaScript,
            tree_sitter_javascript::LANGUAGE.into(),
        );
        registry.register(
            Language::TypeScript,
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        );
        registry.register(Language::Java, tree_sitter_java::LANGUAGE.into());
        registry.register(Language::Go, tree_sitter_go::LANGUAGE.into());
        registry.register(Language::Rust, tree_sitter_rust::LANGUAGE.into());
        registry.register(Language::Ruby, tree_sitter_ruby::LANGUAGE.into());
        registry.register(Language::Terraform, tree_sitter_hcl::LANGUAGE.into());
        registry.register(Language::Php, tree_sitter_php::LANGUAGE_PHP.into());
        registry.register(Language::Yaml, tree_sitter_yaml::LANGUAGE.into());
        registry
    }

    /// Register a grammar for a language, replacing any existing entry.
    pub fn register(&mut self, language: Language, grammar: tree_sitter::Language) {
        self.grammars.insert(language, grammar);
    }

    /// Whether a grammar is registered for the language.
    #[must_use]
    pub fn supports(&self, language: Language) -> bool {
        self.grammars.contains_key(&language)
    }

    /// Languages with a registered grammar.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.grammars.keys().copied()
    }

    /// Parse source text into a syntax tree.
    ///
    /// Error-recovered trees are returned successfully; callers can check
    /// `SyntaxTree::error_span()` to report a degraded-parse diagnostic
    /// alongside whatever findings the recovered tree yields. `Parse` is
    /// returned only when the grammar produces no tree at all.
    pub fn parse(
        &self,
        language: Language,
        file: &Path,
        source: &str,
    ) -> Result<SyntaxTree, EngineError> {
        let grammar = self
            .grammars
            .get(&language)
            .ok_or(EngineError::UnsupportedLanguage(language))?;

        // Fresh parser per call: tree-sitter parsers are stateful, the
        // registry must stay shareable read-only across workers.
        let mut parser = tree_sitter::Parser::new();
        if let Err(e) = parser.set_language(grammar) {
            warn!(language = %language, error = %e, "grammar rejected by tree-sitter");
            return Err(EngineError::UnsupportedLanguage(language));
        }

        let tree = parser.parse(source, None).ok_or_else(|| EngineError::Parse {
            file: file.to_path_buf(),
            span: whole_source_span(source),
        })?;

        let tree = SyntaxTree::new(tree, source.to_string(), language, file.to_path_buf());
        debug!(
            file = %tree.file().display(),
            language = %language,
            has_errors = tree.has_errors(),
            "parsed source file"
        );
        Ok(tree)
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::with_default_grammars()
    }
}

fn whole_source_span(source: &str) -> Span {
    let lines = source.lines().count().max(1);
    let last_line_len = source.lines().last().map_or(0, str::len);
    Span {
        start_byte: 0,
        end_byte: source.len(),
        start_line: 1,
        start_column: 0,
        end_line: lines,
        end_column: last_line_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse_python(source: &str) -> SyntaxTree {
        GrammarRegistry::with_default_grammars()
            .parse(Language::Python, &PathBuf::from("test.py"), source)
            .unwrap()
    }

    #[test]
    fn test_unsupported_language() {
        let registry = GrammarRegistry::with_default_grammars();
        let result = registry.parse(Language::Other, &PathBuf::from("x.bin"), "data");
        assert!(matches!(
            result,
            Err(EngineError::UnsupportedLanguage(Language::Other))
        ));
    }

    #[test]
    fn test_empty_registry_supports_nothing() {
        let registry = GrammarRegistry::new();
        assert!(!registry.supports(Language::Python));
        assert_eq!(registry.languages().count(), 0);
    }

    #[test]
    fn test_parse_produces_tree() {
        let tree = parse_python("x = 1\n");
        assert_eq!(tree.root().kind(), "module");
        assert_eq!(tree.language(), Language::Python);
        assert!(!tree.has_errors());
        assert!(tree.error_span().is_none());
    }

    #[test]
    fn test_span_fidelity() {
        let source = "def f():\n    return eval(x)\n";
        let tree = parse_python(source);

        // Re-slicing every node's span out of the original text must
        // reproduce the node text exactly.
        for node in tree.root().descendants() {
            let span = node.span();
            assert_eq!(span.slice(source), node.text());
        }
    }

    #[test]
    fn test_degraded_parse_keeps_tree() {
        let tree = parse_python("def f(:\n");
        assert!(tree.has_errors());
        let span = tree.error_span().expect("error span for malformed input");
        assert!(span.end_byte <= tree.source().len());
    }

    #[test]
    fn test_children_by_field() {
        let tree = parse_python("eval(x)\n");
        let call = tree
            .root()
            .descendants()
            .find(|n| n.kind() == "call")
            .unwrap();
        let function = call.children_by_field("function");
        assert_eq!(function.len(), 1);
        assert_eq!(function[0].text(), "eval");
    }

    #[test]
    fn test_has_child_of_kind() {
        let tree = parse_python("try:\n    pass\nexcept ValueError:\n    pass\n");
        let clause = tree
            .root()
            .descendants()
            .find(|n| n.kind() == "except_clause")
            .unwrap();
        assert!(clause.has_child_of_kind("identifier"));
        assert!(!clause.has_child_of_kind("string"));
    }
}
