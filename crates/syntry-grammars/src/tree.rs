//! Owned syntax trees and borrowed node views.

use std::path::{Path, PathBuf};

use syntry_core::{Language, Span};

/// A parsed source file. Owns the tree-sitter tree and the source text;
/// everything else in the engine holds `SyntaxNode` borrows into it.
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    source: String,
    language: Language,
    file: PathBuf,
}

impl SyntaxTree {
    pub(crate) fn new(
        tree: tree_sitter::Tree,
        source: String,
        language: Language,
        file: PathBuf,
    ) -> Self {
        Self {
            tree,
            source,
            language,
            file,
        }
    }

    /// Root node of the tree.
    #[must_use]
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            node: self.tree.root_node(),
            source: &self.source,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Whether the grammar had to error-recover anywhere in this tree.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Span of the furthest ERROR or MISSING node, if any. This is the
    /// span reported in degraded-parse diagnostics.
    #[must_use]
    pub fn error_span(&self) -> Option<Span> {
        self.root()
            .descendants()
            .filter(|n| n.is_error() || n.is_missing())
            .max_by_key(|n| n.span().start_byte)
            .map(|n| n.span())
    }
}

/// A non-owning view of one node in a `SyntaxTree`.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: tree_sitter::Node<'t>,
    source: &'t str,
}

impl<'t> SyntaxNode<'t> {
    /// Grammar-defined node kind, e.g. `"except_clause"`. Anonymous token
    /// nodes report their token text (e.g. `"+"`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    /// Whether this is a named node (as opposed to an anonymous token).
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.node.is_named()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.node.is_error()
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.node.is_missing()
    }

    /// Stable identity of the node within its tree.
    #[must_use]
    pub fn id(&self) -> usize {
        self.node.id()
    }

    /// Text of the node, sliced from the original source.
    #[must_use]
    pub fn text(&self) -> &'t str {
        self.source
            .get(self.node.start_byte()..self.node.end_byte())
            .unwrap_or("")
    }

    /// Byte and line/column span of the node. Lines are 1-based, columns
    /// 0-based (tree-sitter rows are converted here, once).
    #[must_use]
    pub fn span(&self) -> Span {
        let start = self.node.start_position();
        let end = self.node.end_position();
        Span {
            start_byte: self.node.start_byte(),
            end_byte: self.node.end_byte(),
            start_line: start.row + 1,
            start_column: start.column,
            end_line: end.row + 1,
            end_column: end.column,
        }
    }

    /// All direct children, anonymous tokens included.
    #[must_use]
    pub fn children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|node| SyntaxNode {
                node,
                source: self.source,
            })
            .collect()
    }

    /// Direct named children only.
    #[must_use]
    pub fn named_children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .map(|node| SyntaxNode {
                node,
                source: self.source,
            })
            .collect()
    }

    /// Direct children under the given field name. Grammars may attach
    /// several children to one field.
    #[must_use]
    pub fn children_by_field(&self, field: &str) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .children_by_field_name(field, &mut cursor)
            .map(|node| SyntaxNode {
                node,
                source: self.source,
            })
            .collect()
    }

    /// Whether any direct child has the given kind.
    #[must_use]
    pub fn has_child_of_kind(&self, kind: &str) -> bool {
        self.children().iter().any(|c| c.kind() == kind)
    }

    /// Pre-order traversal of this node and all its descendants.
    #[must_use]
    pub fn descendants(self) -> Descendants<'t> {
        Descendants { stack: vec![self] }
    }
}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", &self.kind())
            .field("span", &self.span())
            .finish()
    }
}

/// Pre-order node iterator. Finite by construction: bounded by tree size.
pub struct Descendants<'t> {
    stack: Vec<SyntaxNode<'t>>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut children = node.children();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}
