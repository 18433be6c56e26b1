//! Conversion of accepted capture sets into findings.

use std::path::Path;

use syntry_core::Finding;
use syntry_grammars::SyntaxNode;

use crate::matcher::CaptureSet;
use crate::query::Query;

/// Build a finding from an accepted capture set.
///
/// The span and text come from the query's primary capture; without a
/// configured primary the pattern root's own capture is used, and a
/// pattern root with no capture falls back to the match root node under
/// the name `"root"`. Total for well-formed accepted capture sets.
pub(crate) fn emit_finding(query: &Query, captures: &CaptureSet<'_>, file: &Path) -> Finding {
    let (capture_name, node) = primary(query, captures);

    Finding {
        category: query.category().to_string(),
        capture_name,
        file: file.to_path_buf(),
        span: node.span(),
        bound_text: node.text().to_string(),
        tags: query.tags().clone(),
    }
}

fn primary<'t>(query: &Query, captures: &CaptureSet<'t>) -> (String, SyntaxNode<'t>) {
    if let Some(name) = query.primary_capture()
        && let Some(node) = captures.get(name)
    {
        return (name.to_string(), node);
    }

    let root_matcher = &query.pattern(captures.pattern_index()).matcher;
    if let Some(name) = root_matcher.captures.first()
        && let Some(node) = captures.get(name)
    {
        return (name.clone(), node);
    }

    ("root".to_string(), captures.root())
}
