//! Corpus scanning.
//!
//! Each (file, query) pair is an independent unit of work: a file is
//! parsed once into a tree owned by its unit, every matching query is
//! evaluated against it, and per-file results are concatenated at the
//! end. Queries and the grammar registry are shared read-only, so the
//! worker pool needs no locking.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use syntry_core::{Diagnostic, EngineError, Finding, Language};
use syntry_grammars::GrammarRegistry;
use syntry_query::Query;

/// One source file supplied by the caller. No IO happens in this crate;
/// the orchestration layer reads the text.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub language: Language,
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(language: Language, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            language,
            path: path.into(),
            text: text.into(),
        }
    }

    /// Build a source file, detecting the language from the file name.
    pub fn detect(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let language = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(Language::Other, Language::from_filename);
        Self {
            language,
            path,
            text: text.into(),
        }
    }
}

/// Findings plus per-file diagnostics from one scan. Findings within one
/// file follow (query, traversal) order; a file with diagnostics may
/// still have findings (degraded parse) or none (failed parse).
#[derive(Debug, Default, Serialize)]
pub struct ScanOutcome {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanOutcome {
    fn merge(mut self, other: ScanOutcome) -> ScanOutcome {
        self.findings.extend(other.findings);
        self.diagnostics.extend(other.diagnostics);
        self
    }
}

/// Scan one file with every query that targets its language.
pub fn scan_file(registry: &GrammarRegistry, queries: &[Query], file: &SourceFile) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    let tree = match registry.parse(file.language, &file.path, &file.text) {
        Ok(tree) => tree,
        Err(error) => {
            // One bad file must not abort the rest of the corpus.
            warn!(file = %file.path.display(), %error, "skipping file");
            outcome.diagnostics.push(Diagnostic {
                file: file.path.clone(),
                message: error.to_string(),
                span: parse_error_span(&error),
            });
            return outcome;
        }
    };

    if let Some(span) = tree.error_span() {
        // Partial findings beat none: keep matching against whatever the
        // grammar recovered, but tell the caller.
        outcome.diagnostics.push(Diagnostic {
            file: file.path.clone(),
            message: format!("parse recovered with errors near {span}"),
            span: Some(span),
        });
    }

    for query in queries {
        if query.language() != file.language {
            continue;
        }
        for captures in query.evaluate(&tree) {
            outcome.findings.push(query.emit(&captures, &file.path));
        }
    }

    debug!(
        file = %file.path.display(),
        findings = outcome.findings.len(),
        diagnostics = outcome.diagnostics.len(),
        "scanned file"
    );
    outcome
}

/// Scan a corpus across the rayon worker pool.
///
/// Files are independent units; results are merged by concatenation.
/// Ordering of findings within one file is part of the contract,
/// ordering across files is not.
pub fn scan_corpus(
    registry: &GrammarRegistry,
    queries: &[Query],
    files: &[SourceFile],
) -> ScanOutcome {
    files
        .par_iter()
        .map(|file| scan_file(registry, queries, file))
        .reduce(ScanOutcome::default, ScanOutcome::merge)
}

fn parse_error_span(error: &EngineError) -> Option<syntry_core::Span> {
    match error {
        EngineError::Parse { span, .. } => Some(*span),
        _ => None,
    }
}
