//! Compiled queries.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, error};

use syntry_core::{EngineError, Finding, Language};
use syntry_grammars::SyntaxTree;

use crate::emit::emit_finding;
use crate::matcher::{CaptureSet, Matches};
use crate::pattern::{parse_pattern_text, NodeMatcher};
use crate::predicate::{accept_all, CompiledPredicate, PredicateRegistry};

/// One pattern alternative with its cost-ordered predicate list.
#[derive(Debug)]
pub(crate) struct CompiledPattern {
    pub matcher: NodeMatcher,
    pub predicates: Vec<CompiledPredicate>,
}

/// A compiled structural query: pattern alternatives, predicates, category
/// and tags. Immutable after compilation; safe to share read-only across
/// any number of concurrent scans.
#[derive(Debug)]
pub struct Query {
    category: String,
    language: Language,
    patterns: Vec<CompiledPattern>,
    tags: BTreeSet<String>,
    primary_capture: Option<String>,
}

impl Query {
    /// Compile pattern text with the builtin predicate set.
    pub fn compile(
        language: Language,
        category: &str,
        pattern_text: &str,
    ) -> Result<Self, EngineError> {
        Self::compile_with(&PredicateRegistry::new(), language, category, pattern_text)
    }

    /// Compile pattern text against a caller-supplied predicate registry.
    ///
    /// Compilation validates that every capture a predicate references is
    /// bound in its pattern alternative, and orders each alternative's
    /// predicates cheap-first so evaluation can short-circuit before any
    /// regex work.
    pub fn compile_with(
        registry: &PredicateRegistry,
        language: Language,
        category: &str,
        pattern_text: &str,
    ) -> Result<Self, EngineError> {
        let parsed = parse_pattern_text(pattern_text)?;

        let mut patterns = Vec::with_capacity(parsed.len());
        for pattern in parsed {
            let mut bound = Vec::new();
            pattern.matcher.bound_captures(&mut bound);

            let mut predicates = Vec::with_capacity(pattern.predicates.len());
            for clause in &pattern.predicates {
                let compiled = registry.compile(clause)?;
                for reference in compiled.capture_refs() {
                    if !bound.iter().any(|name| name == reference) {
                        return Err(EngineError::UnboundCapture {
                            name: reference.to_string(),
                        });
                    }
                }
                predicates.push(compiled);
            }
            // Stable: predicates of equal cost keep their written order.
            predicates.sort_by_key(CompiledPredicate::cost);

            patterns.push(CompiledPattern {
                matcher: pattern.matcher,
                predicates,
            });
        }

        debug!(
            category,
            %language,
            pattern_count = patterns.len(),
            "compiled query"
        );

        Ok(Self {
            category: category.to_string(),
            language,
            patterns,
            tags: BTreeSet::new(),
            primary_capture: None,
        })
    }

    /// Attach tags carried onto every finding this query emits.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Designate the capture whose node supplies the reported span and
    /// text. The name must be bound in every pattern alternative.
    pub fn with_primary_capture(mut self, name: &str) -> Result<Self, EngineError> {
        for pattern in &self.patterns {
            let mut bound = Vec::new();
            pattern.matcher.bound_captures(&mut bound);
            if !bound.iter().any(|bound_name| bound_name == name) {
                return Err(EngineError::UnboundCapture {
                    name: name.to_string(),
                });
            }
        }
        self.primary_capture = Some(name.to_string());
        Ok(self)
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    #[must_use]
    pub fn primary_capture(&self) -> Option<&str> {
        self.primary_capture.as_deref()
    }

    pub(crate) fn pattern_matchers(&self) -> impl Iterator<Item = &NodeMatcher> {
        self.patterns.iter().map(|pattern| &pattern.matcher)
    }

    pub(crate) fn pattern(&self, index: usize) -> &CompiledPattern {
        &self.patterns[index]
    }

    /// Raw syntactic matches in pre-order traversal order, before any
    /// predicate filtering.
    #[must_use]
    pub fn matches<'q, 't>(&'q self, tree: &'t SyntaxTree) -> Matches<'q, 't> {
        Matches::new(self, tree)
    }

    /// Apply the capture set's predicate list: logical AND with
    /// short-circuit in compiled (cheap-first) order.
    pub fn accept(&self, captures: &CaptureSet<'_>) -> Result<bool, EngineError> {
        accept_all(&self.patterns[captures.pattern_index()].predicates, captures)
    }

    /// Lazy sequence of accepted capture sets: syntactic matching
    /// composed with predicate filtering.
    #[must_use]
    pub fn evaluate<'q, 't>(&'q self, tree: &'t SyntaxTree) -> Evaluated<'q, 't> {
        Evaluated {
            query: self,
            matches: self.matches(tree),
        }
    }

    /// Convert an accepted capture set into a finding.
    #[must_use]
    pub fn emit(&self, captures: &CaptureSet<'_>, file: &Path) -> Finding {
        emit_finding(self, captures, file)
    }
}

/// Iterator of accepted capture sets for one query over one tree.
pub struct Evaluated<'q, 't> {
    query: &'q Query,
    matches: Matches<'q, 't>,
}

impl<'t> Iterator for Evaluated<'_, 't> {
    type Item = CaptureSet<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let captures = self.matches.next()?;
            match self.query.accept(&captures) {
                Ok(true) => return Some(captures),
                Ok(false) => continue,
                Err(fault) => {
                    // Internal consistency fault: compile-time validation
                    // should make this unreachable.
                    error!(
                        category = self.query.category(),
                        error = %fault,
                        "rejecting capture set after internal predicate fault"
                    );
                    continue;
                }
            }
        }
    }
}
