//! Backtracking unification of patterns against syntax trees.
//!
//! Every node of the tree is an independent candidate root for every
//! pattern alternative; all distinct solutions are reported in pre-order
//! traversal order. Nothing is mutated, so re-running a match over the
//! same tree yields the identical sequence.

use std::collections::VecDeque;

use syntry_grammars::{SyntaxNode, SyntaxTree};

use crate::pattern::{ChildMatcher, KindMatcher, NodeMatcher};
use crate::query::Query;

type Binding<'t> = (String, SyntaxNode<'t>);

/// Captures bound by one successful match attempt. Valid only while the
/// owning `SyntaxTree` is alive.
#[derive(Debug, Clone)]
pub struct CaptureSet<'t> {
    pattern_index: usize,
    root: SyntaxNode<'t>,
    bindings: Vec<Binding<'t>>,
}

impl<'t> CaptureSet<'t> {
    /// Which pattern alternative of the query produced this match.
    #[must_use]
    pub fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    /// The node the pattern root unified with.
    #[must_use]
    pub fn root(&self) -> SyntaxNode<'t> {
        self.root
    }

    /// Node bound to a capture name, if any. With repeated capture names
    /// the first (outermost, leftmost) binding wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SyntaxNode<'t>> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| *node)
    }

    /// Bindings in the order they were made during unification.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SyntaxNode<'t>)> {
        self.bindings.iter().map(|(n, node)| (n.as_str(), *node))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Lazy sequence of raw capture sets for one query over one tree.
/// Finite (bounded by tree size) and restartable: the tree and query are
/// never mutated, so a fresh call to `Query::matches` replays the same
/// sequence.
pub struct Matches<'q, 't> {
    query: &'q Query,
    stack: Vec<SyntaxNode<'t>>,
    pending: VecDeque<CaptureSet<'t>>,
}

impl<'q, 't> Matches<'q, 't> {
    pub(crate) fn new(query: &'q Query, tree: &'t SyntaxTree) -> Self {
        Self {
            query,
            stack: vec![tree.root()],
            pending: VecDeque::new(),
        }
    }
}

impl<'t> Iterator for Matches<'_, 't> {
    type Item = CaptureSet<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(captures) = self.pending.pop_front() {
                return Some(captures);
            }

            let node = self.stack.pop()?;
            let mut children = node.children();
            children.reverse();
            self.stack.extend(children);

            let query = self.query;
            for (pattern_index, pattern) in query.pattern_matchers().enumerate() {
                for captures in unify_at(pattern, node, pattern_index) {
                    self.pending.push_back(captures);
                }
            }
        }
    }
}

/// All distinct solutions of unifying `matcher` against `node` as root.
pub(crate) fn unify_at<'t>(
    matcher: &NodeMatcher,
    node: SyntaxNode<'t>,
    pattern_index: usize,
) -> Vec<CaptureSet<'t>> {
    let mut binds: Vec<Binding<'t>> = Vec::new();
    let mut seen: Vec<Vec<(String, usize)>> = Vec::new();
    let mut solutions = Vec::new();

    unify(matcher, node, &mut binds, &mut |binds| {
        // Different backtracking branches can arrive at the same bindings
        // (e.g. through wildcards); report each distinct solution once.
        let key: Vec<(String, usize)> = binds
            .iter()
            .map(|(name, node)| (name.clone(), node.id()))
            .collect();
        if seen.contains(&key) {
            return;
        }
        seen.push(key);
        solutions.push(CaptureSet {
            pattern_index,
            root: node,
            bindings: binds.clone(),
        });
    });

    solutions
}

/// Unify one matcher against one node, invoking `found` once per solution
/// with the bindings made so far. Bindings are wound back on return.
fn unify<'t>(
    matcher: &NodeMatcher,
    node: SyntaxNode<'t>,
    binds: &mut Vec<Binding<'t>>,
    found: &mut dyn FnMut(&mut Vec<Binding<'t>>),
) {
    // Kind mismatch fails before any child work is attempted.
    if !kind_matches(&matcher.kind, node) {
        return;
    }

    let depth = binds.len();
    for name in &matcher.captures {
        binds.push((name.clone(), node));
    }

    let all_children = node.children();
    solve_children(&matcher.children, node, &all_children, 0, 0, binds, found);

    binds.truncate(depth);
}

fn kind_matches(kind: &KindMatcher, node: SyntaxNode<'_>) -> bool {
    match kind {
        KindMatcher::Kind(name) => node.is_named() && node.kind() == name,
        KindMatcher::Wildcard => node.is_named(),
        KindMatcher::Token(token) => !node.is_named() && node.kind() == token,
    }
}

/// Satisfy the child constraints from index `i` onward. `cursor` is the
/// position in `all` that the next positional constraint may match at or
/// after; field-anchored and structural constraints do not advance it.
fn solve_children<'t>(
    constraints: &[ChildMatcher],
    node: SyntaxNode<'t>,
    all: &[SyntaxNode<'t>],
    i: usize,
    cursor: usize,
    binds: &mut Vec<Binding<'t>>,
    found: &mut dyn FnMut(&mut Vec<Binding<'t>>),
) {
    if i == constraints.len() {
        found(binds);
        return;
    }

    match &constraints[i] {
        ChildMatcher::Field(field, child_matcher) => {
            for candidate in node.children_by_field(field) {
                unify(child_matcher, candidate, binds, &mut |binds| {
                    solve_children(constraints, node, all, i + 1, cursor, binds, found);
                });
            }
        }
        ChildMatcher::Positional(child_matcher) => {
            let wants_token = matches!(child_matcher.kind, KindMatcher::Token(_));
            for j in cursor..all.len() {
                if !wants_token && !all[j].is_named() {
                    continue;
                }
                unify(child_matcher, all[j], binds, &mut |binds| {
                    solve_children(constraints, node, all, i + 1, j + 1, binds, found);
                });
            }
        }
        ChildMatcher::Forbidden(forbidden) => {
            if all.iter().any(|child| can_unify(forbidden, *child)) {
                return;
            }
            solve_children(constraints, node, all, i + 1, cursor, binds, found);
        }
        ChildMatcher::AbsentField(field) => {
            if !node.children_by_field(field).is_empty() {
                return;
            }
            solve_children(constraints, node, all, i + 1, cursor, binds, found);
        }
    }
}

fn can_unify(matcher: &NodeMatcher, node: SyntaxNode<'_>) -> bool {
    let mut binds = Vec::new();
    let mut solved = false;
    unify(matcher, node, &mut binds, &mut |_| solved = true);
    solved
}
