//! Post-match predicate compilation and evaluation.
//!
//! Predicates filter capture sets after a syntactic match has succeeded.
//! The builtin set is `{eq, match, has-child, not-has-child, any-of}`;
//! callers can register additional predicates with a declared cost before
//! compiling queries (closed-but-extensible-by-registration).

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::error;

use syntry_core::EngineError;

use crate::matcher::CaptureSet;
use crate::pattern::{ParsedPredicate, PredicateArg};

/// Evaluation function for a registered custom predicate.
pub type CustomEval =
    Arc<dyn Fn(&[PredicateArg], &CaptureSet<'_>) -> Result<bool, EngineError> + Send + Sync>;

// Cost classes used for the static cheap-first ordering.
const COST_EQ: u8 = 0;
const COST_CHILD: u8 = 1;
const COST_ANY_OF: u8 = 1;
const COST_REGEX: u8 = 2;

/// What `#eq?` compares the bound text against.
#[derive(Clone)]
enum EqRhs {
    Literal(String),
    Capture(String),
}

#[derive(Clone)]
enum PredicateOp {
    Eq { capture: String, rhs: EqRhs },
    Match { capture: String, regex: Regex },
    HasChild { capture: String, kind: String, negated: bool },
    AnyOf { capture: String, values: Vec<String> },
    Custom { name: String, args: Vec<PredicateArg>, eval: CustomEval },
}

/// A predicate compiled against the registry, ready for evaluation.
#[derive(Clone)]
pub(crate) struct CompiledPredicate {
    op: PredicateOp,
    cost: u8,
}

impl CompiledPredicate {
    pub(crate) fn cost(&self) -> u8 {
        self.cost
    }

    /// Capture names this predicate reads; checked against the pattern's
    /// bound captures at compile time.
    pub(crate) fn capture_refs(&self) -> Vec<&str> {
        match &self.op {
            PredicateOp::Eq { capture, rhs } => {
                let mut refs = vec![capture.as_str()];
                if let EqRhs::Capture(other) = rhs {
                    refs.push(other.as_str());
                }
                refs
            }
            PredicateOp::Match { capture, .. }
            | PredicateOp::HasChild { capture, .. }
            | PredicateOp::AnyOf { capture, .. } => vec![capture.as_str()],
            PredicateOp::Custom { args, .. } => args
                .iter()
                .filter_map(|arg| match arg {
                    PredicateArg::Capture(name) => Some(name.as_str()),
                    PredicateArg::Literal(_) => None,
                })
                .collect(),
        }
    }

    /// Evaluate against a capture set. `MissingCapture` here means the
    /// compiler's validation was defeated; it is logged loudly and
    /// propagated, never swallowed.
    pub(crate) fn accept(&self, captures: &CaptureSet<'_>) -> Result<bool, EngineError> {
        match &self.op {
            PredicateOp::Eq { capture, rhs } => {
                let text = bound_text(captures, capture)?;
                match rhs {
                    EqRhs::Literal(value) => Ok(text == value),
                    EqRhs::Capture(other) => Ok(text == bound_text(captures, other)?),
                }
            }
            PredicateOp::Match { capture, regex } => {
                Ok(regex.is_match(bound_text(captures, capture)?))
            }
            PredicateOp::HasChild { capture, kind, negated } => {
                let node = bound_node(captures, capture)?;
                Ok(node.has_child_of_kind(kind) != *negated)
            }
            PredicateOp::AnyOf { capture, values } => {
                let text = bound_text(captures, capture)?;
                Ok(values.iter().any(|v| v == text))
            }
            PredicateOp::Custom { args, eval, .. } => eval(args, captures),
        }
    }
}

impl std::fmt::Debug for CompiledPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match &self.op {
            PredicateOp::Eq { .. } => "eq",
            PredicateOp::Match { .. } => "match",
            PredicateOp::HasChild { negated: false, .. } => "has-child",
            PredicateOp::HasChild { negated: true, .. } => "not-has-child",
            PredicateOp::AnyOf { .. } => "any-of",
            PredicateOp::Custom { name, .. } => name,
        };
        f.debug_struct("CompiledPredicate")
            .field("name", &name)
            .field("cost", &self.cost)
            .finish()
    }
}

fn bound_node<'t>(
    captures: &CaptureSet<'t>,
    name: &str,
) -> Result<syntry_grammars::SyntaxNode<'t>, EngineError> {
    captures.get(name).ok_or_else(|| {
        error!(
            capture = name,
            "predicate read a capture missing from the capture set; this is an engine defect"
        );
        EngineError::MissingCapture {
            name: name.to_string(),
        }
    })
}

fn bound_text<'t>(captures: &CaptureSet<'t>, name: &str) -> Result<&'t str, EngineError> {
    Ok(bound_node(captures, name)?.text())
}

/// Evaluate a compiled predicate list: logical AND, short-circuiting on
/// the first failure in (cheap-first) compiled order.
pub(crate) fn accept_all(
    predicates: &[CompiledPredicate],
    captures: &CaptureSet<'_>,
) -> Result<bool, EngineError> {
    for predicate in predicates {
        if !predicate.accept(captures)? {
            return Ok(false);
        }
    }
    Ok(true)
}

struct CustomPredicate {
    cost: u8,
    eval: CustomEval,
}

/// Recognized predicate names. Ships the builtin five; `register` extends
/// the set before any query is compiled.
pub struct PredicateRegistry {
    custom: HashMap<String, CustomPredicate>,
}

impl PredicateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
        }
    }

    /// Register a custom predicate under `name` (used as `#name?` in
    /// pattern text). `cost` slots it into the cheap-first ordering
    /// relative to the builtins (eq = 0, child checks = 1, regex = 2).
    pub fn register<F>(&mut self, name: &str, cost: u8, eval: F)
    where
        F: Fn(&[PredicateArg], &CaptureSet<'_>) -> Result<bool, EngineError>
            + Send
            + Sync
            + 'static,
    {
        self.custom.insert(
            name.to_string(),
            CustomPredicate {
                cost,
                eval: Arc::new(eval),
            },
        );
    }

    pub(crate) fn compile(
        &self,
        parsed: &ParsedPredicate,
    ) -> Result<CompiledPredicate, EngineError> {
        let args = &parsed.args;
        match parsed.name.as_str() {
            "eq" => {
                let capture = expect_capture(parsed, 0)?;
                let rhs = match args.get(1) {
                    Some(PredicateArg::Literal(value)) => EqRhs::Literal(value.clone()),
                    Some(PredicateArg::Capture(other)) => EqRhs::Capture(other.clone()),
                    None => return Err(arity(parsed, "#eq? takes a capture and one argument")),
                };
                if args.len() != 2 {
                    return Err(arity(parsed, "#eq? takes a capture and one argument"));
                }
                Ok(CompiledPredicate {
                    op: PredicateOp::Eq { capture, rhs },
                    cost: COST_EQ,
                })
            }
            "match" => {
                let capture = expect_capture(parsed, 0)?;
                let pattern = expect_literal(parsed, 1)?;
                if args.len() != 2 {
                    return Err(arity(parsed, "#match? takes a capture and a regex"));
                }
                let regex = Regex::new(&pattern).map_err(|e| EngineError::QuerySyntax {
                    offset: parsed.offset,
                    message: format!("invalid regex in #match?: {e}"),
                })?;
                Ok(CompiledPredicate {
                    op: PredicateOp::Match { capture, regex },
                    cost: COST_REGEX,
                })
            }
            "has-child" | "not-has-child" => {
                let capture = expect_capture(parsed, 0)?;
                let kind = expect_literal(parsed, 1)?;
                if args.len() != 2 {
                    return Err(arity(parsed, "child predicates take a capture and a kind"));
                }
                Ok(CompiledPredicate {
                    op: PredicateOp::HasChild {
                        capture,
                        kind,
                        negated: parsed.name == "not-has-child",
                    },
                    cost: COST_CHILD,
                })
            }
            "any-of" => {
                let capture = expect_capture(parsed, 0)?;
                let values: Vec<String> = args[1..]
                    .iter()
                    .map(|arg| match arg {
                        PredicateArg::Literal(value) => Ok(value.clone()),
                        PredicateArg::Capture(_) => {
                            Err(arity(parsed, "#any-of? alternatives must be strings"))
                        }
                    })
                    .collect::<Result<_, _>>()?;
                if values.is_empty() {
                    return Err(arity(parsed, "#any-of? needs at least one alternative"));
                }
                Ok(CompiledPredicate {
                    op: PredicateOp::AnyOf { capture, values },
                    cost: COST_ANY_OF,
                })
            }
            name => match self.custom.get(name) {
                Some(custom) => Ok(CompiledPredicate {
                    op: PredicateOp::Custom {
                        name: name.to_string(),
                        args: args.clone(),
                        eval: Arc::clone(&custom.eval),
                    },
                    cost: custom.cost,
                }),
                None => Err(EngineError::UnknownPredicate {
                    name: name.to_string(),
                }),
            },
        }
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_capture(parsed: &ParsedPredicate, index: usize) -> Result<String, EngineError> {
    match parsed.args.get(index) {
        Some(PredicateArg::Capture(name)) => Ok(name.clone()),
        _ => Err(arity(parsed, "first predicate argument must be a capture")),
    }
}

fn expect_literal(parsed: &ParsedPredicate, index: usize) -> Result<String, EngineError> {
    match parsed.args.get(index) {
        Some(PredicateArg::Literal(value)) => Ok(value.clone()),
        _ => Err(arity(parsed, "expected a string argument")),
    }
}

fn arity(parsed: &ParsedPredicate, message: &str) -> EngineError {
    EngineError::QuerySyntax {
        offset: parsed.offset,
        message: format!("#{}?: {}", parsed.name, message),
    }
}
