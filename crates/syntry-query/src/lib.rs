//! Query compilation, tree matching and predicate evaluation.
//!
//! This crate implements the query engine of the scanner:
//! - Pattern text parsing (s-expression node matchers, captures, predicates)
//! - Backtracking unification of patterns against syntax trees
//! - Post-match predicate filtering with static cost ordering
//! - Finding emission from accepted capture sets

pub mod catalog;
mod emit;
mod matcher;
mod pattern;
mod predicate;
mod query;

pub use matcher::{CaptureSet, Matches};
pub use pattern::{ChildMatcher, KindMatcher, NodeMatcher, PredicateArg};
pub use predicate::PredicateRegistry;
pub use query::{Evaluated, Query};
