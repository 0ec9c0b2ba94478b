//! Policy-language query bodies (the partial-evaluation output plane)
//!
//! This crate defines the read-only input tree that `regosql` converts into
//! SQL predicates:
//!
//! - a [`Query`] is an ordered list of [`Expr`]s joined with AND,
//! - a slice of queries is joined with OR,
//! - an [`Expr`] is either an operator [`Call`] or a bare [`Term`].
//!
//! Partial evaluators normally construct these trees directly. The
//! [`parse`] module provides a small text parser for query bodies so the CLI
//! and tests can write `input.object.owner = "alice"` instead of building
//! the tree by hand.

pub mod parse;
pub mod term;

pub use parse::{parse_queries, parse_query, parse_term, ParseError};
pub use term::{Call, Expr, Number, Query, Ref, Term};
