//! Variable resolution: map policy references onto SQL column nodes.
//!
//! A [`VariableMatcher`] answers one of three ways for a reference:
//!
//! - `Ok(Some(node))` when it owns the reference,
//! - `Ok(None)` when the reference is not its concern,
//! - `Err(..)` when it claimed the reference but cannot convert it.
//!
//! [`VariableConverter`] chains matchers; the first one to answer with a
//! node or an error decides.

mod column;
mod tree;

pub use column::{json_key_matcher, string_var_matcher, ColumnMatcher, SuffixPolicy};
pub use tree::{ColumnName, PathTree, TreeLeaf};

use crate::error::ConvertError;
use crate::sqlast::Node;
use regosql_ast::{Ref, Term};
use std::fmt;
use std::sync::Arc;

pub trait VariableMatcher: fmt::Debug + Send + Sync {
    fn convert_variable(&self, reference: &Ref) -> Result<Option<Node>, ConvertError>;
}

impl<M: VariableMatcher + ?Sized> VariableMatcher for Arc<M> {
    fn convert_variable(&self, reference: &Ref) -> Result<Option<Node>, ConvertError> {
        (**self).convert_variable(reference)
    }
}

/// Ordered chain of matchers.
#[derive(Debug, Clone, Default)]
pub struct VariableConverter {
    matchers: Vec<Arc<dyn VariableMatcher>>,
}

impl VariableConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_matcher(self, matcher: impl VariableMatcher + 'static) -> Self {
        self.register_shared(Arc::new(matcher))
    }

    pub fn register_shared(mut self, matcher: Arc<dyn VariableMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl VariableMatcher for VariableConverter {
    fn convert_variable(&self, reference: &Ref) -> Result<Option<Node>, ConvertError> {
        for (index, matcher) in self.matchers.iter().enumerate() {
            if let Some(node) = matcher.convert_variable(reference)? {
                tracing::trace!(reference = %reference, matcher = index, "reference resolved");
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}

/// Split a dotted path (`input.object.owner`) into segments.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_owned).collect()
}

/// Match `reference` against a dotted `path` prefix.
///
/// Segment 0 of the reference must be a variable named like `path[0]`, the
/// rest must be string keys equal to the remaining path segments. Returns the
/// unmatched suffix, or `None` when the prefix does not match.
pub fn match_prefix<'r>(path: &[String], reference: &'r Ref) -> Option<&'r [Term]> {
    let segments = reference.segments();
    if path.is_empty() || segments.len() < path.len() {
        return None;
    }
    match &segments[0] {
        Term::Var(name) if *name == path[0] => {}
        _ => return None,
    }
    for (want, got) in path.iter().zip(segments).skip(1) {
        match got {
            Term::String(key) if key == want => {}
            _ => return None,
        }
    }
    Some(&segments[path.len()..])
}
