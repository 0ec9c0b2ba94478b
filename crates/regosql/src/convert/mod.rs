//! Policy query → predicate tree conversion.
//!
//! Queries are OR'ed, expressions within a query are AND'ed. Two shortcuts
//! come first: no queries at all means the policy never allows (`false`), and
//! any empty query means it always allows (`true`).

mod call;
mod term;

pub use call::convert_call;
pub use term::{convert_term, convert_terms};

use crate::error::{ConvertError, ErrorKind, ResultExt};
use crate::resolver::VariableMatcher;
use crate::sqlast::Node;
use regosql_ast::{Expr, Query};
use std::sync::Arc;

/// Caller-supplied conversion settings.
#[derive(Debug, Clone, Default)]
pub struct ConvertConfig {
    /// Resolves references to columns. Without one, every reference fails.
    pub variable_converter: Option<Arc<dyn VariableMatcher>>,
    /// Replace expressions with unresolvable references by `false`.
    pub unknown_vars_false: bool,
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable_converter(mut self, matcher: impl VariableMatcher + 'static) -> Self {
        self.variable_converter = Some(Arc::new(matcher));
        self
    }

    pub fn with_unknown_vars_false(mut self, enabled: bool) -> Self {
        self.unknown_vars_false = enabled;
        self
    }
}

/// Convert a partial-evaluation result into one boolean predicate.
pub fn convert(cfg: &ConvertConfig, queries: &[Query]) -> Result<Node, ConvertError> {
    if queries.is_empty() {
        tracing::debug!("no queries, predicate is false");
        return Ok(Node::bool(false));
    }
    if let Some(index) = queries.iter().position(Query::is_empty) {
        tracing::debug!(query = index, "empty query, predicate is true");
        return Ok(Node::bool(true));
    }

    let mut nodes = Vec::with_capacity(queries.len());
    for (index, query) in queries.iter().enumerate() {
        let node = convert_query(cfg, query).with_context(|| format!("query {index}"))?;
        nodes.push(node);
    }
    let source = queries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    tracing::debug!(queries = queries.len(), "converted policy queries");
    Ok(Node::or(source, nodes))
}

/// AND of the query's expressions.
pub fn convert_query(cfg: &ConvertConfig, query: &Query) -> Result<Node, ConvertError> {
    let mut nodes = Vec::with_capacity(query.len());
    for expr in query.exprs() {
        let node = convert_expression(cfg, expr).with_context(|| format!("expression `{expr}`"))?;
        nodes.push(node);
    }
    if nodes.is_empty() {
        return Err(ConvertError::EmptyResult);
    }
    Ok(Node::and(query.to_string(), nodes))
}

pub fn convert_expression(cfg: &ConvertConfig, expr: &Expr) -> Result<Node, ConvertError> {
    let converted = match expr {
        Expr::Call(call) => convert_call(cfg, call),
        Expr::Term(term) => convert_term(cfg, term).and_then(|node| {
            if node.is_boolean_node() {
                Ok(node)
            } else {
                Err(ConvertError::TypeMismatch(format!(
                    "expression {term} is not boolean, got {}",
                    node.describe()
                )))
            }
        }),
    };
    match converted {
        Err(err) if cfg.unknown_vars_false && err.kind() == ErrorKind::UnresolvedVariable => {
            tracing::warn!(
                expression = %expr,
                error = %err,
                "unresolved variable, expression folded to false"
            );
            Ok(Node::bool(false))
        }
        other => other,
    }
}
