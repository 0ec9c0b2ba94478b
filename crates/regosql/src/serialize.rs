//! Final SQL text generation.
//!
//! A node tree renders to a WHERE fragment; a [`SqlBackend`] then decides the
//! final text. [`Verbatim`] returns the fragment as rendered, while
//! [`SqlParserBackend`] parses it as a PostgreSQL expression and prints the
//! parsed form, rejecting anything that is not a single well-formed
//! expression.

use crate::sqlast::{Node, RenderError, SqlGenerator};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("WHERE fragment does not parse: {0}")]
    Parse(#[from] ParserError),

    #[error("WHERE fragment has trailing input starting at `{0}`")]
    TrailingInput(String),
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("sql render failed: {}", join_errors(.0))]
    Render(Vec<RenderError>),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn join_errors(errors: &[RenderError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub trait SqlBackend {
    fn serialize(&self, fragment: &str) -> Result<String, BackendError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl SqlBackend for Verbatim {
    fn serialize(&self, fragment: &str) -> Result<String, BackendError> {
        Ok(fragment.to_owned())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParserBackend;

impl SqlBackend for SqlParserBackend {
    fn serialize(&self, fragment: &str) -> Result<String, BackendError> {
        let dialect = PostgreSqlDialect {};
        let mut parser = Parser::new(&dialect).try_with_sql(fragment)?;
        let expr = parser.parse_expr()?;
        let next = parser.peek_token();
        if next.token != Token::EOF {
            return Err(BackendError::TrailingInput(next.token.to_string()));
        }
        Ok(expr.to_string())
    }
}

/// Render a node with a fresh generator, returning the text and diagnostics.
pub fn render(node: &Node) -> (String, Vec<RenderError>) {
    let mut gen = SqlGenerator::new();
    let sql = node.sql_string(&mut gen);
    (sql, gen.into_errors())
}

/// Render and serialize; any render diagnostic fails the whole call.
pub fn to_sql(node: &Node, backend: &dyn SqlBackend) -> Result<String, SerializeError> {
    let (sql, errors) = render(node);
    if !errors.is_empty() {
        tracing::debug!(diagnostics = errors.len(), partial = %sql, "render produced diagnostics");
        return Err(SerializeError::Render(errors));
    }
    Ok(backend.serialize(&sql)?)
}
