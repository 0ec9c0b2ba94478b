use super::{match_prefix, split_path, VariableMatcher};
use crate::error::ConvertError;
use crate::sqlast::{Accessor, ColumnRef, Mark, Node, SqlType, UseAs};
use regosql_ast::{Ref, Term};
use std::sync::Arc;

/// What a matcher does with reference segments past its registered path.
#[derive(Debug, Clone, Default)]
pub enum SuffixPolicy {
    /// No suffix accepted, except a wildcard after an array column.
    #[default]
    Exact,
    /// Exactly one extra segment, used as a JSON key into the column.
    JsonKey {
        /// Type of the value stored under each key.
        value_type: SqlType,
        /// Resolves dynamic keys (`col[input.org]`); static keys only if unset.
        key_resolver: Option<Arc<dyn VariableMatcher>>,
    },
}

/// Maps one dotted reference path onto one column.
#[derive(Debug, Clone)]
pub struct ColumnMatcher {
    path: Vec<String>,
    column: String,
    sql_type: SqlType,
    suffix: SuffixPolicy,
}

impl ColumnMatcher {
    pub fn new(path: &str, column: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            path: split_path(path),
            column: column.into(),
            sql_type,
            suffix: SuffixPolicy::Exact,
        }
    }

    pub fn with_suffix(mut self, suffix: SuffixPolicy) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl VariableMatcher for ColumnMatcher {
    fn convert_variable(&self, reference: &Ref) -> Result<Option<Node>, ConvertError> {
        let Some(rest) = match_prefix(&self.path, reference) else {
            return Ok(None);
        };
        resolve_leaf(
            reference,
            Accessor::column(&self.column),
            &self.sql_type,
            &self.suffix,
            rest,
        )
        .map(Some)
    }
}

/// Text column matched by exact path.
pub fn string_var_matcher(path: &str, column: impl Into<String>) -> ColumnMatcher {
    ColumnMatcher::new(path, column, SqlType::String)
}

/// JSON object column whose keys map to arrays of strings, e.g. a group ACL
/// `{"allUsers": ["read"], "<org id>": ["read", "update"]}`.
pub fn json_key_matcher(
    path: &str,
    column: impl Into<String>,
    key_resolver: Option<Arc<dyn VariableMatcher>>,
) -> ColumnMatcher {
    ColumnMatcher::new(path, column, SqlType::array_of(SqlType::String)).with_suffix(
        SuffixPolicy::JsonKey {
            value_type: SqlType::array_of(SqlType::String),
            key_resolver,
        },
    )
}

/// Build the node for a reference whose registered prefix has been consumed.
pub(crate) fn resolve_leaf(
    reference: &Ref,
    accessor: Accessor,
    sql_type: &SqlType,
    suffix: &SuffixPolicy,
    rest: &[Term],
) -> Result<Node, ConvertError> {
    let source = reference.to_string();
    match (suffix, rest) {
        (SuffixPolicy::Exact, []) => Ok(Node::column(ColumnRef::new(
            source,
            accessor,
            sql_type.clone(),
        ))),
        (SuffixPolicy::Exact, [Term::Var(_)]) => match sql_type.element() {
            Some(elem) => Ok(Node::column(
                ColumnRef::new(source, accessor, elem.clone()).with_mark(Mark::AnyElement),
            )),
            None => Err(ConvertError::malformed(
                reference,
                format!("wildcard over {sql_type} column"),
            )),
        },
        (
            SuffixPolicy::JsonKey {
                value_type,
                key_resolver,
            },
            [key],
        ) => {
            let key = json_key(reference, key, key_resolver.as_deref())?;
            let accessor = Accessor::JsonField {
                base: Box::new(accessor),
                key: Box::new(key),
                as_text: !value_type.is_collection(),
            };
            let column = ColumnRef::new(source, accessor, value_type.clone());
            Ok(Node::column(if value_type.is_collection() {
                column.with_mark(Mark::JsonKeys)
            } else {
                column
            }))
        }
        (SuffixPolicy::JsonKey { .. }, []) => Err(ConvertError::malformed(
            reference,
            "expected a key after the JSON column",
        )),
        (_, rest) => Err(ConvertError::malformed(
            reference,
            format!("unexpected path suffix {}", suffix_text(rest)),
        )),
    }
}

fn suffix_text(rest: &[Term]) -> String {
    rest.iter()
        .map(|segment| match segment {
            Term::String(key) => format!(".{key}"),
            other => format!("[{other}]"),
        })
        .collect()
}

fn json_key(
    reference: &Ref,
    key: &Term,
    key_resolver: Option<&dyn VariableMatcher>,
) -> Result<Node, ConvertError> {
    match key {
        Term::String(key) => Ok(Node::string(key.as_str())),
        Term::Number(n) if n.as_i64().is_some() => Ok(Node::number(n.as_str())),
        Term::Ref(key_ref) => {
            let Some(resolver) = key_resolver else {
                return Err(ConvertError::malformed(
                    reference,
                    "dynamic JSON key needs a key resolver",
                ));
            };
            let node = resolver
                .convert_variable(key_ref)?
                .ok_or_else(|| ConvertError::UnresolvedVariable(key_ref.to_string()))
                .map_err(|err| err.context(format!("JSON key of {reference}")))?;
            if node.is_any_element() {
                return Err(ConvertError::malformed(
                    reference,
                    format!("JSON key {key_ref} is a wildcard, not a single value"),
                ));
            }
            match node.use_as() {
                UseAs::String | UseAs::Number => Ok(node),
                _ => Err(ConvertError::TypeMismatch(format!(
                    "JSON key {key_ref} of {reference} resolved to {}",
                    node.describe()
                ))),
            }
        }
        other => Err(ConvertError::malformed(
            reference,
            format!("unsupported JSON key {}", other.kind_name()),
        )),
    }
}
