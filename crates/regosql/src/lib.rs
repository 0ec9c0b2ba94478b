//! Partial-evaluation policy queries → SQL WHERE predicates
//!
//! The pipeline is:
//!
//! 1. [`convert::convert`] walks the query tree from `regosql_ast`,
//!    resolving references through a [`resolver::VariableMatcher`] chain,
//! 2. the result is a typed [`sqlast::Node`] tree,
//! 3. [`serialize::to_sql`] renders the tree and hands the fragment to a
//!    [`serialize::SqlBackend`].
//!
//! Matcher chains are usually built from a JSON [`config::ResolverConfig`].

pub mod config;
pub mod convert;
pub mod error;
pub mod resolver;
pub mod serialize;
pub mod sqlast;

pub use config::{ConfigError, ResolverConfig};
pub use convert::{convert, ConvertConfig};
pub use error::{ConvertError, ErrorKind};
pub use resolver::{
    json_key_matcher, string_var_matcher, ColumnMatcher, ColumnName, PathTree, SuffixPolicy,
    VariableConverter, VariableMatcher,
};
pub use serialize::{to_sql, SerializeError, SqlBackend, SqlParserBackend, Verbatim};
pub use sqlast::{Node, SqlGenerator, SqlType};
