//! JSON resolver configuration.
//!
//! ```json
//! {
//!   "unknown_vars_false": true,
//!   "matchers": [
//!     { "kind": "column", "path": "input.object.owner", "column": "owner", "type": "string" },
//!     { "kind": "json_keys", "path": "input.object.acl_group_list",
//!       "column": "group_acl", "resolve_keys": true },
//!     { "kind": "tree", "elements": [
//!       { "path": "input.post.author", "type": "string",
//!         "column_template": { "pattern": "^input\\.post\\.(\\w+)$", "replace": "posts.$1" } }
//!     ] }
//!   ]
//! }
//! ```

use crate::convert::ConvertConfig;
use crate::resolver::{
    ColumnMatcher, ColumnName, PathTree, SuffixPolicy, TreeLeaf, VariableConverter,
    VariableMatcher,
};
use crate::sqlast::SqlType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid resolver config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path {path:?}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("tree element {path:?} needs exactly one of `column` and `column_template`")]
    ColumnName { path: String },

    #[error("invalid column template {pattern:?}")]
    Template {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    #[serde(default)]
    pub unknown_vars_false: bool,
    #[serde(default)]
    pub matchers: Vec<MatcherConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatcherConfig {
    Column {
        path: String,
        column: String,
        #[serde(rename = "type")]
        sql_type: SqlType,
    },
    JsonKeys {
        path: String,
        column: String,
        /// Resolve dynamic keys through the `column` matchers.
        #[serde(default)]
        resolve_keys: bool,
        #[serde(default = "default_json_value_type")]
        value_type: SqlType,
    },
    Tree {
        elements: Vec<TreeElementConfig>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeElementConfig {
    pub path: String,
    #[serde(rename = "type")]
    pub sql_type: SqlType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_template: Option<TemplateConfig>,
    /// Accept one trailing JSON key, with values of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_key: Option<SqlType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    pub pattern: String,
    pub replace: String,
}

fn default_json_value_type() -> SqlType {
    SqlType::array_of(SqlType::String)
}

impl ResolverConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the matcher chain in declaration order.
    ///
    /// Dynamic JSON keys resolve through a converter made of the `column`
    /// matchers only, so a key can never recurse into a JSON matcher.
    pub fn build(&self) -> Result<VariableConverter, ConfigError> {
        let mut keys = VariableConverter::new();
        for matcher in &self.matchers {
            if let MatcherConfig::Column {
                path,
                column,
                sql_type,
            } = matcher
            {
                keys = keys.register_matcher(column_matcher(path, column, sql_type.clone())?);
            }
        }
        let keys: Arc<dyn VariableMatcher> = Arc::new(keys);

        let mut converter = VariableConverter::new();
        for matcher in &self.matchers {
            converter = match matcher {
                MatcherConfig::Column {
                    path,
                    column,
                    sql_type,
                } => converter.register_matcher(column_matcher(path, column, sql_type.clone())?),
                MatcherConfig::JsonKeys {
                    path,
                    column,
                    resolve_keys,
                    value_type,
                } => converter.register_matcher(
                    column_matcher(path, column, value_type.clone())?.with_suffix(
                        SuffixPolicy::JsonKey {
                            value_type: value_type.clone(),
                            key_resolver: resolve_keys.then(|| Arc::clone(&keys)),
                        },
                    ),
                ),
                MatcherConfig::Tree { elements } => converter.register_matcher(tree(elements)?),
            };
        }
        Ok(converter)
    }

    pub fn convert_config(&self) -> Result<ConvertConfig, ConfigError> {
        Ok(ConvertConfig::new()
            .with_variable_converter(self.build()?)
            .with_unknown_vars_false(self.unknown_vars_false))
    }
}

fn check_path(path: &str) -> Result<(), ConfigError> {
    if path.split('.').any(str::is_empty) {
        return Err(ConfigError::InvalidPath {
            path: path.to_owned(),
            message: "empty segment".into(),
        });
    }
    Ok(())
}

fn column_matcher(
    path: &str,
    column: &str,
    sql_type: SqlType,
) -> Result<ColumnMatcher, ConfigError> {
    check_path(path)?;
    if column.is_empty() {
        return Err(ConfigError::InvalidPath {
            path: path.to_owned(),
            message: "empty column name".into(),
        });
    }
    Ok(ColumnMatcher::new(path, column, sql_type))
}

fn tree(elements: &[TreeElementConfig]) -> Result<PathTree, ConfigError> {
    let mut tree = PathTree::new();
    for element in elements {
        check_path(&element.path)?;
        let column = match (&element.column, &element.column_template) {
            (Some(name), None) => ColumnName::fixed(name.as_str()),
            (None, Some(template)) => ColumnName::template(&template.pattern, &template.replace)
                .map_err(|source| ConfigError::Template {
                    pattern: template.pattern.clone(),
                    source,
                })?,
            _ => {
                return Err(ConfigError::ColumnName {
                    path: element.path.clone(),
                })
            }
        };
        let mut leaf = TreeLeaf::new(element.sql_type.clone(), column);
        if let Some(value_type) = &element.json_key {
            leaf = leaf.with_suffix(SuffixPolicy::JsonKey {
                value_type: value_type.clone(),
                key_resolver: None,
            });
        }
        tree = tree.add_leaf(&element.path, leaf);
    }
    Ok(tree)
}
