//! Hierarchical matcher: a tree of registered paths, each leaf a column.

use super::column::{resolve_leaf, SuffixPolicy};
use super::{split_path, VariableMatcher};
use crate::error::ConvertError;
use crate::sqlast::{Accessor, Node, SqlType};
use regex::Regex;
use regosql_ast::{Ref, Term};
use std::collections::BTreeMap;

/// How a tree leaf names its column.
#[derive(Debug, Clone)]
pub enum ColumnName {
    /// A fixed, possibly qualified column name.
    Static(String),
    /// Computed from the matched dotted path, e.g. pattern `^input\.post\.(\w+)$`
    /// with replacement `posts.$1`.
    Template { pattern: Regex, replace: String },
}

impl ColumnName {
    pub fn fixed(name: impl Into<String>) -> Self {
        ColumnName::Static(name.into())
    }

    pub fn template(pattern: &str, replace: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(ColumnName::Template {
            pattern: Regex::new(pattern)?,
            replace: replace.into(),
        })
    }

    fn accessor(&self, reference: &Ref, matched: &str) -> Result<Accessor, ConvertError> {
        match self {
            ColumnName::Static(name) => Ok(Accessor::column(name)),
            ColumnName::Template { pattern, replace } => {
                let Some(caps) = pattern.captures(matched) else {
                    return Err(ConvertError::malformed(
                        reference,
                        format!("path {matched} does not match column template {pattern}"),
                    ));
                };
                let mut name = String::new();
                caps.expand(replace, &mut name);
                Ok(Accessor::Raw(name))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeLeaf {
    pub sql_type: SqlType,
    pub column: ColumnName,
    pub suffix: SuffixPolicy,
}

impl TreeLeaf {
    pub fn new(sql_type: SqlType, column: ColumnName) -> Self {
        Self {
            sql_type,
            column,
            suffix: SuffixPolicy::Exact,
        }
    }

    pub fn with_suffix(mut self, suffix: SuffixPolicy) -> Self {
        self.suffix = suffix;
        self
    }
}

#[derive(Debug, Clone, Default)]
struct TreeNode {
    children: BTreeMap<String, TreeNode>,
    leaf: Option<TreeLeaf>,
}

/// Paths registered as a tree; the deepest registered node on a reference's
/// walk owns it.
///
/// Segments past the owning node are handed to the leaf's [`SuffixPolicy`].
/// There is no implicit fallback: a leaf without a suffix policy rejects any
/// leftover segment, and a walk that ends on an unregistered intermediate
/// node is not claimed.
#[derive(Debug, Clone, Default)]
pub struct PathTree {
    root: TreeNode,
}

impl PathTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(self, path: &str, sql_type: SqlType, column: ColumnName) -> Self {
        self.add_leaf(path, TreeLeaf::new(sql_type, column))
    }

    pub fn add_leaf(mut self, path: &str, leaf: TreeLeaf) -> Self {
        let mut node = &mut self.root;
        for segment in split_path(path) {
            node = node.children.entry(segment).or_default();
        }
        node.leaf = Some(leaf);
        self
    }
}

impl VariableMatcher for PathTree {
    fn convert_variable(&self, reference: &Ref) -> Result<Option<Node>, ConvertError> {
        let Some(head) = reference.head() else {
            return Ok(None);
        };
        let Some(mut node) = self.root.children.get(head) else {
            return Ok(None);
        };
        let segments = reference.segments();
        let mut walked = vec![head];
        let mut owner = node.leaf.as_ref().map(|leaf| (leaf, 1));
        for segment in &segments[1..] {
            let Term::String(key) = segment else {
                break;
            };
            let Some(next) = node.children.get(key.as_str()) else {
                break;
            };
            node = next;
            walked.push(key.as_str());
            if let Some(leaf) = &node.leaf {
                owner = Some((leaf, walked.len()));
            }
        }
        let Some((leaf, consumed)) = owner else {
            return Ok(None);
        };
        let matched = walked[..consumed].join(".");
        tracing::trace!(reference = %reference, owner = %matched, "path tree owner");
        let accessor = leaf.column.accessor(reference, &matched)?;
        resolve_leaf(
            reference,
            accessor,
            &leaf.sql_type,
            &leaf.suffix,
            &segments[consumed..],
        )
        .map(Some)
    }
}
