//! Semantic types, value marks and capability views.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type a predicate node evaluates to.
///
/// Equality requires both sides to have the same `SqlType`; containment
/// requires the collection side to be an `Array`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    String,
    Number,
    Boolean,
    Array(Box<SqlType>),
}

impl SqlType {
    pub fn array_of(elem: SqlType) -> Self {
        SqlType::Array(Box::new(elem))
    }

    pub fn element(&self) -> Option<&SqlType> {
        match self {
            SqlType::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, SqlType::Array(_))
    }

    /// Capability view of a value of this type.
    pub fn use_as(&self) -> UseAs {
        match self {
            SqlType::String => UseAs::String,
            SqlType::Number => UseAs::Number,
            SqlType::Boolean => UseAs::Boolean,
            SqlType::Array(_) => UseAs::Array,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::String => f.write_str("string"),
            SqlType::Number => f.write_str("number"),
            SqlType::Boolean => f.write_str("boolean"),
            SqlType::Array(elem) => write!(f, "array<{elem}>"),
        }
    }
}

/// "Treat me as" view used by the equality/containment dispatch, so a column
/// holding text compares like a string literal without naming the column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseAs {
    String,
    Number,
    Boolean,
    Array,
    /// A JSON value whose membership test is key existence (`jsonb_exists`).
    KeySet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// The reference ended in a wildcard over an array column (`col[_]`).
    AnyElement,
    /// JSON collection; membership renders as a `jsonb_exists` call.
    JsonKeys,
}

impl Mark {
    const fn bit(self) -> u8 {
        match self {
            Mark::AnyElement => 1,
            Mark::JsonKeys => 1 << 1,
        }
    }
}

/// Set of [`Mark`]s carried by a column reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Marks(u8);

impl Marks {
    pub const NONE: Marks = Marks(0);

    pub const fn with(self, mark: Mark) -> Self {
        Marks(self.0 | mark.bit())
    }

    pub const fn has(self, mark: Mark) -> bool {
        self.0 & mark.bit() != 0
    }
}

impl From<Mark> for Marks {
    fn from(mark: Mark) -> Self {
        Marks::NONE.with(mark)
    }
}
