//! Typed SQL predicate tree.
//!
//! Nodes are built by the converter, then rendered once through a
//! [`SqlGenerator`]. Rendering never fails: unsupported combinations record
//! a diagnostic on the generator and emit a sentinel token in their place.

mod array;
mod boolean_op;
mod column;
mod equality;
mod generator;
mod literal;
mod member;
mod types;

pub use array::ArrayNode;
pub use boolean_op::{BinaryOperator, BooleanOp};
pub use column::{quote_ident, Accessor, ColumnRef};
pub use equality::{Equality, SupportsEquality};
pub use generator::{RenderError, SqlGenerator};
pub use literal::{quote_literal, BoolLit, NumberLit, StringLit};
pub use member::{Containment, SupportsContains};
pub use types::{Mark, Marks, SqlType, UseAs};

use crate::error::ConvertError;
use equality::compound_equals;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    String(StringLit),
    Number(NumberLit),
    Boolean(BoolLit),
    Column(ColumnRef),
    Array(ArrayNode),
    Equality(Equality),
    Containment(Containment),
    BoolOp(BooleanOp),
}

// ============================================================================
// Construction
// ============================================================================

impl Node {
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        Node::String(StringLit {
            source: format!("{value:?}"),
            value,
        })
    }

    /// Number literal from its policy text, which is emitted verbatim.
    pub fn number(text: impl Into<String>) -> Self {
        Node::Number(NumberLit { value: text.into() })
    }

    pub fn bool(value: bool) -> Self {
        Node::Boolean(BoolLit { value })
    }

    pub fn column(column: ColumnRef) -> Self {
        Node::Column(column)
    }

    pub fn array(source: impl Into<String>, elems: Vec<Node>) -> Result<Self, ConvertError> {
        ArrayNode::new(source, elems).map(Node::Array)
    }

    pub fn equality(not: bool, left: Node, right: Node) -> Self {
        Node::Equality(Equality {
            left: Box::new(left),
            right: Box::new(right),
            not,
        })
    }

    pub fn member_of(not: bool, collection: Node, element: Node) -> Self {
        Node::Containment(Containment {
            collection: Box::new(collection),
            element: Box::new(element),
            not,
        })
    }

    /// Conjunction; zero terms is `true` and a single term stands alone.
    pub fn and(source: impl Into<String>, terms: Vec<Node>) -> Self {
        Self::boolean_op(source.into(), BinaryOperator::And, terms)
    }

    /// Disjunction; zero terms is `false` and a single term stands alone.
    pub fn or(source: impl Into<String>, terms: Vec<Node>) -> Self {
        Self::boolean_op(source.into(), BinaryOperator::Or, terms)
    }

    fn boolean_op(source: String, op: BinaryOperator, mut terms: Vec<Node>) -> Self {
        match terms.len() {
            0 => Node::bool(op.identity()),
            1 => terms.remove(0),
            _ => Node::BoolOp(BooleanOp { source, op, terms }),
        }
    }
}

// ============================================================================
// Inspection
// ============================================================================

impl Node {
    pub fn sql_type(&self) -> SqlType {
        match self {
            Node::String(_) => SqlType::String,
            Node::Number(_) => SqlType::Number,
            Node::Column(col) => col.sql_type.clone(),
            Node::Array(arr) => SqlType::array_of(arr.elem_type().clone()),
            Node::Boolean(_) | Node::Equality(_) | Node::Containment(_) | Node::BoolOp(_) => {
                SqlType::Boolean
            }
        }
    }

    pub fn use_as(&self) -> UseAs {
        match self {
            Node::Column(col) => col.use_as(),
            other => other.sql_type().use_as(),
        }
    }

    /// Whether the node can stand alone as a WHERE predicate.
    pub fn is_boolean_node(&self) -> bool {
        match self {
            Node::Boolean(_) | Node::Equality(_) | Node::Containment(_) | Node::BoolOp(_) => true,
            Node::Column(col) => col.sql_type == SqlType::Boolean && !col.is_any_element(),
            Node::String(_) | Node::Number(_) | Node::Array(_) => false,
        }
    }

    pub fn is_any_element(&self) -> bool {
        matches!(self, Node::Column(col) if col.is_any_element())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::String(_) => "string literal",
            Node::Number(_) => "number literal",
            Node::Boolean(_) => "boolean literal",
            Node::Column(_) => "column",
            Node::Array(_) => "array",
            Node::Equality(_) => "equality",
            Node::Containment(_) => "containment",
            Node::BoolOp(_) => "boolean operator",
        }
    }

    /// Short human description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Node::String(lit) => format!("string literal {}", lit.source),
            Node::Number(lit) => format!("number literal {}", lit.value),
            Node::Boolean(lit) => format!("boolean literal {}", lit.sql_string()),
            Node::Column(col) => format!("column {} ({})", col.source, col.sql_type),
            Node::Array(arr) => format!("array {} ({})", arr.source(), self.sql_type()),
            other => other.kind_name().to_owned(),
        }
    }

    pub fn as_equality(&self) -> Option<&dyn SupportsEquality> {
        match self {
            Node::String(lit) => Some(lit),
            Node::Number(lit) => Some(lit),
            Node::Boolean(lit) => Some(lit),
            Node::Column(col) => Some(col),
            Node::Equality(eq) => Some(eq),
            Node::Containment(member) => Some(member),
            Node::BoolOp(op) => Some(op),
            Node::Array(_) => None,
        }
    }

    pub fn as_contains(&self) -> Option<&dyn SupportsContains> {
        match self {
            Node::Array(arr) => Some(arr),
            Node::Column(col) => Some(col),
            _ => None,
        }
    }
}

impl SupportsEquality for Equality {
    fn equals_sql(&self, gen: &mut SqlGenerator, not: bool, other: &Node) -> Option<String> {
        compound_equals(gen, not, other, |gen| self.sql_string(gen))
    }
}

impl SupportsEquality for Containment {
    fn equals_sql(&self, gen: &mut SqlGenerator, not: bool, other: &Node) -> Option<String> {
        compound_equals(gen, not, other, |gen| self.sql_string(gen))
    }
}

impl SupportsEquality for BooleanOp {
    fn equals_sql(&self, gen: &mut SqlGenerator, not: bool, other: &Node) -> Option<String> {
        compound_equals(gen, not, other, |gen| self.sql_string(gen))
    }
}

// ============================================================================
// Rendering
// ============================================================================

impl Node {
    pub fn sql_string(&self, gen: &mut SqlGenerator) -> String {
        match self {
            Node::String(lit) => lit.sql_string(),
            Node::Number(lit) => lit.value.clone(),
            Node::Boolean(lit) => lit.sql_string().to_owned(),
            Node::Column(col) => col.sql_string(gen),
            Node::Array(arr) => arr.sql_string(gen),
            Node::Equality(eq) => eq.sql_string(gen),
            Node::Containment(member) => member.sql_string(gen),
            Node::BoolOp(op) => op.sql_string(gen),
        }
    }

    /// Rendering for use as an operand: compound predicates are parenthesized.
    pub fn operand_sql(&self, gen: &mut SqlGenerator) -> String {
        match self {
            Node::Equality(_) | Node::Containment(_) | Node::BoolOp(_) => {
                format!("({})", self.sql_string(gen))
            }
            _ => self.sql_string(gen),
        }
    }
}
