use super::{Node, SqlGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    And,
    Or,
}

impl BinaryOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }

    /// Value of the operator over zero terms.
    pub fn identity(self) -> bool {
        matches!(self, BinaryOperator::And)
    }
}

/// N-ary AND/OR over boolean nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanOp {
    pub source: String,
    pub op: BinaryOperator,
    pub terms: Vec<Node>,
}

impl BooleanOp {
    pub fn sql_string(&self, gen: &mut SqlGenerator) -> String {
        if self.terms.is_empty() {
            return Node::bool(self.op.identity()).sql_string(gen);
        }
        let separator = format!(" {} ", self.op.keyword());
        self.terms
            .iter()
            .map(|term| match term {
                Node::Boolean(lit) => lit.sql_string().to_owned(),
                other => format!("({})", other.sql_string(gen)),
            })
            .collect::<Vec<_>>()
            .join(&separator)
    }
}
