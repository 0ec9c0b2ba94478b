use super::equality::{equals_op, SupportsEquality};
use super::{Node, SqlGenerator, UseAs};

/// Quote a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLit {
    pub source: String,
    pub value: String,
}

impl StringLit {
    pub fn sql_string(&self) -> String {
        quote_literal(&self.value)
    }
}

impl SupportsEquality for StringLit {
    fn equals_sql(&self, gen: &mut SqlGenerator, not: bool, other: &Node) -> Option<String> {
        if other.use_as() != UseAs::String {
            return None;
        }
        Some(format!(
            "{} {} {}",
            self.sql_string(),
            equals_op(not),
            other.operand_sql(gen)
        ))
    }
}

/// Numeric literal rendered from its source text (no float round trip).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLit {
    pub value: String,
}

impl SupportsEquality for NumberLit {
    fn equals_sql(&self, gen: &mut SqlGenerator, not: bool, other: &Node) -> Option<String> {
        if other.use_as() != UseAs::Number {
            return None;
        }
        Some(format!(
            "{} {} {}",
            self.value,
            equals_op(not),
            other.operand_sql(gen)
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolLit {
    pub value: bool,
}

impl BoolLit {
    pub fn sql_string(&self) -> &'static str {
        if self.value {
            "true"
        } else {
            "false"
        }
    }
}

impl SupportsEquality for BoolLit {
    fn equals_sql(&self, gen: &mut SqlGenerator, not: bool, other: &Node) -> Option<String> {
        if other.use_as() != UseAs::Boolean {
            return None;
        }
        Some(format!(
            "{} {} {}",
            self.sql_string(),
            equals_op(not),
            other.operand_sql(gen)
        ))
    }
}
