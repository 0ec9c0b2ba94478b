use super::{Node, RenderError, SqlGenerator, UseAs};

pub(crate) fn equals_op(not: bool) -> &'static str {
    if not {
        "<>"
    } else {
        "="
    }
}

/// A node that knows how to render itself compared against another node.
///
/// Returns `None` when this node cannot be compared with `other`; the
/// [`Equality`] node then tries the reverse direction before giving up.
pub trait SupportsEquality {
    fn equals_sql(&self, gen: &mut SqlGenerator, not: bool, other: &Node) -> Option<String>;
}

/// `left = right`, or `left <> right` when negated.
#[derive(Debug, Clone, PartialEq)]
pub struct Equality {
    pub left: Box<Node>,
    pub right: Box<Node>,
    pub not: bool,
}

impl Equality {
    pub fn sql_string(&self, gen: &mut SqlGenerator) -> String {
        if let Some(sql) = self
            .left
            .as_equality()
            .and_then(|left| left.equals_sql(gen, self.not, &self.right))
        {
            return sql;
        }
        if let Some(sql) = self
            .right
            .as_equality()
            .and_then(|right| right.equals_sql(gen, self.not, &self.left))
        {
            return sql;
        }
        gen.add_error(RenderError::UnsupportedEquality {
            left: self.left.describe(),
            op: equals_op(self.not),
            right: self.right.describe(),
        });
        "EqualityError".to_owned()
    }
}

/// Equality for nodes that render a boolean expression of their own.
pub(crate) fn compound_equals(
    gen: &mut SqlGenerator,
    not: bool,
    other: &Node,
    render: impl FnOnce(&mut SqlGenerator) -> String,
) -> Option<String> {
    if other.use_as() != UseAs::Boolean {
        return None;
    }
    let own = render(gen);
    Some(format!(
        "({own}) {} {}",
        equals_op(not),
        other.operand_sql(gen)
    ))
}
