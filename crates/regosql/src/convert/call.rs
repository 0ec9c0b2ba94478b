use super::term::convert_term;
use super::ConvertConfig;
use crate::error::{ConvertError, ResultExt};
use crate::sqlast::Node;
use regosql_ast::Call;

/// Convert an operator call; only equality and membership are supported.
pub fn convert_call(cfg: &ConvertConfig, call: &Call) -> Result<Node, ConvertError> {
    match call.operator.as_str() {
        op @ ("eq" | "equal" | "equals" | "neq" | "notequal" | "notequals") => {
            let not = matches!(op, "neq" | "notequal" | "notequals");
            let [left, right] = convert_operands::<2>(cfg, call)?;
            let (lt, rt) = (left.sql_type(), right.sql_type());
            if lt != rt {
                return Err(ConvertError::TypeMismatch(format!(
                    "equality operands differ in type in `{call}`: {lt} and {rt}"
                )));
            }
            Ok(Node::equality(not, left, right))
        }
        "internal.member_2" => {
            let [element, collection] = convert_operands::<2>(cfg, call)?;
            if !collection.sql_type().is_collection() {
                return Err(ConvertError::TypeMismatch(format!(
                    "membership in `{call}` needs a collection, got {}",
                    collection.describe()
                )));
            }
            Ok(Node::member_of(false, collection, element))
        }
        other => Err(ConvertError::UnsupportedOperator(other.to_owned())),
    }
}

fn convert_operands<const N: usize>(
    cfg: &ConvertConfig,
    call: &Call,
) -> Result<[Node; N], ConvertError> {
    let arity = |found| ConvertError::ArityMismatch {
        operator: call.operator.clone(),
        expected: N,
        found,
    };
    if call.operands.len() != N {
        return Err(arity(call.operands.len()));
    }
    let nodes = call
        .operands
        .iter()
        .enumerate()
        .map(|(i, operand)| {
            convert_term(cfg, operand)
                .with_context(|| format!("operand {i} `{operand}` of {}", call.operator))
        })
        .collect::<Result<Vec<_>, _>>()?;
    <[Node; N]>::try_from(nodes).map_err(|nodes: Vec<Node>| arity(nodes.len()))
}
