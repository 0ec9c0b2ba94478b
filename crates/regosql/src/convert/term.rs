use super::call::convert_call;
use super::ConvertConfig;
use crate::error::{ConvertError, ResultExt};
use crate::sqlast::Node;
use regosql_ast::{Ref, Term};

pub fn convert_term(cfg: &ConvertConfig, term: &Term) -> Result<Node, ConvertError> {
    match term {
        Term::Ref(reference) => convert_ref(cfg, reference),
        Term::String(value) => Ok(Node::string(value.as_str())),
        Term::Boolean(value) => Ok(Node::bool(*value)),
        Term::Number(number) => {
            if number.as_i64().is_none() && number.as_f64().is_none() {
                return Err(ConvertError::UnsupportedTerm(format!(
                    "number {number} is neither an integer nor a finite float"
                )));
            }
            Ok(Node::number(number.as_str()))
        }
        Term::Array(elems) => convert_array(cfg, term, elems),
        Term::Set(_) => {
            let sorted = term.sorted_set_elements().unwrap_or_default();
            convert_array(cfg, term, &sorted)
        }
        Term::Call(call) => convert_call(cfg, call),
        Term::Null => Err(ConvertError::UnsupportedTerm("null not yet supported".into())),
        Term::Var(name) => Err(ConvertError::UnsupportedTerm(format!(
            "var {name} not yet supported"
        ))),
        Term::Object(_) => Err(ConvertError::UnsupportedTerm(format!(
            "object {term} not yet supported"
        ))),
    }
}

/// Convert each term in order; the first failure wins.
pub fn convert_terms(cfg: &ConvertConfig, terms: &[Term]) -> Result<Vec<Node>, ConvertError> {
    terms
        .iter()
        .enumerate()
        .map(|(i, term)| {
            convert_term(cfg, term).with_context(|| format!("element {i} `{term}`"))
        })
        .collect()
}

fn convert_array(cfg: &ConvertConfig, term: &Term, elems: &[Term]) -> Result<Node, ConvertError> {
    let source = term.to_string();
    let nodes = convert_terms(cfg, elems).with_context(|| format!("array {source}"))?;
    Node::array(source, nodes)
}

fn convert_ref(cfg: &ConvertConfig, reference: &Ref) -> Result<Node, ConvertError> {
    if reference.head().is_none() {
        return Err(ConvertError::malformed(
            reference,
            "reference must start with a variable name",
        ));
    }
    let Some(resolver) = &cfg.variable_converter else {
        tracing::debug!(reference = %reference, "no variable converter configured");
        return Err(ConvertError::UnresolvedVariable(reference.to_string()));
    };
    resolver
        .convert_variable(reference)?
        .ok_or_else(|| ConvertError::UnresolvedVariable(reference.to_string()))
}
