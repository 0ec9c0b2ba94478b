use super::member::{any_or_all, SupportsContains};
use super::{Node, RenderError, SqlGenerator, SqlType};
use crate::error::ConvertError;
use std::mem::discriminant;

/// Homogeneous, non-empty array of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    source: String,
    elem_type: SqlType,
    elems: Vec<Node>,
}

impl ArrayNode {
    /// Fails when `elems` is empty or mixes node kinds.
    pub fn new(source: impl Into<String>, elems: Vec<Node>) -> Result<Self, ConvertError> {
        let source = source.into();
        let Some(first) = elems.first() else {
            return Err(ConvertError::UnsupportedTerm(format!(
                "empty array {source} has no element type"
            )));
        };
        let elem_type = first.sql_type();
        for (i, elem) in elems.iter().enumerate().skip(1) {
            if discriminant(elem) != discriminant(first) || elem.sql_type() != elem_type {
                return Err(ConvertError::TypeMismatch(format!(
                    "array {source} mixes element kinds: element 0 is {}, element {i} is {}",
                    first.describe(),
                    elem.describe()
                )));
            }
        }
        Ok(Self {
            source,
            elem_type,
            elems,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn elems(&self) -> &[Node] {
        &self.elems
    }

    pub fn elem_type(&self) -> &SqlType {
        &self.elem_type
    }

    pub fn sql_string(&self, gen: &mut SqlGenerator) -> String {
        let mut rendered = Vec::with_capacity(self.elems.len());
        for elem in &self.elems {
            let scalar = match elem {
                Node::String(_) | Node::Number(_) | Node::Boolean(_) => true,
                Node::Column(col) => !col.is_any_element() && !col.sql_type.is_collection(),
                _ => false,
            };
            if scalar {
                rendered.push(elem.sql_string(gen));
            } else {
                gen.add_error(RenderError::UnsupportedArrayElement {
                    rego: self.source.clone(),
                    element: elem.describe(),
                });
                rendered.push("ArrayError".to_owned());
            }
        }
        format!("ARRAY[{}]", rendered.join(", "))
    }
}

impl SupportsContains for ArrayNode {
    fn contains_sql(&self, gen: &mut SqlGenerator, not: bool, element: &Node) -> Option<String> {
        if element.use_as() != self.elem_type.use_as() {
            return None;
        }
        let element = element.operand_sql(gen);
        Some(any_or_all(&element, &self.sql_string(gen), not))
    }
}
