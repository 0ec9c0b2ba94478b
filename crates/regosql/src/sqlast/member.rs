use super::{Node, RenderError, SqlGenerator};

/// A collection that can render a membership test for an element.
pub trait SupportsContains {
    fn contains_sql(&self, gen: &mut SqlGenerator, not: bool, element: &Node) -> Option<String>;
}

pub(crate) fn any_or_all(element: &str, collection: &str, not: bool) -> String {
    if not {
        format!("{element} <> ALL({collection})")
    } else {
        format!("{element} = ANY({collection})")
    }
}

/// `element` is (or is not) a member of `collection`.
#[derive(Debug, Clone, PartialEq)]
pub struct Containment {
    pub collection: Box<Node>,
    pub element: Box<Node>,
    pub not: bool,
}

impl Containment {
    pub fn sql_string(&self, gen: &mut SqlGenerator) -> String {
        if !self.element.is_any_element() {
            if let Some(sql) = self
                .collection
                .as_contains()
                .and_then(|coll| coll.contains_sql(gen, self.not, &self.element))
            {
                return sql;
            }
        }
        gen.add_error(RenderError::UnsupportedContains {
            collection: self.collection.describe(),
            element: self.element.describe(),
        });
        "ContainsError".to_owned()
    }
}
