use super::equality::{equals_op, SupportsEquality};
use super::member::{any_or_all, SupportsContains};
use super::{Mark, Marks, Node, SqlGenerator, SqlType, UseAs};
use std::borrow::Cow;

/// How a column value is addressed in SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    /// A possibly qualified column name, one identifier per segment.
    Column(Vec<String>),
    /// Text produced by a name template; emitted untouched.
    Raw(String),
    /// `base -> key` (JSON) or `base ->> key` (text).
    JsonField {
        base: Box<Accessor>,
        key: Box<Node>,
        as_text: bool,
    },
}

impl Accessor {
    pub fn column(name: &str) -> Self {
        Accessor::Column(name.split('.').map(str::to_owned).collect())
    }

    pub fn sql_string(&self, gen: &mut SqlGenerator) -> String {
        match self {
            Accessor::Column(parts) => parts
                .iter()
                .map(|p| quote_ident(p))
                .collect::<Vec<_>>()
                .join("."),
            Accessor::Raw(raw) => raw.clone(),
            Accessor::JsonField {
                base,
                key,
                as_text,
            } => {
                let op = if *as_text { "->>" } else { "->" };
                format!("{} {op} {}", base.sql_string(gen), key.sql_string(gen))
            }
        }
    }
}

/// Quote an identifier unless it is a plain lower-case name.
pub fn quote_ident(ident: &str) -> Cow<'_, str> {
    let plain = ident
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        Cow::Borrowed(ident)
    } else {
        Cow::Owned(format!("\"{}\"", ident.replace('"', "\"\"")))
    }
}

/// A resolved reference to stored data.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Policy text of the reference this column was resolved from.
    pub source: String,
    pub accessor: Accessor,
    pub sql_type: SqlType,
    pub marks: Marks,
}

impl ColumnRef {
    pub fn new(source: impl Into<String>, accessor: Accessor, sql_type: SqlType) -> Self {
        Self {
            source: source.into(),
            accessor,
            sql_type,
            marks: Marks::NONE,
        }
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks = self.marks.with(mark);
        self
    }

    pub fn is_any_element(&self) -> bool {
        self.marks.has(Mark::AnyElement)
    }

    pub fn use_as(&self) -> UseAs {
        if self.marks.has(Mark::JsonKeys) {
            UseAs::KeySet
        } else {
            self.sql_type.use_as()
        }
    }

    pub fn sql_string(&self, gen: &mut SqlGenerator) -> String {
        let accessor = self.accessor.sql_string(gen);
        if self.is_any_element() {
            format!("ANY({accessor})")
        } else {
            accessor
        }
    }
}

impl SupportsEquality for ColumnRef {
    fn equals_sql(&self, gen: &mut SqlGenerator, not: bool, other: &Node) -> Option<String> {
        let mine = self.use_as();
        if mine == UseAs::KeySet || other.use_as() != mine {
            return None;
        }
        if self.is_any_element() {
            // ANY(...) is only valid on the right of the comparison
            if other.is_any_element() {
                return None;
            }
            return Some(format!(
                "{} {} {}",
                other.operand_sql(gen),
                equals_op(not),
                self.sql_string(gen)
            ));
        }
        Some(format!(
            "{} {} {}",
            self.sql_string(gen),
            equals_op(not),
            other.operand_sql(gen)
        ))
    }
}

impl SupportsContains for ColumnRef {
    fn contains_sql(&self, gen: &mut SqlGenerator, not: bool, element: &Node) -> Option<String> {
        if self.is_any_element() {
            return None;
        }
        if self.marks.has(Mark::JsonKeys) {
            if element.use_as() != UseAs::String {
                return None;
            }
            let test = format!(
                "jsonb_exists({}, {})",
                self.sql_string(gen),
                element.operand_sql(gen)
            );
            return Some(if not { format!("NOT {test}") } else { test });
        }
        let elem = self.sql_type.element()?;
        if element.use_as() != elem.use_as() {
            return None;
        }
        let element = element.operand_sql(gen);
        Some(any_or_all(&element, &self.sql_string(gen), not))
    }
}
