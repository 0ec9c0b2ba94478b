//! Terms, expressions and queries.
//!
//! The shapes follow the partial evaluator's output:
//!
//! - references start with a name (`input`) followed by literal keys
//!   (`.object`, `["owner"]`) or nested terms (`[input.org]`, `[_]`),
//! - sets keep their source order here; consumers that need a stable order
//!   call [`Term::sorted_set_elements`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Operator name produced for `a = b`.
pub const OP_EQ: &str = "eq";
/// Operator name produced for `a == b`.
pub const OP_EQUAL: &str = "equal";
/// Operator name produced for `a != b`.
pub const OP_NEQ: &str = "neq";
/// Operator name produced for `a in b`.
pub const OP_MEMBER: &str = "internal.member_2";

// ============================================================================
// Numbers
// ============================================================================

/// A numeric literal, kept as its source text so no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Number(String);

impl Number {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse::<i64>().ok()
    }

    /// Lossy floating view; `None` for text that is not a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|f| f.is_finite())
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.0.cmp(&other.0)),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Terms
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Term {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    /// A bare variable. `_` is the anonymous wildcard.
    Var(String),
    Ref(Ref),
    Array(Vec<Term>),
    Set(Vec<Term>),
    Object(Vec<(Term, Term)>),
    /// A call in term position, e.g. the `(1 != 2)` in `(1 != 2) = true`.
    Call(Call),
}

impl Term {
    pub fn string(value: impl Into<String>) -> Self {
        Term::String(value.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn number(text: impl Into<String>) -> Self {
        Term::Number(Number::new(text))
    }

    /// Short human label for the term kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Term::Null => "null",
            Term::Boolean(_) => "boolean",
            Term::Number(_) => "number",
            Term::String(_) => "string",
            Term::Var(_) => "var",
            Term::Ref(_) => "ref",
            Term::Array(_) => "array",
            Term::Set(_) => "set",
            Term::Object(_) => "object",
            Term::Call(_) => "call",
        }
    }

    /// Set elements in canonical order; `None` if the term is not a set.
    pub fn sorted_set_elements(&self) -> Option<Vec<Term>> {
        match self {
            Term::Set(elems) => {
                let mut sorted = elems.clone();
                sorted.sort();
                sorted.dedup();
                Some(sorted)
            }
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Term::Null => 0,
            Term::Boolean(_) => 1,
            Term::Number(_) => 2,
            Term::String(_) => 3,
            Term::Var(_) => 4,
            Term::Ref(_) => 5,
            Term::Array(_) => 6,
            Term::Object(_) => 7,
            Term::Set(_) => 8,
            Term::Call(_) => 9,
        }
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Term::Null, Term::Null) => Ordering::Equal,
            (Term::Boolean(a), Term::Boolean(b)) => a.cmp(b),
            (Term::Number(a), Term::Number(b)) => a.cmp(b),
            (Term::String(a), Term::String(b)) => a.cmp(b),
            (Term::Var(a), Term::Var(b)) => a.cmp(b),
            (Term::Ref(a), Term::Ref(b)) => a.cmp(b),
            (Term::Array(a), Term::Array(b)) => a.cmp(b),
            (Term::Set(a), Term::Set(b)) => a.cmp(b),
            (Term::Object(a), Term::Object(b)) => a.cmp(b),
            (Term::Call(a), Term::Call(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Ref> for Term {
    fn from(value: Ref) -> Self {
        Term::Ref(value)
    }
}

impl From<Call> for Term {
    fn from(value: Call) -> Self {
        Term::Call(value)
    }
}

// ============================================================================
// References
// ============================================================================

/// A path into the document, e.g. `input.object.acl[input.org]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ref(pub Vec<Term>);

impl Ref {
    pub fn new(segments: Vec<Term>) -> Self {
        Self(segments)
    }

    /// Build `name.key1.key2...` from a dotted path.
    pub fn from_dotted(path: &str) -> Self {
        let mut parts = path.split('.');
        let mut segments = Vec::new();
        if let Some(head) = parts.next() {
            segments.push(Term::var(head));
        }
        segments.extend(parts.map(Term::string));
        Self(segments)
    }

    /// Append a segment (builder style).
    pub fn push(mut self, segment: Term) -> Self {
        self.0.push(segment);
        self
    }

    pub fn segments(&self) -> &[Term] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The leading name, if segment 0 is a variable.
    pub fn head(&self) -> Option<&str> {
        match self.0.first() {
            Some(Term::Var(name)) => Some(name),
            _ => None,
        }
    }
}

// ============================================================================
// Calls, expressions, queries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Call {
    /// Dotted operator name (`eq`, `neq`, `internal.member_2`, ...).
    pub operator: String,
    pub operands: Vec<Term>,
}

impl Call {
    pub fn new(operator: impl Into<String>, operands: Vec<Term>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }

    fn infix_symbol(&self) -> Option<&'static str> {
        if self.operands.len() != 2 {
            return None;
        }
        match self.operator.as_str() {
            OP_EQ => Some("="),
            OP_EQUAL => Some("=="),
            OP_NEQ => Some("!="),
            OP_MEMBER => Some("in"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Expr {
    Call(Call),
    Term(Term),
}

/// One conjunctive query (a rule body).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(pub Vec<Expr>);

impl Query {
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self(exprs)
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Display (policy-language text)
// ============================================================================

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Null => f.write_str("null"),
            Term::Boolean(b) => write!(f, "{b}"),
            Term::Number(n) => write!(f, "{n}"),
            Term::String(s) => write_quoted(f, s),
            Term::Var(name) => f.write_str(name),
            Term::Ref(r) => write!(f, "{r}"),
            Term::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Term::Set(items) if items.is_empty() => f.write_str("set()"),
            Term::Set(items) => {
                f.write_str("{")?;
                write_list(f, items)?;
                f.write_str("}")
            }
            Term::Object(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Term::Call(call) if call.infix_symbol().is_some() => write!(f, "({call})"),
            Term::Call(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match (i, segment) {
                (0, Term::Var(name)) => f.write_str(name)?,
                (0, other) => write!(f, "{other}")?,
                (_, Term::String(key)) if is_plain_key(key) => write!(f, ".{key}")?,
                (_, other) => write!(f, "[{other}]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(symbol) = self.infix_symbol() {
            return write!(f, "{} {symbol} {}", self.operands[0], self.operands[1]);
        }
        write!(f, "{}(", self.operator)?;
        write_list(f, &self.operands)?;
        f.write_str(")")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Call(call) => write!(f, "{call}"),
            Expr::Term(term) => write!(f, "{term}"),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_display_uses_dots_for_plain_keys() {
        let r = Ref::from_dotted("input.object.owner")
            .push(Term::string("with space"))
            .push(Term::var("_"));
        assert_eq!(r.to_string(), r#"input.object.owner["with space"][_]"#);
    }

    #[test]
    fn infix_calls_print_as_operators() {
        let call = Call::new(
            OP_MEMBER,
            vec![Term::string("read"), Ref::from_dotted("input.acl").into()],
        );
        assert_eq!(call.to_string(), r#""read" in input.acl"#);
        assert_eq!(Term::Call(call).to_string(), r#"("read" in input.acl)"#);
    }

    #[test]
    fn set_elements_sort_canonically() {
        let set = Term::Set(vec![
            Term::string("b"),
            Term::number("10"),
            Term::string("a"),
            Term::number("9"),
            Term::Boolean(true),
        ]);
        let sorted = set.sorted_set_elements().expect("set");
        assert_eq!(
            sorted,
            vec![
                Term::Boolean(true),
                Term::number("9"),
                Term::number("10"),
                Term::string("a"),
                Term::string("b"),
            ]
        );
    }

    #[test]
    fn number_keeps_source_text() {
        let n = Number::new("12345678901234567890.000001");
        assert_eq!(n.as_str(), "12345678901234567890.000001");
        assert_eq!(n.as_i64(), None);
        assert!(n.as_f64().is_some());
        assert_eq!(Number::new("nope").as_f64(), None);
    }

    #[test]
    fn head_requires_leading_var() {
        assert_eq!(Ref::from_dotted("input.x").head(), Some("input"));
        assert_eq!(Ref::new(vec![Term::string("input")]).head(), None);
    }
}
