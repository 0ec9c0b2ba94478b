//! Query body parser.
//!
//! Accepted surface (a subset of the policy language, enough for partial
//! evaluation output):
//!
//! ```text
//! body  := expr ( (newline | ';') expr )*
//! expr  := term ( op term )?          op := '=' | '==' | '!=' | 'in'
//! term  := null | true | false | number | string
//!        | '[' terms ']' | '{' terms '}' | '{' key ':' value, ... '}' | 'set()'
//!        | '(' term ( op term )? ')'
//!        | name ( '.' key | '[' term ']' )*  ( '(' terms ')' )?
//! ```
//!
//! `#` starts a comment that runs to the end of the line.

use crate::term::{Call, Expr, Number, Query, Ref, Term, OP_EQ, OP_EQUAL, OP_MEMBER, OP_NEQ};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char as pchar, digit1, one_of, satisfy},
    combinator::{map, not, opt, peek, recognize, value},
    error::{Error as NomError, ErrorKind},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

type Res<'a, T> = IResult<&'a str, T>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parse error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("query {index}")]
    InQuery {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    fn syntax(full: &str, rest: &str, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            offset: full.len().saturating_sub(rest.len()),
            message: message.into(),
        }
    }

    fn from_nom(full: &str, err: nom::Err<NomError<&str>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => ParseError::Syntax {
                offset: full.len(),
                message: "incomplete input".to_string(),
            },
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let near: String = e.input.chars().take(16).collect();
                let message = if near.is_empty() {
                    "unexpected end of input".to_string()
                } else {
                    format!("unexpected input near `{near}`")
                };
                ParseError::syntax(full, e.input, message)
            }
        }
    }
}

/// Parse one query body. Blank input is a query with zero expressions.
pub fn parse_query(text: &str) -> Result<Query, ParseError> {
    let mut exprs = Vec::new();
    let mut rest = skip_separators(text);
    while !rest.is_empty() {
        let (after, parsed) = expr(rest).map_err(|e| ParseError::from_nom(text, e))?;
        exprs.push(parsed);

        let after = skip_comment(hspace(after));
        if !after.is_empty() && !after.starts_with(['\n', ';']) {
            return Err(ParseError::syntax(
                text,
                after,
                "expected newline or `;` between expressions",
            ));
        }
        rest = skip_separators(after);
    }
    Ok(Query::new(exprs))
}

/// Parse several bodies; the partial evaluator's OR'd query set.
pub fn parse_queries<S: AsRef<str>>(bodies: &[S]) -> Result<Vec<Query>, ParseError> {
    bodies
        .iter()
        .enumerate()
        .map(|(index, body)| {
            parse_query(body.as_ref()).map_err(|source| ParseError::InQuery {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

/// Parse a single standalone term.
pub fn parse_term(text: &str) -> Result<Term, ParseError> {
    let start = mspace(text);
    let (rest, parsed) = term(start).map_err(|e| ParseError::from_nom(text, e))?;
    let rest = mspace(rest);
    if !rest.is_empty() {
        return Err(ParseError::syntax(text, rest, "trailing input after term"));
    }
    Ok(parsed)
}

// ============================================================================
// Whitespace / separators
// ============================================================================

fn hspace(input: &str) -> &str {
    input.trim_start_matches([' ', '\t', '\r'])
}

fn skip_comment(input: &str) -> &str {
    match input.strip_prefix('#') {
        Some(rest) => rest.find('\n').map_or("", |idx| &rest[idx..]),
        None => input,
    }
}

/// Whitespace including newlines and comments (inside brackets).
fn mspace(mut input: &str) -> &str {
    loop {
        let next = skip_comment(input.trim_start());
        if next.len() == input.len() {
            return input;
        }
        input = next;
    }
}

fn skip_separators(mut input: &str) -> &str {
    loop {
        let next = mspace(input).trim_start_matches(';');
        if next.len() == input.len() {
            return input;
        }
        input = next;
    }
}

fn ms(input: &str) -> Res<'_, ()> {
    Ok((mspace(input), ()))
}

fn hs(input: &str) -> Res<'_, ()> {
    Ok((hspace(input), ()))
}

// ============================================================================
// Expressions
// ============================================================================

fn operator(input: &str) -> Res<'_, &'static str> {
    alt((
        value(OP_EQUAL, tag("==")),
        value(OP_NEQ, tag("!=")),
        value(OP_EQ, terminated(tag("="), not(pchar('=')))),
        value(OP_MEMBER, keyword("in")),
    ))(input)
}

fn expr(input: &str) -> Res<'_, Expr> {
    let (rest, lhs) = term(input)?;
    let (rest, tail) = opt(preceded(hs, pair(operator, preceded(hs, term))))(rest)?;
    let parsed = match (tail, lhs) {
        (Some((op, rhs)), lhs) => Expr::Call(Call::new(op, vec![lhs, rhs])),
        (None, Term::Call(call)) => Expr::Call(call),
        (None, lhs) => Expr::Term(lhs),
    };
    Ok((rest, parsed))
}

// ============================================================================
// Terms
// ============================================================================

fn term(input: &str) -> Res<'_, Term> {
    alt((
        parenthesized,
        value(Term::Null, keyword("null")),
        value(Term::Boolean(true), keyword("true")),
        value(Term::Boolean(false), keyword("false")),
        map(number, |n| Term::Number(Number::new(n))),
        map(string_literal, Term::String),
        map(raw_string_literal, Term::String),
        array,
        empty_set,
        brace_collection,
        reference,
    ))(input)
}

fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    terminated(tag(kw), not(peek(satisfy(is_ident_char))))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident(input: &str) -> Res<'_, &str> {
    recognize(pair(satisfy(is_ident_start), take_while(is_ident_char)))(input)
}

fn number(input: &str) -> Res<'_, &str> {
    terminated(
        recognize(tuple((
            opt(pchar('-')),
            digit1,
            opt(pair(pchar('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        not(peek(satisfy(is_ident_start))),
    )(input)
}

fn string_literal(input: &str) -> Res<'_, String> {
    let Some(body) = input.strip_prefix('"') else {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)));
    };

    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Ok((&body[idx + 1..], out)),
            '\\' => {
                let Some((esc_idx, esc)) = chars.next() else {
                    break;
                };
                match esc {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    '/' => out.push('/'),
                    'b' => out.push('\u{0008}'),
                    'f' => out.push('\u{000c}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => {
                        let hex = body.get(esc_idx + 1..esc_idx + 5).unwrap_or("");
                        let decoded = u32::from_str_radix(hex, 16)
                            .ok()
                            .filter(|_| hex.len() == 4)
                            .and_then(char::from_u32);
                        let Some(decoded) = decoded else {
                            return Err(nom::Err::Failure(NomError::new(
                                &body[idx..],
                                ErrorKind::Escaped,
                            )));
                        };
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => {
                        return Err(nom::Err::Failure(NomError::new(
                            &body[idx..],
                            ErrorKind::Escaped,
                        )))
                    }
                }
            }
            '\n' => break,
            c => out.push(c),
        }
    }
    Err(nom::Err::Failure(NomError::new(input, ErrorKind::Char)))
}

fn raw_string_literal(input: &str) -> Res<'_, String> {
    let Some(body) = input.strip_prefix('`') else {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)));
    };
    match body.find('`') {
        Some(end) => Ok((&body[end + 1..], body[..end].to_string())),
        None => Err(nom::Err::Failure(NomError::new(input, ErrorKind::Char))),
    }
}

/// Comma separated terms up to (and including) `close`; trailing comma allowed.
fn terms_until(input: &str, close: char) -> Res<'_, Vec<Term>> {
    let mut items = Vec::new();
    let mut rest = mspace(input);
    loop {
        if let Some(after) = rest.strip_prefix(close) {
            return Ok((after, items));
        }
        let (after, item) = term(rest)?;
        items.push(item);
        let after = mspace(after);
        if let Some(after) = after.strip_prefix(',') {
            rest = mspace(after);
        } else if let Some(after) = after.strip_prefix(close) {
            return Ok((after, items));
        } else {
            return Err(nom::Err::Failure(NomError::new(after, ErrorKind::Char)));
        }
    }
}

fn array(input: &str) -> Res<'_, Term> {
    let (rest, _) = pchar('[')(input)?;
    let (rest, items) = terms_until(rest, ']')?;
    Ok((rest, Term::Array(items)))
}

fn empty_set(input: &str) -> Res<'_, Term> {
    value(Term::Set(Vec::new()), tag("set()"))(input)
}

/// `{}` (empty object), `{a, b}` (set) or `{k: v}` (object).
fn brace_collection(input: &str) -> Res<'_, Term> {
    let (rest, _) = pchar('{')(input)?;
    let (rest, _) = ms(rest)?;
    if let Some(after) = rest.strip_prefix('}') {
        return Ok((after, Term::Object(Vec::new())));
    }

    let (after_first, first) = term(rest)?;
    let (after_ws, _) = ms(after_first)?;
    if !after_ws.starts_with(':') {
        let (rest, mut tail) = match after_ws.strip_prefix(',') {
            Some(after) => terms_until(after, '}')?,
            None => match after_ws.strip_prefix('}') {
                Some(after) => (after, Vec::new()),
                None => {
                    return Err(nom::Err::Failure(NomError::new(after_ws, ErrorKind::Char)))
                }
            },
        };
        let mut items = vec![first];
        items.append(&mut tail);
        return Ok((rest, Term::Set(items)));
    }

    let mut pairs = Vec::new();
    let mut key = first;
    let mut rest = after_ws;
    loop {
        let (after, _) = pchar(':')(rest)?;
        let (after, _) = ms(after)?;
        let (after, val) = term(after)?;
        pairs.push((key, val));
        let (after, _) = ms(after)?;
        if let Some(after) = after.strip_prefix('}') {
            return Ok((after, Term::Object(pairs)));
        }
        let (after, _) = pchar(',')(after)?;
        let (after, _) = ms(after)?;
        if let Some(after) = after.strip_prefix('}') {
            return Ok((after, Term::Object(pairs)));
        }
        let (after, next_key) = term(after)?;
        let (after, _) = ms(after)?;
        key = next_key;
        rest = after;
    }
}

fn parenthesized(input: &str) -> Res<'_, Term> {
    let (rest, _) = pchar('(')(input)?;
    let (rest, _) = ms(rest)?;
    let (rest, lhs) = term(rest)?;
    let (rest, _) = ms(rest)?;
    let (rest, tail) = opt(pair(operator, preceded(ms, term)))(rest)?;
    let (rest, _) = ms(rest)?;
    let (rest, _) = pchar(')')(rest)?;
    let parsed = match tail {
        Some((op, rhs)) => Term::Call(Call::new(op, vec![lhs, rhs])),
        None => lhs,
    };
    Ok((rest, parsed))
}

/// Variables, references and function calls.
fn reference(input: &str) -> Res<'_, Term> {
    let (mut rest, head) = ident(input)?;
    let mut segments = vec![Term::var(head)];
    let mut dotted = head.to_string();
    let mut only_dots = true;

    loop {
        if let Some(after) = rest.strip_prefix('.') {
            let (after, key) = ident(after)?;
            segments.push(Term::string(key));
            dotted.push('.');
            dotted.push_str(key);
            rest = after;
        } else if let Some(after) = rest.strip_prefix('[') {
            let (after, _) = ms(after)?;
            let (after, segment) = term(after)?;
            let (after, _) = ms(after)?;
            let (after, _) = pchar(']')(after)?;
            segments.push(segment);
            only_dots = false;
            rest = after;
        } else {
            break;
        }
    }

    if only_dots {
        if let Some(after) = rest.strip_prefix('(') {
            let (after, operands) = terms_until(after, ')')?;
            return Ok((after, Term::Call(Call::new(dotted, operands))));
        }
    }

    if segments.len() == 1 {
        return Ok((rest, Term::var(head)));
    }
    Ok((rest, Term::Ref(Ref::new(segments))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_empty_query() {
        assert!(parse_query("").expect("parse").is_empty());
        assert!(parse_query("  \n ; # only a comment\n").expect("parse").is_empty());
    }

    #[test]
    fn keywords_need_a_boundary() {
        assert_eq!(parse_term("true").expect("parse"), Term::Boolean(true));
        assert_eq!(parse_term("trueish").expect("parse"), Term::var("trueish"));
        let q = parse_query("input.a\ninput.b").expect("parse");
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn string_escapes_are_decoded() {
        assert_eq!(
            parse_term(r#""a\"bA\n""#).expect("parse"),
            Term::string("a\"bA\n")
        );
        assert!(parse_term(r#""unterminated"#).is_err());
    }

    #[test]
    fn error_reports_offset() {
        let err = parse_query("input.x = ").expect_err("should error");
        match err {
            ParseError::Syntax { offset, .. } => assert!(offset >= 8, "offset={offset}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn two_expressions_on_one_line_need_a_separator() {
        let err = parse_query("true false").expect_err("should error");
        assert!(err.to_string().contains("expected newline"), "err={err}");
    }
}
