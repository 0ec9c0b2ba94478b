use regosql::error::ErrorKind;
use regosql::resolver::{ColumnMatcher, VariableMatcher};
use regosql::serialize::{render, to_sql, Verbatim};
use regosql::sqlast::SqlType;
use regosql::{convert, json_key_matcher, string_var_matcher, ConvertConfig, VariableConverter};
use regosql_ast::{parse_queries, parse_query, Call, Expr, Query, Ref, Term};
use std::sync::Arc;

fn acl_config() -> ConvertConfig {
    let columns = VariableConverter::new()
        .register_matcher(string_var_matcher("input.object.org_owner", "organization_id"))
        .register_matcher(string_var_matcher("input.object.owner", "owner"))
        .register_matcher(ColumnMatcher::new(
            "input.object.tags",
            "tags",
            SqlType::array_of(SqlType::String),
        ));
    let keys: Arc<dyn VariableMatcher> = Arc::new(columns.clone());
    ConvertConfig::new().with_variable_converter(columns.register_matcher(json_key_matcher(
        "input.object.acl_group_list",
        "group_acl",
        Some(keys),
    )))
}

fn sql_for(cfg: &ConvertConfig, bodies: &[&str]) -> String {
    let queries = parse_queries(bodies).expect("parse");
    let node = convert(cfg, &queries).expect("convert");
    to_sql(&node, &Verbatim).expect("render")
}

#[test]
fn no_queries_is_false() {
    let node = convert(&ConvertConfig::new(), &[]).expect("convert");
    assert_eq!(render(&node).0, "false");
}

#[test]
fn any_empty_query_is_true() {
    let queries = vec![parse_query("input.x = 1").expect("parse"), Query::default()];
    // the empty query wins before the unresolvable one is looked at
    let node = convert(&ConvertConfig::new(), &queries).expect("convert");
    assert_eq!(render(&node).0, "true");
}

#[test]
fn set_membership_renders_sorted_any() {
    assert_eq!(
        sql_for(&acl_config(), &[r#"input.object.org_owner in {"c", "a", "b"}"#]),
        "organization_id = ANY(ARRAY['a', 'b', 'c'])"
    );
}

#[test]
fn constant_acl_key() {
    assert_eq!(
        sql_for(&acl_config(), &[r#""read" in input.object.acl_group_list.allUsers"#]),
        "jsonb_exists(group_acl -> 'allUsers', 'read')"
    );
}

#[test]
fn dynamic_acl_key() {
    assert_eq!(
        sql_for(
            &acl_config(),
            &[r#""read" in input.object.acl_group_list[input.object.org_owner]"#]
        ),
        "jsonb_exists(group_acl -> organization_id, 'read')"
    );
}

#[test]
fn queries_join_with_or() {
    assert_eq!(
        sql_for(&ConvertConfig::new(), &["(1 != 2) = true", "5 == 5"]),
        "((1 <> 2) = true) OR (5 = 5)"
    );
}

#[test]
fn expressions_join_with_and() {
    assert_eq!(
        sql_for(
            &acl_config(),
            &[r#"input.object.org_owner in {"a", "b", "c"}; input.object.owner != """#]
        ),
        "(organization_id = ANY(ARRAY['a', 'b', 'c'])) AND (owner <> '')"
    );
}

#[test]
fn boolean_literal_expressions_stay_bare() {
    assert_eq!(
        sql_for(&ConvertConfig::new(), &["true", "false"]),
        "true OR false"
    );
}

#[test]
fn wildcard_over_array_column() {
    assert_eq!(
        sql_for(&acl_config(), &[r#"input.object.tags[_] = "public""#]),
        "'public' = ANY(tags)"
    );
}

#[test]
fn membership_in_array_column() {
    assert_eq!(
        sql_for(&acl_config(), &[r#""public" in input.object.tags"#]),
        "'public' = ANY(tags)"
    );
}

#[test]
fn unresolved_reference_fails_without_fold() {
    let queries = parse_queries(&[r#"input.object.secret = "x""#]).expect("parse");
    let err = convert(&acl_config(), &queries).expect_err("unresolved");
    assert_eq!(err.kind(), ErrorKind::UnresolvedVariable);
    assert_eq!(err.to_string(), "query 0");
}

#[test]
fn unresolved_reference_folds_to_false() {
    let cfg = acl_config().with_unknown_vars_false(true);
    assert_eq!(
        sql_for(&cfg, &[r#"input.object.secret = "x"; input.object.owner = "bob""#]),
        "false AND (owner = 'bob')"
    );
}

#[test]
fn fold_only_applies_to_unresolved_variables() {
    let cfg = acl_config().with_unknown_vars_false(true);
    let queries = parse_queries(&[r#"input.object.owner = 1"#]).expect("parse");
    let err = convert(&cfg, &queries).expect_err("type mismatch is not folded");
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn missing_converter_is_unresolved() {
    let queries = parse_queries(&[r#"input.object.owner = "bob""#]).expect("parse");
    let err = convert(&ConvertConfig::new(), &queries).expect_err("no converter");
    assert_eq!(err.kind(), ErrorKind::UnresolvedVariable);
}

#[test]
fn failure_context_names_the_offending_term() {
    let queries = parse_queries(&[
        r#"input.object.owner = "bob"; ["a", input.object.secret] = ["a", "b"]"#,
    ])
    .expect("parse");
    let err = convert(&acl_config(), &queries).expect_err("unresolved");
    let mut chain = Vec::new();
    let mut next: Option<&dyn std::error::Error> = Some(&err);
    while let Some(inner) = next {
        chain.push(inner.to_string());
        next = inner.source();
    }
    assert!(
        chain.iter().any(|c| c.starts_with("operand 0 `[") && c.ends_with("` of eq")),
        "{chain:?}"
    );
    assert!(chain.contains(&"element 1 `input.object.secret`".to_owned()), "{chain:?}");
}

#[test]
fn reference_without_a_variable_head_is_malformed() {
    let reference = Ref::new(vec![Term::string("input"), Term::string("owner")]);
    let query = Query::new(vec![Expr::Call(Call::new(
        "eq",
        vec![Term::Ref(reference), Term::string("bob")],
    ))]);
    let err = convert(&acl_config(), &[query]).expect_err("string head");
    assert_eq!(err.kind(), ErrorKind::MalformedReference);
}

#[test]
fn equality_aliases() {
    for (op, not) in [
        ("eq", false),
        ("equal", false),
        ("equals", false),
        ("neq", true),
        ("notequal", true),
        ("notequals", true),
    ] {
        let query = Query::new(vec![Expr::Call(Call::new(
            op,
            vec![Term::string("a"), Term::string("b")],
        ))]);
        let node = convert(&ConvertConfig::new(), &[query]).expect(op);
        let expected = if not { "'a' <> 'b'" } else { "'a' = 'b'" };
        assert_eq!(to_sql(&node, &Verbatim).expect("render"), expected, "{op}");
    }
}

#[test]
fn unsupported_operator() {
    let queries = parse_queries(&[r#"startswith(input.object.owner, "a")"#]).expect("parse");
    let err = convert(&acl_config(), &queries).expect_err("operator");
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperator);
}

#[test]
fn arity_is_checked() {
    let query = Query::new(vec![Expr::Call(Call::new(
        "eq",
        vec![Term::string("a")],
    ))]);
    let err = convert(&acl_config(), &[query]).expect_err("arity");
    assert_eq!(err.kind(), ErrorKind::ArityMismatch);
}

#[test]
fn unsupported_terms() {
    for body in [
        "null = null",
        "x = 1",
        r#"{"a": 1} = {"a": 1}"#,
        "[] = []",
        "1e999 = 1",
    ] {
        let queries = parse_queries(&[body]).expect("parse");
        let err = convert(&ConvertConfig::new(), &queries).expect_err(body);
        assert_eq!(err.kind(), ErrorKind::UnsupportedTerm, "{body}: {err}");
    }
}

#[test]
fn heterogeneous_array_is_a_type_mismatch() {
    let queries = parse_queries(&[r#""a" in ["a", 1]"#]).expect("parse");
    let err = convert(&ConvertConfig::new(), &queries).expect_err("mixed");
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn membership_needs_a_collection() {
    let queries = parse_queries(&[r#""a" in input.object.owner"#]).expect("parse");
    let err = convert(&acl_config(), &queries).expect_err("scalar collection");
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn non_boolean_expression_is_rejected() {
    let queries = parse_queries(&["input.object.owner"]).expect("parse");
    let err = convert(&acl_config(), &queries).expect_err("string expression");
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn numbers_render_from_source_text() {
    assert_eq!(
        sql_for(&ConvertConfig::new(), &["1.50 = 1.5"]),
        "1.50 = 1.5"
    );
}
