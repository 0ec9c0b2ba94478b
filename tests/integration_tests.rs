//! Integration tests for the complete regosql pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - query body text → `regosql_ast` tree
//! - tree → predicate nodes through a resolver chain
//! - predicate nodes → SQL text through a backend
//!
//! Run with: cargo test --test integration_tests

use regosql::error::ErrorKind;
use regosql::resolver::{SuffixPolicy, TreeLeaf};
use regosql::serialize::{render, to_sql, SqlParserBackend, Verbatim};
use regosql::{
    convert, json_key_matcher, string_var_matcher, ColumnMatcher, ColumnName, ConvertConfig,
    PathTree, ResolverConfig, SqlType, VariableConverter,
};
use regosql_ast::{parse_queries, Query};

fn sql(cfg: &ConvertConfig, bodies: &[&str]) -> String {
    let queries = parse_queries(bodies).expect("parse");
    let node = convert(cfg, &queries).expect("convert");
    to_sql(&node, &Verbatim).expect("render")
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_empty_queries_deny() {
    assert_eq!(sql(&ConvertConfig::new(), &[]), "false");
}

#[test]
fn test_empty_query_allows_without_converting_others() {
    // the second query could never convert: no resolver and an object literal
    let queries = vec![
        Query::default(),
        parse_queries(&[r#"input.x = {"a": 1}"#]).expect("parse").remove(0),
    ];
    let node = convert(&ConvertConfig::new(), &queries).expect("short-circuit");
    assert_eq!(render(&node).0, "true");
}

#[test]
fn test_literal_queries() {
    let cfg = ConvertConfig::new();
    assert_eq!(sql(&cfg, &["true"]), "true");
    assert_eq!(sql(&cfg, &["false"]), "false");
    assert_eq!(sql(&cfg, &["true", "false"]), "true OR false");
    assert_eq!(sql(&cfg, &[r#""x" = "y""#]), "'x' = 'y'");
}

#[test]
fn test_string_array_keeps_order() {
    let cfg = ConvertConfig::new();
    assert_eq!(
        sql(&cfg, &[r#""b" in ["a", "b", "c"]"#]),
        "'b' = ANY(ARRAY['a', 'b', 'c'])"
    );
}

#[test]
fn test_set_order_does_not_change_output() {
    let cfg = ConvertConfig::new().with_variable_converter(
        VariableConverter::new().register_matcher(string_var_matcher("input.user", "owner")),
    );
    let a = sql(&cfg, &[r#"input.user in {"a", "b", "c"}"#]);
    let b = sql(&cfg, &[r#"input.user in {"c", "a", "b"}"#]);
    assert_eq!(a, "owner = ANY(ARRAY['a', 'b', 'c'])");
    assert_eq!(a, b);
}

#[test]
fn test_failed_query_is_identified() {
    let queries = parse_queries(&["1 = 1", "[1, \"a\"] = [1, \"a\"]"]).expect("parse");
    let err = convert(&ConvertConfig::new(), &queries).expect_err("mixed array");
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.to_string(), "query 1");
}

// ============================================================================
// Authorization-list scenarios
// ============================================================================

fn acl_resolvers() -> ConvertConfig {
    let config = ResolverConfig::from_json_str(
        r#"{
            "matchers": [
                { "kind": "column", "path": "input.object.org_owner", "column": "organization_id", "type": "string" },
                { "kind": "column", "path": "input.object.owner", "column": "owner", "type": "string" },
                { "kind": "json_keys", "path": "input.object.acl_group_list", "column": "group_acl", "resolve_keys": true },
                { "kind": "json_keys", "path": "input.object.acl_user_list", "column": "user_acl" }
            ]
        }"#,
    )
    .expect("config");
    config.convert_config().expect("build")
}

#[test]
fn test_org_member_or_owner() {
    assert_eq!(
        sql(
            &acl_resolvers(),
            &[
                r#"input.object.org_owner in {"a", "b", "c"}; input.object.owner != """#,
                r#""read" in input.object.acl_user_list.alice"#,
            ]
        ),
        "((organization_id = ANY(ARRAY['a', 'b', 'c'])) AND (owner <> '')) OR (jsonb_exists(user_acl -> 'alice', 'read'))"
    );
}

#[test]
fn test_group_acl_with_org_key() {
    assert_eq!(
        sql(
            &acl_resolvers(),
            &[
                r#""read" in input.object.acl_group_list.allUsers"#,
                r#""read" in input.object.acl_group_list[input.object.org_owner]"#,
            ]
        ),
        "(jsonb_exists(group_acl -> 'allUsers', 'read')) OR (jsonb_exists(group_acl -> organization_id, 'read'))"
    );
}

#[test]
fn test_user_acl_dynamic_key_needs_resolver() {
    let queries = parse_queries(&[
        r#""read" in input.object.acl_user_list[input.object.owner]"#,
    ])
    .expect("parse");
    let err = convert(&acl_resolvers(), &queries).expect_err("user_acl has no key resolver");
    assert_eq!(err.kind(), ErrorKind::MalformedReference);
}

#[test]
fn test_unknown_acl_folds_to_false() {
    let cfg = acl_resolvers().with_unknown_vars_false(true);
    assert_eq!(
        sql(
            &cfg,
            &[
                r#""read" in input.object.acl_group_list[input.subject.org]"#,
                r#"input.object.owner = "bob""#,
            ]
        ),
        "false OR (owner = 'bob')"
    );
}

// ============================================================================
// Resolver precedence and path trees
// ============================================================================

#[test]
fn test_first_registered_matcher_wins() {
    let cfg = ConvertConfig::new().with_variable_converter(
        VariableConverter::new()
            .register_matcher(json_key_matcher("input.object.acl", "acl", None))
            .register_matcher(ColumnMatcher::new(
                "input.object.acl.admins",
                "admins",
                SqlType::array_of(SqlType::String),
            )),
    );
    assert_eq!(
        sql(&cfg, &[r#""bob" in input.object.acl.admins"#]),
        "jsonb_exists(acl -> 'admins', 'bob')"
    );
}

#[test]
fn test_path_tree_resolution() {
    let tree = PathTree::new()
        .add_element(
            "input.post.author",
            SqlType::String,
            ColumnName::template(r"^input\.post\.(\w+)$", "posts.$1").expect("regex"),
        )
        .add_element("input.post.deleted", SqlType::Boolean, ColumnName::fixed("deleted"))
        .add_element(
            "input.post.tags",
            SqlType::array_of(SqlType::String),
            ColumnName::fixed("tags"),
        )
        .add_leaf(
            "input.post.meta",
            TreeLeaf::new(SqlType::String, ColumnName::fixed("meta")).with_suffix(
                SuffixPolicy::JsonKey {
                    value_type: SqlType::String,
                    key_resolver: None,
                },
            ),
        );
    let cfg = ConvertConfig::new().with_variable_converter(tree);
    assert_eq!(
        sql(
            &cfg,
            &[
                r#"input.post.author = "alice"; input.post.deleted = false"#,
                r#"input.post.tags[_] = "public"; input.post.meta.lang = "en""#,
            ]
        ),
        "((posts.author = 'alice') AND (deleted = false)) OR (('public' = ANY(tags)) AND (meta ->> 'lang' = 'en'))"
    );

    let queries = parse_queries(&[r#"input.post.author.name = "x""#]).expect("parse");
    let err = convert(&cfg, &queries).expect_err("no ancestor fallback");
    assert_eq!(err.kind(), ErrorKind::MalformedReference);
}

#[test]
fn test_boolean_column_is_a_predicate() {
    let cfg = ConvertConfig::new().with_variable_converter(
        VariableConverter::new().register_matcher(ColumnMatcher::new(
            "input.post.published",
            "published",
            SqlType::Boolean,
        )),
    );
    assert_eq!(sql(&cfg, &["input.post.published"]), "published");
}

// ============================================================================
// Backends
// ============================================================================

#[test]
fn test_sqlparser_backend_matches_verbatim_for_comparisons() {
    let cfg = ConvertConfig::new().with_variable_converter(
        VariableConverter::new().register_matcher(string_var_matcher("input.user", "owner")),
    );
    let queries = parse_queries(&[r#"input.user = "alice"; 1 != 2"#, "5 == 5"]).expect("parse");
    let node = convert(&cfg, &queries).expect("convert");
    assert_eq!(
        to_sql(&node, &SqlParserBackend).expect("sqlparser"),
        to_sql(&node, &Verbatim).expect("verbatim")
    );
}

#[test]
fn test_sqlparser_backend_accepts_acl_membership() {
    let queries = parse_queries(&[
        r#""read" in input.object.acl_group_list.allUsers"#,
        r#""read" in input.object.acl_group_list[input.object.org_owner]; "write" in input.object.acl_user_list.alice"#,
    ])
    .expect("parse");
    let node = convert(&acl_resolvers(), &queries).expect("convert");
    let parsed = to_sql(&node, &SqlParserBackend).expect("sqlparser");
    assert_eq!(parsed, to_sql(&node, &Verbatim).expect("verbatim"));
    assert!(parsed.contains("jsonb_exists(group_acl -> 'allUsers', 'read')"));
}
