use proptest::prelude::*;
use regosql::serialize::render;
use regosql::sqlast::{Accessor, ColumnRef, Node, SqlType};

fn scalar() -> impl Strategy<Value = Node> {
    prop_oneof![
        "[a-z' ]{0,8}".prop_map(Node::string),
        (-1000i64..1000).prop_map(|n| Node::number(n.to_string())),
        any::<bool>().prop_map(Node::bool),
        ("[a-z_]{1,8}", prop_oneof![Just(SqlType::String), Just(SqlType::Number)]).prop_map(
            |(name, ty)| Node::column(ColumnRef::new(
                format!("input.{name}"),
                Accessor::column(&name),
                ty
            ))
        ),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn equality_support_is_symmetric(left in scalar(), right in scalar(), not in any::<bool>()) {
        let forward = render(&Node::equality(not, left.clone(), right.clone()));
        let backward = render(&Node::equality(not, right, left));
        prop_assert_eq!(forward.1.is_empty(), backward.1.is_empty());
        if forward.1.is_empty() {
            let (operator, other) = if not { (" <> ", " = ") } else { (" = ", " <> ") };
            for sql in [&forward.0, &backward.0] {
                prop_assert!(sql.contains(operator), "{}", sql);
                prop_assert!(!sql.contains(other), "{}", sql);
                prop_assert!(!sql.contains("NOT"), "{}", sql);
            }
        }
    }

    #[test]
    fn arrays_are_homogeneous(elems in prop::collection::vec(scalar(), 1..6)) {
        let first_type = elems[0].sql_type();
        let uniform = elems.iter().all(|e| {
            std::mem::discriminant(e) == std::mem::discriminant(&elems[0]) && e.sql_type() == first_type
        });
        prop_assert_eq!(Node::array("[..]", elems).is_ok(), uniform);
    }

    #[test]
    fn string_literals_never_leak_quotes(value in "[a-z' ]{0,12}") {
        let (sql, _) = render(&Node::string(value.clone()));
        let inner = &sql[1..sql.len() - 1];
        prop_assert_eq!(inner.replace("''", "'"), value);
        prop_assert!(!inner.replace("''", "").contains('\''));
    }
}
