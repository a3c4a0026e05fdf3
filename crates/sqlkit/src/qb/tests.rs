//! Integration tests for the qb module.

use crate::dialect::Dialect;
use crate::qb::{
    Condition, Expr, SelectQb, SqlQb, batch_insert, batch_update, select, select_from, upsert,
};
use crate::value::Value;
use crate::{args, values};

const PG: Dialect = Dialect::Postgres;

#[test]
fn test_where_on_numbered_dialect() {
    let stmt = select(&[])
        .from("users")
        .where_sql("status = ?", args![1])
        .build(PG)
        .unwrap();
    assert_eq!(stmt.sql(), r#"SELECT * FROM "users" WHERE status = $1"#);
    assert_eq!(stmt.args(), &[Value::Int(1)]);
}

#[test]
fn test_having_numbered_after_where() {
    let stmt = select(&["user_id", "COUNT(*)"])
        .from("orders")
        .eq("status", "paid")
        .group_by(&["user_id"])
        .having("COUNT(*) > ?", args![5])
        .build(PG)
        .unwrap();
    assert_eq!(
        stmt.sql(),
        r#"SELECT "user_id", COUNT(*) FROM "orders" WHERE "status" = $1 GROUP BY "user_id" HAVING COUNT(*) > $2"#
    );
    assert_eq!(stmt.args(), &args!["paid", 5][..]);
}

#[test]
fn test_batch_insert_three_rows() {
    let rows = || vec![args![1, "a"], args![2, "b"], args![3, "c"]];
    let first = batch_insert("items", &["id", "name"], rows())
        .unwrap()
        .build(PG)
        .unwrap();
    let second = batch_insert("items", &["id", "name"], rows())
        .unwrap()
        .build(PG)
        .unwrap();

    assert_eq!(
        first.sql(),
        r#"INSERT INTO "items" ("id", "name") VALUES ($1, $2), ($3, $4), ($5, $6)"#
    );
    assert_eq!(first.args(), &args![1, "a", 2, "b", 3, "c"][..]);
    assert_eq!(first, second);
}

#[test]
fn test_batch_constructors_reject_zero_rows() {
    assert!(batch_insert("items", &["id"], vec![]).unwrap_err().is_validation());
    assert!(batch_update("items", "id", vec![]).unwrap_err().is_validation());
}

#[test]
fn test_batch_insert_arity_mismatch() {
    let err = batch_insert("items", &["id", "name"], vec![args![1, "a"], args![2]]).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_recursive_cte_requires_union() {
    let anchor = select(&["id"]).from("nodes").is_null("parent_id");
    let err = select(&[])
        .from("tree")
        .with_recursive("tree", &["id"], anchor)
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_recursive_cte_rejects_intersect_and_except() {
    let members = select(&["id"])
        .from("nodes")
        .union_all(select(&["id"]).from("more"))
        .except(select(&["id"]).from("hidden"));
    let err = select_from("tree")
        .with_recursive("tree", &["id"], members)
        .unwrap_err();
    assert!(err.to_string().contains("UNION or UNION ALL"));

    let members = select(&["id"]).from("nodes").intersect(select(&["id"]).from("more"));
    assert!(
        select_from("tree")
            .with_recursive("tree", &["id"], members)
            .unwrap_err()
            .is_validation()
    );
}

#[test]
fn test_recursive_cte() {
    let members = select(&["id", "parent_id"])
        .from("nodes")
        .eq("id", 1)
        .union_all(
            select(&["n.id", "n.parent_id"])
                .from("nodes n")
                .inner_join("tree t", "n.parent_id = t.id"),
        );
    let stmt = select(&[])
        .from("tree")
        .with_recursive("tree", &["id", "parent_id"], members)
        .unwrap()
        .gt("id", 10)
        .build(PG)
        .unwrap();
    assert_eq!(
        stmt.sql(),
        r#"WITH RECURSIVE "tree" ("id", "parent_id") AS ((SELECT "id", "parent_id" FROM "nodes" WHERE "id" = $1) UNION ALL (SELECT "n"."id", "n"."parent_id" FROM "nodes" AS "n" INNER JOIN "tree" AS "t" ON n.parent_id = t.id)) SELECT * FROM "tree" WHERE "id" > $2"#
    );
    assert_eq!(stmt.args(), &args![1, 10][..]);
}

#[test]
fn test_plain_cte_params_come_first() {
    let recent = select(&["id"]).from("orders").gt("total", 50);
    let stmt = select(&[])
        .from("recent")
        .with("recent", recent)
        .unwrap()
        .where_sql("id <> ?", args![3])
        .build(Dialect::Sqlite)
        .unwrap();
    assert_eq!(
        stmt.sql(),
        r#"WITH "recent" AS (SELECT "id" FROM "orders" WHERE "total" > ?) SELECT * FROM "recent" WHERE id <> ?"#
    );
    assert_eq!(stmt.args(), &args![50, 3][..]);
}

#[test]
fn test_cte_header_precedes_whole_set_operation() {
    let stmt = select(&["id"])
        .from("a")
        .eq("x", 1)
        .union(select(&["id"]).from("b").eq("y", 2))
        .with("c", select(&["id"]).from("t").gt("n", 0))
        .unwrap()
        .build(PG)
        .unwrap();
    assert_eq!(
        stmt.sql(),
        r#"WITH "c" AS (SELECT "id" FROM "t" WHERE "n" > $1) (SELECT "id" FROM "a" WHERE "x" = $2) UNION (SELECT "id" FROM "b" WHERE "y" = $3)"#
    );
    assert_eq!(stmt.args(), &args![0, 1, 2][..]);
}

#[test]
fn test_right_and_full_join() {
    let stmt = select(&[])
        .from_as("users", "u")
        .right_join("orders o", "o.user_id = u.id")
        .full_join("teams t", "t.id = u.team_id")
        .build(PG)
        .unwrap();
    assert_eq!(
        stmt.sql(),
        r#"SELECT * FROM "users" AS "u" RIGHT JOIN "orders" AS "o" ON o.user_id = u.id FULL JOIN "teams" AS "t" ON t.id = u.team_id"#
    );
}

#[test]
fn test_unchecked_templates_fail_at_build() {
    let too_few_args = Expr::Template {
        sql: "a = ? AND b = ?".into(),
        args: args![1],
    };
    let err = select(&[]).from("t").where_expr(too_few_args).build(PG).unwrap_err();
    assert!(err.is_validation());

    let too_many_args = Expr::Template {
        sql: "a = ?".into(),
        args: args![1, 2],
    };
    let err = select(&[])
        .from("t")
        .group_by(&["a"])
        .having_expr(too_many_args.clone())
        .build(Dialect::MySql)
        .unwrap_err();
    assert!(err.is_validation());
    assert!(too_many_args.compile(PG).unwrap_err().is_validation());

    let mut group = crate::qb::ExprGroup::new();
    group.push(Condition::Raw {
        sql: "a = ? OR b = ?".into(),
        args: vec![],
    });
    assert!(group.compile(Dialect::Sqlite).unwrap_err().is_validation());
}

#[test]
fn test_upsert_do_nothing_and_do_update() {
    let values = values! { "id" => 1, "name" => "a", "email" => "e" };

    let stmt = upsert("users", values.clone())
        .on_conflict(&["id"])
        .do_nothing()
        .build(PG)
        .unwrap();
    assert!(stmt.sql().ends_with(r#"ON CONFLICT ("id") DO NOTHING"#));
    assert!(!stmt.sql().contains("DO UPDATE"));

    let stmt = upsert("users", values)
        .on_conflict(&["id"])
        .do_update()
        .build(PG)
        .unwrap();
    assert!(stmt.sql().ends_with(
        r#"DO UPDATE SET "email" = EXCLUDED."email", "name" = EXCLUDED."name""#
    ));
}

#[test]
fn test_intersect_except_renumbered() {
    let a = select(&["id"]).from("a").eq("x", 1);
    let b = select(&["id"]).from("b").eq("y", 2);
    let c = select(&["id"]).from("c").eq("z", 3);
    let stmt = a.intersect(b).except(c).build(PG).unwrap();
    assert_eq!(
        stmt.sql(),
        r#"(SELECT "id" FROM "a" WHERE "x" = $1) INTERSECT (SELECT "id" FROM "b" WHERE "y" = $2) EXCEPT (SELECT "id" FROM "c" WHERE "z" = $3)"#
    );
    assert_eq!(stmt.args(), &args![1, 2, 3][..]);
}

#[test]
fn test_union_all_only_modifies_union() {
    let stmt = select_from("a")
        .union_all(select_from("b"))
        .intersect(select_from("c"))
        .build(Dialect::MySql)
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "(SELECT * FROM `a`) UNION ALL (SELECT * FROM `b`) INTERSECT (SELECT * FROM `c`)"
    );
}

#[test]
fn test_union_params_keep_member_order() {
    let a = select(&[]).from("a").where_sql("p = ? AND q = ?", args![1, 2]);
    let b = select(&[]).from("b").where_sql("r = ?", args![3]);
    let a_args = a.build(PG).unwrap().args().to_vec();
    let b_args = b.build(PG).unwrap().args().to_vec();

    let combined = a.union(b).build(PG).unwrap();
    let expected: Vec<Value> = a_args.into_iter().chain(b_args).collect();
    assert_eq!(combined.args(), &expected[..]);
    assert!(combined.sql().contains("r = $3"));
}

#[test]
fn test_no_op_calls_leave_sql_unchanged() {
    let base = || select(&["id"]).from("users").eq("active", true).limit(5);
    let expected = base().build(PG).unwrap();

    assert_eq!(base().union(None).build(PG).unwrap(), expected);
    assert_eq!(base().intersect(None::<SelectQb>).build(PG).unwrap(), expected);
    assert_eq!(base().order_by("").build(PG).unwrap(), expected);
    assert_eq!(base().where_expr(Expr::and(vec![])).build(PG).unwrap(), expected);
    assert_eq!(base().filter("").build(PG).unwrap(), expected);
}

#[test]
fn test_clause_order() {
    let stmt = select(&[])
        .from("users")
        .offset(40)
        .limit(20)
        .order_by("id")
        .eq("active", true)
        .build(PG)
        .unwrap();
    let sql = stmt.sql();
    let pos = |kw: &str| sql.find(kw).unwrap();
    assert!(pos(" WHERE ") < pos(" ORDER BY "));
    assert!(pos(" ORDER BY ") < pos(" LIMIT "));
    assert!(pos(" LIMIT ") < pos(" OFFSET "));
}

#[test]
fn test_same_builder_many_dialects() {
    let qb = select(&["id"]).from("users").eq("name", "a").in_list("role", [1, 2]);
    assert_eq!(
        qb.to_sql(PG).unwrap(),
        r#"SELECT "id" FROM "users" WHERE "name" = $1 AND "role" IN ($2, $3)"#
    );
    assert_eq!(
        qb.to_sql(Dialect::Sqlite).unwrap(),
        r#"SELECT "id" FROM "users" WHERE "name" = ? AND "role" IN (?, ?)"#
    );
    assert_eq!(
        qb.to_sql(Dialect::MySql).unwrap(),
        "SELECT `id` FROM `users` WHERE `name` = ? AND `role` IN (?, ?)"
    );
}

#[test]
fn test_expression_where_with_nested_or() {
    let stmt = select(&[])
        .from("users")
        .where_expr(Expr::or(vec![
            Expr::eq("role", "admin"),
            Expr::and(vec![Expr::eq("role", "member"), Expr::gte("karma", 100)]),
        ]))
        .build(PG)
        .unwrap();
    assert_eq!(
        stmt.sql(),
        r#"SELECT * FROM "users" WHERE "role" = $1 OR ("role" = $2 AND "karma" >= $3)"#
    );
}
