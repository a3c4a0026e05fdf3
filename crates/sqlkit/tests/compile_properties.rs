//! Compiler properties checked over generated inputs.

use sqlkit::{Dialect, SqlQb, Statement, Value, Values, args, qb};

const DIALECTS: [Dialect; 3] = [Dialect::Postgres, Dialect::Sqlite, Dialect::MySql];

/// Deterministic pseudo-random column sets: `count` distinct names per case.
fn key_sets(cases: usize) -> Vec<Vec<String>> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    (0..cases)
        .map(|case| {
            let count = 1 + case % 7;
            let mut cols: Vec<String> = Vec::with_capacity(count);
            while cols.len() < count {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let name = format!("c{}", state % 50);
                if !cols.contains(&name) {
                    cols.push(name);
                }
            }
            cols
        })
        .collect()
}

fn values_for(cols: &[String]) -> Values {
    cols.iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), Value::Int(i as i64)))
        .collect()
}

/// Placeholder numbers in order of appearance.
fn numbered_placeholders(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if let Ok(n) = sql[start..end].parse() {
                out.push(n);
            }
            i = end;
        } else {
            i += 1;
        }
    }
    out
}

fn assert_aligned(stmt: &Statement, dialect: Dialect) {
    if dialect.is_numbered() {
        let expected: Vec<usize> = (1..=stmt.args().len()).collect();
        assert_eq!(numbered_placeholders(stmt.sql()), expected, "{}", stmt.sql());
    } else {
        assert_eq!(stmt.sql().matches('?').count(), stmt.args().len(), "{}", stmt.sql());
    }
}

#[test]
fn insert_is_independent_of_insertion_order() {
    for cols in key_sets(40) {
        let forward = cols
            .iter()
            .enumerate()
            .fold(qb::insert("t"), |q, (i, c)| q.set(c, i as i64));
        let backward = cols
            .iter()
            .enumerate()
            .rev()
            .fold(qb::insert("t"), |q, (i, c)| q.set(c, i as i64));
        for dialect in DIALECTS {
            assert_eq!(
                forward.build(dialect).unwrap(),
                backward.build(dialect).unwrap()
            );
        }
    }
}

#[test]
fn insert_columns_render_sorted() {
    for cols in key_sets(40) {
        let stmt = qb::insert("t").values(values_for(&cols)).build(Dialect::Sqlite).unwrap();
        let mut sorted = cols.clone();
        sorted.sort();
        let rendered: Vec<String> = sorted.iter().map(|c| format!("\"{c}\"")).collect();
        assert!(
            stmt.sql().contains(&format!("({})", rendered.join(", "))),
            "{}",
            stmt.sql()
        );
    }
}

#[test]
fn repeated_builds_are_byte_identical() {
    for cols in key_sets(30) {
        let q = cols
            .iter()
            .fold(qb::select(&["id"]).from("t"), |q, c| q.gt(c, 1))
            .union(qb::select(&["id"]).from("u").eq("x", 2))
            .order_by("id")
            .limit(5);
        for dialect in DIALECTS {
            let first = q.build(dialect).unwrap();
            for _ in 0..3 {
                assert_eq!(q.build(dialect).unwrap(), first);
            }
        }
    }
}

#[test]
fn placeholders_align_with_args() {
    for cols in key_sets(30) {
        let values = values_for(&cols);
        let inner = qb::select(&["user_id"]).from("orders").in_list("status", args!["a", "b"]);
        let select = qb::select(&["id"])
            .with("recent", qb::select(&["id"]).from("events").gte("at", 3))
            .unwrap()
            .from_subquery(inner, "o")
            .unwrap()
            .where_sql("score > ? AND score < ?", args![1, 9])
            .having("COUNT(*) > ?", args![2])
            .group_by(&["id"])
            .union_all(qb::select(&["id"]).from("archive").not_in("id", args![7, 8, 9]));
        let statements = |dialect: Dialect| {
            let mut out = vec![
                select.build(dialect).unwrap(),
                qb::insert("t").values(values.clone()).build(dialect).unwrap(),
                qb::update("t")
                    .values(values.clone())
                    .eq("id", 1)
                    .build(dialect)
                    .unwrap(),
                qb::upsert("t", values.clone())
                    .on_conflict(&["id"])
                    .do_update()
                    .build(dialect)
                    .unwrap(),
            ];
            let rows = (0..3)
                .map(|r| (Value::Int(r), values.clone()))
                .collect::<Vec<_>>();
            out.push(qb::batch_update("t", "id", rows).unwrap().build(dialect).unwrap());
            out
        };
        for dialect in DIALECTS {
            for stmt in statements(dialect) {
                assert_aligned(&stmt, dialect);
            }
        }
    }
}

#[test]
fn clause_order_is_fixed() {
    let q = qb::select(&["status", "COUNT(*)"])
        .with("active", qb::select(&["id"]).from("users"))
        .unwrap()
        .distinct(true)
        .from("orders")
        .inner_join("active a", "a.id = orders.user_id")
        .gt("total", 5)
        .group_by(&["status"])
        .having("COUNT(*) > ?", args![1])
        .order_by("status DESC")
        .limit(10)
        .offset(20);
    let sql = q.build(Dialect::Postgres).unwrap().into_parts().0;
    let positions: Vec<usize> = [
        "WITH ",
        "SELECT DISTINCT ",
        " FROM \"orders\"",
        " INNER JOIN ",
        " WHERE ",
        " GROUP BY ",
        " HAVING ",
        " ORDER BY ",
        " LIMIT ",
        " OFFSET ",
    ]
    .iter()
    .map(|kw| sql.find(kw).unwrap_or_else(|| panic!("{kw:?} missing in {sql}")))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{sql}");
}
