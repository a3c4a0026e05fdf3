//! INSERT query builder.

use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::ident::render_table_ref;
use crate::qb::traits::SqlQb;
use crate::qb::upsert::UpsertQb;
use crate::qb::write_returning;
use crate::sql::Sql;
use crate::statement::Statement;
use crate::value::{Value, Values};
use std::collections::BTreeMap;

/// A column's value in INSERT/UPDATE.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SetField {
    /// Parameterized value
    Value(Value),
    /// Raw SQL expression
    Raw(String),
}

impl SetField {
    pub(crate) fn write_to(&self, out: &mut Sql) {
        match self {
            SetField::Value(v) => {
                out.push_bind(v.clone());
            }
            SetField::Raw(expr) => {
                out.push(expr);
            }
        }
    }
}

/// INSERT query builder.
///
/// Columns are emitted in lexicographic order, so the same set of columns
/// always produces the same SQL regardless of call order.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct InsertQb {
    table: String,
    fields: BTreeMap<String, SetField>,
    returning: Vec<String>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            fields: BTreeMap::new(),
            returning: Vec::new(),
        }
    }

    /// Set a column value. Setting a column twice keeps the last value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.fields
            .insert(column.to_string(), SetField::Value(value.into()));
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a raw SQL expression (e.g. `now()`).
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        self.fields
            .insert(column.to_string(), SetField::Raw(expr.to_string()));
        self
    }

    /// Set every column of a column → value map.
    pub fn values(mut self, values: Values) -> Self {
        for (column, value) in values {
            self.fields.insert(column, SetField::Value(value));
        }
        self
    }

    /// Add RETURNING columns. Not available on MySQL.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Turn into an upsert resolving conflicts on `columns`.
    pub fn on_conflict(self, columns: &[&str]) -> UpsertQb {
        UpsertQb::from_insert(self).on_conflict(columns)
    }

    /// Inserted columns, sorted.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub(crate) fn returning_columns(&self) -> &[String] {
        &self.returning
    }

    /// `INSERT INTO ... VALUES (...)` without RETURNING.
    pub(crate) fn write_base(&self, dialect: Dialect, out: &mut Sql) {
        out.push("INSERT INTO ");
        out.push(&render_table_ref(dialect, &self.table));

        if self.fields.is_empty() {
            match dialect {
                Dialect::MySql => out.push(" () VALUES ()"),
                Dialect::Postgres | Dialect::Sqlite => out.push(" DEFAULT VALUES"),
            };
            return;
        }

        out.push(" (");
        for (i, column) in self.fields.keys().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push_ident(dialect, column);
        }
        out.push(") VALUES (");
        for (i, field) in self.fields.values().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            field.write_to(out);
        }
        out.push(")");
    }
}

impl SqlQb for InsertQb {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        let mut out = Sql::empty();
        self.write_base(dialect, &mut out);
        write_returning(&self.returning, dialect, &mut out)?;
        out.build(dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrmError;
    use crate::values;

    #[test]
    fn columns_are_sorted() {
        let a = InsertQb::new("users").set("name", "alice").set("email", "a@x.io");
        let b = InsertQb::new("users").set("email", "a@x.io").set("name", "alice");
        let stmt = a.build(Dialect::Postgres).unwrap();
        assert_eq!(
            stmt.sql(),
            r#"INSERT INTO "users" ("email", "name") VALUES ($1, $2)"#
        );
        assert_eq!(stmt, b.build(Dialect::Postgres).unwrap());
    }

    #[test]
    fn values_map_and_raw() {
        let qb = InsertQb::new("events")
            .values(values! { "kind" => "login", "user_id" => 9 })
            .set_raw("created_at", "now()")
            .returning(&["id"]);
        let stmt = qb.build(Dialect::Postgres).unwrap();
        assert_eq!(
            stmt.sql(),
            r#"INSERT INTO "events" ("created_at", "kind", "user_id") VALUES (now(), $1, $2) RETURNING "id""#
        );
        assert_eq!(stmt.args(), &[Value::from("login"), Value::Int(9)]);
    }

    #[test]
    fn default_values() {
        let qb = InsertQb::new("counters");
        assert_eq!(
            qb.to_sql(Dialect::Sqlite).unwrap(),
            r#"INSERT INTO "counters" DEFAULT VALUES"#
        );
        assert_eq!(
            qb.to_sql(Dialect::MySql).unwrap(),
            "INSERT INTO `counters` () VALUES ()"
        );
    }

    #[test]
    fn returning_unsupported_on_mysql() {
        let qb = InsertQb::new("users").set("name", "a").returning(&["id"]);
        let err = qb.build(Dialect::MySql).unwrap_err();
        assert!(matches!(err, OrmError::Unsupported { dialect: "mysql", .. }));
    }
}
