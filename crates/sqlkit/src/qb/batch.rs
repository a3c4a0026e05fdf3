//! Multi-row INSERT and CASE-based multi-row UPDATE.
//!
//! # Example
//! ```ignore
//! use sqlkit::{args, qb, Dialect, SqlQb};
//!
//! let stmt = qb::batch_insert("tags", &["name", "color"], vec![
//!     args!["rust", "orange"],
//!     args!["go", "blue"],
//! ])?
//! .build(Dialect::Postgres)?;
//! // INSERT INTO "tags" ("color", "name") VALUES ($1, $2), ($3, $4)
//! ```

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::render_table_ref;
use crate::qb::traits::SqlQb;
use crate::qb::write_returning;
use crate::sql::Sql;
use crate::statement::Statement;
use crate::value::{Value, Values};
use std::collections::BTreeSet;

/// Single-statement multi-row INSERT.
///
/// Columns are sorted; each row's values are reordered to match.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct BatchInsertQb {
    table: String,
    /// Sorted column names
    columns: Vec<String>,
    /// `order[i]` is the caller's index of sorted column `i`
    order: Vec<usize>,
    rows: Vec<Vec<Value>>,
    returning: Vec<String>,
}

impl BatchInsertQb {
    /// Create a batch insert for `columns`.
    ///
    /// Fails on an empty, blank or duplicated column list.
    pub fn new(table: &str, columns: &[&str]) -> OrmResult<Self> {
        if columns.is_empty() {
            return Err(OrmError::validation("batch insert requires at least one column"));
        }
        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(OrmError::validation("batch insert column names must not be empty"));
        }
        let mut order: Vec<usize> = (0..columns.len()).collect();
        order.sort_by_key(|&i| columns[i]);
        if order.windows(2).any(|w| columns[w[0]] == columns[w[1]]) {
            return Err(OrmError::validation("batch insert columns must be unique"));
        }
        Ok(Self {
            table: table.to_string(),
            columns: order.iter().map(|&i| columns[i].to_string()).collect(),
            order,
            rows: Vec::new(),
            returning: Vec::new(),
        })
    }

    /// Append a row, given in the caller's column order.
    ///
    /// Fails if the row's arity differs from the column count.
    pub fn row(mut self, values: Vec<Value>) -> OrmResult<Self> {
        if values.len() != self.columns.len() {
            return Err(OrmError::validation(format!(
                "batch insert row {} has {} value(s), expected {}",
                self.rows.len(),
                values.len(),
                self.columns.len()
            )));
        }
        let mut slots: Vec<Option<Value>> = values.into_iter().map(Some).collect();
        let row = self
            .order
            .iter()
            .map(|&i| slots[i].take().unwrap_or(Value::Null))
            .collect();
        self.rows.push(row);
        Ok(self)
    }

    /// Number of rows added.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add RETURNING columns. Not available on MySQL.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning.extend(columns.iter().map(|c| c.to_string()));
        self
    }
}

impl SqlQb for BatchInsertQb {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        if self.rows.is_empty() {
            return Err(OrmError::validation(format!(
                "batch insert into {} has no rows",
                self.table
            )));
        }
        let mut out = Sql::new("INSERT INTO ");
        out.push(&render_table_ref(dialect, &self.table));
        out.push(" (");
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push_ident(dialect, column);
        }
        out.push(") VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push("(");
            out.push_bind_list(row.iter().cloned());
            out.push(")");
        }
        write_returning(&self.returning, dialect, &mut out)?;
        out.build(dialect)
    }
}

/// Multi-row UPDATE keyed by one column:
///
/// ```text
/// UPDATE t SET c = CASE k WHEN ? THEN ? ... ELSE c END, ... WHERE k IN (?, ...)
/// ```
///
/// A row that lacks a column gets no WHEN arm for it, so that row keeps its
/// stored value.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct BatchUpdateQb {
    table: String,
    key: String,
    rows: Vec<(Value, Values)>,
}

impl BatchUpdateQb {
    /// Create a batch update keyed by `key`.
    pub fn new(table: &str, key: &str) -> Self {
        Self {
            table: table.to_string(),
            key: key.to_string(),
            rows: Vec::new(),
        }
    }

    /// Add one row: its key value and the columns to change.
    pub fn row(mut self, key: impl Into<Value>, values: Values) -> Self {
        self.rows.push((key.into(), values));
        self
    }

    /// Number of rows added.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted union of all rows' columns, excluding the key.
    fn columns(&self) -> BTreeSet<&str> {
        self.rows
            .iter()
            .flat_map(|(_, values)| values.keys())
            .map(String::as_str)
            .filter(|c| *c != self.key)
            .collect()
    }
}

impl SqlQb for BatchUpdateQb {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        if self.rows.is_empty() {
            return Err(OrmError::validation(format!(
                "batch update of {} has no rows",
                self.table
            )));
        }
        let columns = self.columns();
        if columns.is_empty() {
            return Err(OrmError::validation(format!(
                "batch update of {} has no columns to set",
                self.table
            )));
        }

        let mut out = Sql::new("UPDATE ");
        out.push(&render_table_ref(dialect, &self.table));
        out.push(" SET ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push_ident(dialect, column)
                .push(" = CASE ")
                .push_ident(dialect, &self.key);
            for (key, values) in &self.rows {
                if let Some(value) = values.get(*column) {
                    out.push(" WHEN ")
                        .push_bind(key.clone())
                        .push(" THEN ")
                        .push_bind(value.clone());
                }
            }
            out.push(" ELSE ").push_ident(dialect, column).push(" END");
        }
        out.push(" WHERE ").push_ident(dialect, &self.key).push(" IN (");
        out.push_bind_list(self.rows.iter().map(|(key, _)| key.clone()));
        out.push(")");
        out.build(dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args, values};

    #[test]
    fn rows_are_permuted_to_sorted_columns() {
        let stmt = BatchInsertQb::new("tags", &["name", "color"])
            .unwrap()
            .row(args!["rust", "orange"])
            .unwrap()
            .row(args!["go", "blue"])
            .unwrap()
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"INSERT INTO "tags" ("color", "name") VALUES ($1, $2), ($3, $4)"#
        );
        assert_eq!(stmt.args(), &args!["orange", "rust", "blue", "go"][..]);
    }

    #[test]
    fn arity_mismatch_fails_fast() {
        let err = BatchInsertQb::new("tags", &["a", "b"])
            .unwrap()
            .row(args![1])
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn invalid_columns() {
        assert!(BatchInsertQb::new("t", &[]).is_err());
        assert!(BatchInsertQb::new("t", &["a", " "]).is_err());
        assert!(BatchInsertQb::new("t", &["a", "b", "a"]).is_err());
    }

    #[test]
    fn zero_rows_fail_at_build() {
        let qb = BatchInsertQb::new("t", &["a"]).unwrap();
        assert!(qb.build(Dialect::Postgres).unwrap_err().is_validation());
        let qb = BatchUpdateQb::new("t", "id");
        assert!(qb.build(Dialect::Postgres).unwrap_err().is_validation());
    }

    #[test]
    fn case_update_with_missing_column() {
        let stmt = BatchUpdateQb::new("users", "id")
            .row(1, values! { "name" => "a", "score" => 10 })
            .row(2, values! { "score" => 20 })
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"UPDATE "users" SET "name" = CASE "id" WHEN $1 THEN $2 ELSE "name" END, "score" = CASE "id" WHEN $3 THEN $4 WHEN $5 THEN $6 ELSE "score" END WHERE "id" IN ($7, $8)"#
        );
        assert_eq!(
            stmt.args(),
            &args![1, "a", 1, 10, 2, 20, 1, 2][..]
        );
    }

    #[test]
    fn key_column_is_not_updated() {
        let stmt = BatchUpdateQb::new("users", "id")
            .row(1, values! { "id" => 1, "name" => "a" })
            .build(Dialect::MySql)
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE `users` SET `name` = CASE `id` WHEN ? THEN ? ELSE `name` END WHERE `id` IN (?)"
        );
    }
}
