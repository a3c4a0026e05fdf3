//! Statement builders.
//!
//! Every builder compiles through the same [`Sql`](crate::sql::Sql) fragment
//! representation, so placeholders are assigned once, left to right, for the
//! whole statement tree (subqueries, CTEs and set operations included).
//!
//! # Usage
//!
//! ```ignore
//! use sqlkit::{args, qb, values, Dialect, SqlQb};
//!
//! let stmt = qb::select(&["id", "name"])
//!     .from("users")
//!     .where_sql("status = ?", args![1])
//!     .order_by("created_at DESC")
//!     .limit(20)
//!     .build(Dialect::Postgres)?;
//!
//! let stmt = qb::insert("users")
//!     .values(values! { "name" => "alice", "email" => "a@example.com" })
//!     .returning(&["id"])
//!     .build(Dialect::Sqlite)?;
//!
//! let stmt = qb::update("users")
//!     .set("status", "inactive")
//!     .eq("id", user_id)
//!     .build(Dialect::MySql)?;
//! ```

mod batch;
mod delete;
mod expr;
mod insert;
mod select;
mod traits;
mod update;
mod upsert;

pub use batch::{BatchInsertQb, BatchUpdateQb};
pub use delete::DeleteQb;
pub use expr::{Condition, Expr, ExprGroup};
pub use insert::InsertQb;
pub use select::{JoinKind, SelectQb, SetOpKind};
pub use traits::SqlQb;
pub use update::UpdateQb;
pub use upsert::{ConflictAction, UpsertQb};

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::render_column;
use crate::sql::Sql;
use crate::value::{Value, Values};

/// Create a SELECT with the given columns (empty selects `*`).
///
/// # Example
/// ```ignore
/// let qb = sqlkit::qb::select(&["id"]).from("users").eq("id", 1);
/// ```
pub fn select(columns: &[&str]) -> SelectQb {
    SelectQb::new(columns)
}

/// Create `SELECT * FROM table`.
pub fn select_from(table: &str) -> SelectQb {
    SelectQb::new(&[]).from(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
///
/// Building without WHERE fails unless `all_rows()` is called.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

/// Create an upsert inserting `values` into `table`.
///
/// # Example
/// ```ignore
/// let qb = sqlkit::qb::upsert("users", values! { "id" => 1, "name" => "a" })
///     .on_conflict(&["id"])
///     .do_update();
/// ```
pub fn upsert(table: &str, values: Values) -> UpsertQb {
    UpsertQb::new(table, values)
}

/// Create a multi-row INSERT from rows given in `columns` order.
pub fn batch_insert(table: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> OrmResult<BatchInsertQb> {
    if rows.is_empty() {
        return Err(OrmError::validation(format!(
            "batch insert into {table} has no rows"
        )));
    }
    rows.into_iter()
        .try_fold(BatchInsertQb::new(table, columns)?, BatchInsertQb::row)
}

/// Create a CASE-based multi-row UPDATE from `(key value, columns)` pairs.
pub fn batch_update(table: &str, key: &str, rows: Vec<(Value, Values)>) -> OrmResult<BatchUpdateQb> {
    if rows.is_empty() {
        return Err(OrmError::validation(format!(
            "batch update of {table} has no rows"
        )));
    }
    Ok(rows
        .into_iter()
        .fold(BatchUpdateQb::new(table, key), |qb, (k, values)| qb.row(k, values)))
}

/// Append ` RETURNING ...` for dialects that support it.
pub(crate) fn write_returning(columns: &[String], dialect: Dialect, out: &mut Sql) -> OrmResult<()> {
    if columns.is_empty() {
        return Ok(());
    }
    if !dialect.supports_returning() {
        return Err(OrmError::unsupported("RETURNING", dialect.name()));
    }
    out.push(" RETURNING ");
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            out.push(", ");
        }
        out.push(&render_column(dialect, col));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
