//! # sqlkit
//!
//! A dialect-aware SQL statement compiler with a lightweight ORM layer.
//!
//! ## Features
//!
//! - **SQL explicit**: builders compile to plain `(sql, args)` [`Statement`]s
//! - **Multi-dialect**: PostgreSQL (`$n`), SQLite and MySQL (`?`) from one builder tree
//! - **Deterministic**: the same logical statement always renders byte-identical SQL
//! - **Safe defaults**: DELETE requires WHERE, UPDATE requires SET
//! - **Execution agnostic**: anything implementing [`Executor`] can run statements
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use sqlkit::{args, qb, Dialect, SqlQb};
//!
//! let stmt = qb::select(&["id", "name"])
//!     .from("users")
//!     .eq("status", "active")
//!     .where_sql("created_at > ?", args![since])
//!     .order_by("created_at DESC")
//!     .limit(10)
//!     .build(Dialect::Postgres)?;
//! // SELECT "id", "name" FROM "users" WHERE "status" = $1 AND (created_at > $2)
//! //   ORDER BY "created_at" DESC LIMIT 10
//! ```
//!
//! ## Sessions
//!
//! ```ignore
//! use sqlkit::{Db, DbConfig};
//!
//! let db = Db::new(client, DbConfig::from_toml_str(&std::fs::read_to_string("db.toml")?)?)?;
//! let users: Vec<User> = db.fetch_all(&qb::select_from("users")).await?;
//! db.create(&mut new_user).await?;
//! ```

pub mod client;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod explain;
pub mod ident;
pub mod log;
pub mod model;
pub mod named;
pub mod prelude;
pub mod qb;
pub mod row;
pub mod sql;
pub mod statement;
pub mod value;

#[cfg(feature = "postgres")]
mod pg;

pub use client::{ExecResult, Executor};
pub use config::DbConfig;
pub use db::Db;
pub use dialect::Dialect;
pub use error::{OrmError, OrmResult};
pub use explain::{ExplainOptions, explain};
pub use log::{SQL_TARGET, SqlLog};
pub use model::{Model, delete_model, find_by_pk, insert_model, update_model};
pub use named::{NamedQuery, named};
pub use row::{FromRow, Row};
pub use sql::{Sql, sql};
pub use statement::Statement;
pub use value::{FromValue, Value, Values};

// Re-export qb module for easy access
pub use qb::{
    BatchInsertQb, BatchUpdateQb, Condition, ConflictAction, DeleteQb, Expr, ExprGroup, InsertQb,
    JoinKind, SelectQb, SetOpKind, SqlQb, UpdateQb, UpsertQb, batch_insert, batch_update, delete,
    insert, select, select_from, update, upsert,
};
