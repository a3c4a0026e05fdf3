//! Convenient imports for typical `sqlkit` usage.
//!
//! ```ignore
//! use sqlkit::prelude::*;
//! ```

pub use crate::{
    Db, DbConfig, Dialect, Executor, Expr, FromRow, Model, OrmError, OrmResult, Row, Sql, SqlQb,
    Statement, Value, Values, args, named, qb, sql, values,
};
