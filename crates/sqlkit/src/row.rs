//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// A result row: column names plus one [`Value`] per column.
///
/// Rows of the same result set share their column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row. `values` must line up with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in result order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Decode a column by name.
    pub fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| OrmError::decode(column, "no such column"))?;
        T::from_value(value).map_err(|msg| OrmError::decode(column, msg))
    }

    /// Decode a column by position.
    pub fn try_get_idx<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| OrmError::decode(format!("#{idx}"), "column index out of range"))?;
        let name = self.columns.get(idx).map_or("?", String::as_str);
        T::from_value(value).map_err(|msg| OrmError::decode(name, msg))
    }
}

/// Trait for converting a [`Row`] into a Rust value.
///
/// Implement it by hand for record types:
///
/// ```ignore
/// impl FromRow for User {
///     fn from_row(row: &Row) -> OrmResult<Self> {
///         Ok(Self { id: row.try_get("id")?, name: row.try_get("name")? })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a row to this type
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

// Scalar results (e.g. `SELECT COUNT(*)`) decode the first column.
macro_rules! impl_from_row_scalar {
    ($($t:ty),*) => {
        $(
            impl FromRow for $t {
                fn from_row(row: &Row) -> OrmResult<Self> {
                    row.try_get_idx(0)
                }
            }
        )*
    };
}

impl_from_row_scalar!(i64, i32, f64, bool, String);
