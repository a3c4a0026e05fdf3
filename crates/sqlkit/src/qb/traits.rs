//! Trait definitions for query builders.

use crate::client::{ExecResult, Executor};
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::row::FromRow;
use crate::statement::Statement;

/// Base trait for all statement builders.
///
/// `build` compiles the builder tree for one dialect. The same builder can be
/// built repeatedly, for different dialects, and always yields byte-identical
/// output for the same input.
pub trait SqlQb: Sync {
    /// Compile to SQL text plus ordered arguments.
    fn build(&self, dialect: Dialect) -> OrmResult<Statement>;

    /// Debug helper to get the SQL string.
    fn to_sql(&self, dialect: Dialect) -> OrmResult<String> {
        Ok(self.build(dialect)?.into_parts().0)
    }

    /// Build, execute and map all rows to `T`.
    fn fetch_all<T: FromRow>(
        &self,
        dialect: Dialect,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = OrmResult<Vec<T>>> + Send {
        async move {
            let rows = self.build(dialect)?.fetch_all(exec).await?;
            rows.iter().map(T::from_row).collect()
        }
    }

    /// Build, execute and map the first row, or fail with `NotFound`.
    fn fetch_one<T: FromRow>(
        &self,
        dialect: Dialect,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = OrmResult<T>> + Send {
        async move {
            let row = self.build(dialect)?.fetch_one(exec).await?;
            T::from_row(&row)
        }
    }

    /// Build, execute and map the first row, if any.
    fn fetch_opt<T: FromRow>(
        &self,
        dialect: Dialect,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = OrmResult<Option<T>>> + Send {
        async move {
            let row = self.build(dialect)?.fetch_opt(exec).await?;
            row.as_ref().map(T::from_row).transpose()
        }
    }

    /// Build and execute a statement that returns no rows.
    fn execute(
        &self,
        dialect: Dialect,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send {
        async move { self.build(dialect)?.execute(exec).await }
    }
}
