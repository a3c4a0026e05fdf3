//! Database session: an executor bound to a dialect and configuration.

use crate::client::{ExecResult, Executor};
use crate::config::DbConfig;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::explain::{ExplainOptions, explain};
use crate::log::{SQL_TARGET, SqlLog};
use crate::model::{Model, delete_model, find_by_pk, generated_key, insert_model, update_model};
use crate::qb::{SelectQb, SqlQb};
use crate::row::{FromRow, Row};
use crate::statement::Statement;
use crate::value::Value;

/// An [`Executor`] plus the dialect its statements are compiled for.
///
/// Every statement run through a `Db` gets the configured default timeout
/// (unless it carries its own) and is logged under the `sqlkit.sql` target.
///
/// ```ignore
/// let db = Db::new(client, DbConfig::from_toml_str(&config)?)?;
/// let users: Vec<User> = db.fetch_all(&qb::select_from("users").eq("active", true)).await?;
/// ```
pub struct Db<E> {
    exec: E,
    dialect: Dialect,
    config: DbConfig,
    log: SqlLog,
}

impl<E: Executor> Db<E> {
    /// Create a session, resolving the dialect from `config.driver`.
    pub fn new(exec: E, config: DbConfig) -> OrmResult<Self> {
        let dialect = config.dialect()?;
        let log = config.sql_log(dialect);
        Ok(Self {
            exec,
            dialect,
            config,
            log,
        })
    }

    /// Create a session for an explicit dialect with default configuration.
    pub fn with_dialect(exec: E, dialect: Dialect) -> Self {
        let config = DbConfig::new().driver(dialect.name());
        let log = config.sql_log(dialect);
        Self {
            exec,
            dialect,
            config,
            log,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// The underlying executor.
    pub fn executor(&self) -> &E {
        &self.exec
    }

    /// Compile a builder for this session's dialect.
    pub fn build(&self, qb: &impl SqlQb) -> OrmResult<Statement> {
        qb.build(self.dialect)
    }

    // ==================== Statements ====================

    /// Run a compiled statement and return its rows.
    pub async fn query(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
        stmt.query_with(&self.exec, self.config.query_timeout(), &self.log)
            .await
    }

    /// Run a compiled statement that returns no rows.
    pub async fn exec(&self, stmt: &Statement) -> OrmResult<ExecResult> {
        stmt.execute_with(&self.exec, self.config.query_timeout(), &self.log)
            .await
    }

    // ==================== Builders ====================

    /// Build, execute and map all rows.
    pub async fn fetch_all<T: FromRow>(&self, qb: &impl SqlQb) -> OrmResult<Vec<T>> {
        let rows = self.query(&self.build(qb)?).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Build, execute and map the first row, or fail with `NotFound`.
    pub async fn fetch_one<T: FromRow>(&self, qb: &impl SqlQb) -> OrmResult<T> {
        self.fetch_opt(qb)
            .await?
            .ok_or_else(|| crate::error::OrmError::not_found("query returned no rows"))
    }

    /// Build, execute and map the first row, if any.
    pub async fn fetch_opt<T: FromRow>(&self, qb: &impl SqlQb) -> OrmResult<Option<T>> {
        let rows = self.query(&self.build(qb)?).await?;
        rows.first().map(T::from_row).transpose()
    }

    /// Build and execute a statement that returns no rows.
    pub async fn execute(&self, qb: &impl SqlQb) -> OrmResult<ExecResult> {
        self.exec(&self.build(qb)?).await
    }

    /// Count the rows a SELECT would return.
    pub async fn count(&self, qb: &SelectQb) -> OrmResult<i64> {
        let stmt = qb.build_count(self.dialect)?;
        let rows = self.query(&stmt).await?;
        match rows.first() {
            Some(row) => row.try_get_idx(0),
            None => Ok(0),
        }
    }

    /// Run the dialect's EXPLAIN for a builder and return the plan rows.
    pub async fn explain(&self, qb: &impl SqlQb, opts: ExplainOptions) -> OrmResult<Vec<Row>> {
        let stmt = explain(&self.build(qb)?, self.dialect, opts)?;
        self.query(&stmt).await
    }

    // ==================== Models ====================

    /// Insert a record and store its generated key.
    ///
    /// The key is read through `RETURNING` where the dialect supports it and
    /// from the backend's last-insert id otherwise. Failing to store it does
    /// not fail the call since the row is already written; it is logged at
    /// `WARN` instead.
    pub async fn create<M: Model>(&self, model: &mut M) -> OrmResult<ExecResult> {
        let qb = insert_model(model);
        let Some(pk) = generated_key::<M>(&model.to_values()) else {
            return self.execute(&qb).await;
        };

        let (result, id) = if self.dialect.supports_returning() {
            let rows = self.query(&self.build(&qb.returning(&[pk]))?).await?;
            let id = match rows.first() {
                Some(row) => row.try_get_idx::<i64>(0).map(Some),
                None => Ok(None),
            };
            (ExecResult::new(rows.len() as u64), id)
        } else {
            let result = self.execute(&qb).await?;
            (result, Ok(result.last_insert_id))
        };

        let populated = match id {
            Ok(Some(id)) => model.set_last_insert_id(id).map(|()| Some(id)),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        match populated {
            Ok(Some(id)) => Ok(ExecResult {
                last_insert_id: Some(id),
                ..result
            }),
            Ok(None) => {
                tracing::warn!(
                    target: SQL_TARGET,
                    table = M::TABLE,
                    key = pk,
                    "insert succeeded but no generated key was reported",
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(
                    target: SQL_TARGET,
                    table = M::TABLE,
                    key = pk,
                    error = %err,
                    "insert succeeded but the generated key could not be stored",
                );
                Ok(result)
            }
        }
    }

    /// Update every non-key column of a record.
    pub async fn update<M: Model>(&self, model: &M) -> OrmResult<ExecResult> {
        self.execute(&update_model(model)?).await
    }

    /// Delete a record by primary key.
    pub async fn delete<M: Model>(&self, model: &M) -> OrmResult<ExecResult> {
        self.execute(&delete_model(model)?).await
    }

    /// Load a record by primary key.
    pub async fn find<M: Model + FromRow>(&self, key: Vec<Value>) -> OrmResult<Option<M>> {
        self.fetch_opt(&find_by_pk::<M>(key)?).await
    }
}

impl<E> std::fmt::Debug for Db<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("dialect", &self.dialect)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
