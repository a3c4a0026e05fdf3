//! Compiled statements and their execution.

use crate::client::{ExecResult, Executor};
use crate::error::{OrmError, OrmResult};
use crate::log::SqlLog;
use crate::row::{FromRow, Row};
use crate::value::Value;
use std::future::Future;
use std::time::{Duration, Instant};

/// The output of every builder: SQL text with the dialect's placeholders and
/// the arguments bound to them, left to right.
///
/// A `Statement` is immutable once built; [`Statement::tagged`] and
/// [`Statement::with_timeout`] return annotated copies.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    args: Vec<Value>,
    tag: Option<String>,
    timeout: Option<Duration>,
}

impl Statement {
    /// Create a statement from already-rendered SQL.
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
            tag: None,
            timeout: None,
        }
    }

    /// SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound arguments in placeholder order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Tag attached for logging.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Execution deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Split into `(sql, args)`.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }

    /// Attach a tag for logging.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Fail execution with [`OrmError::Timeout`] after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    // ==================== Execution ====================

    /// Execute and return all rows.
    pub async fn fetch_all(&self, exec: &impl Executor) -> OrmResult<Vec<Row>> {
        self.query_with(exec, None, &SqlLog::default()).await
    }

    /// Execute and map all rows.
    pub async fn fetch_all_as<T: FromRow>(&self, exec: &impl Executor) -> OrmResult<Vec<T>> {
        self.fetch_all(exec).await?.iter().map(T::from_row).collect()
    }

    /// Execute and return the first row, or [`OrmError::NotFound`].
    pub async fn fetch_one(&self, exec: &impl Executor) -> OrmResult<Row> {
        self.fetch_opt(exec)
            .await?
            .ok_or_else(|| OrmError::not_found("query returned no rows"))
    }

    /// Execute and map the first row, or [`OrmError::NotFound`].
    pub async fn fetch_one_as<T: FromRow>(&self, exec: &impl Executor) -> OrmResult<T> {
        T::from_row(&self.fetch_one(exec).await?)
    }

    /// Execute and return the first row, if any.
    pub async fn fetch_opt(&self, exec: &impl Executor) -> OrmResult<Option<Row>> {
        Ok(self.fetch_all(exec).await?.into_iter().next())
    }

    /// Execute and map the first row, if any.
    pub async fn fetch_opt_as<T: FromRow>(&self, exec: &impl Executor) -> OrmResult<Option<T>> {
        self.fetch_opt(exec).await?.as_ref().map(T::from_row).transpose()
    }

    /// Execute a statement that returns no rows.
    pub async fn execute(&self, exec: &impl Executor) -> OrmResult<ExecResult> {
        self.execute_with(exec, None, &SqlLog::default()).await
    }

    /// Run as a query. The statement's own timeout takes precedence over `default_timeout`.
    pub(crate) async fn query_with(
        &self,
        exec: &impl Executor,
        default_timeout: Option<Duration>,
        log: &SqlLog,
    ) -> OrmResult<Vec<Row>> {
        log.before(self.tag(), &self.sql, self.args.len());
        let start = Instant::now();
        let rows = with_deadline(
            self.timeout.or(default_timeout),
            exec.query(&self.sql, &self.args),
        )
        .await;
        log.after(self.tag(), &self.sql, start.elapsed());
        rows
    }

    pub(crate) async fn execute_with(
        &self,
        exec: &impl Executor,
        default_timeout: Option<Duration>,
        log: &SqlLog,
    ) -> OrmResult<ExecResult> {
        log.before(self.tag(), &self.sql, self.args.len());
        let start = Instant::now();
        let result = with_deadline(
            self.timeout.or(default_timeout),
            exec.execute(&self.sql, &self.args),
        )
        .await;
        log.after(self.tag(), &self.sql, start.elapsed());
        result
    }
}

async fn with_deadline<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = OrmResult<T>>,
) -> OrmResult<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| OrmError::Timeout(limit))?,
        None => fut.await,
    }
}
