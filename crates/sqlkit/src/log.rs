//! `tracing` output for executed statements.
//!
//! Events are emitted under the `sqlkit.sql` target:
//!
//! - `DEBUG` before each statement runs (tag, dialect, param count, SQL)
//! - `WARN` when a statement exceeds the slow-query threshold
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("sqlkit.sql=debug")
//!     .init();
//! ```

use crate::dialect::Dialect;
use std::time::Duration;

/// Tracing target used for all SQL events.
pub const SQL_TARGET: &str = "sqlkit.sql";

/// How statements are reported to `tracing`.
#[derive(Debug, Clone)]
pub struct SqlLog {
    /// Emit the pre-execution debug event.
    pub enabled: bool,
    /// Truncate long SQL strings (in bytes, at a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Statements running longer than this are reported at `WARN`.
    pub slow_threshold: Option<Duration>,
    /// Dialect recorded on each event, when known.
    pub dialect: Option<Dialect>,
}

impl Default for SqlLog {
    fn default() -> Self {
        Self {
            enabled: true,
            max_sql_length: Some(200),
            slow_threshold: None,
            dialect: None,
        }
    }
}

impl SqlLog {
    /// Create with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Report statements slower than `threshold`.
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    fn truncate<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    pub(crate) fn before(&self, tag: Option<&str>, sql: &str, param_count: usize) {
        if !self.enabled {
            return;
        }
        let tag = tag.unwrap_or("-");
        let dialect = self.dialect.map_or("-", Dialect::name);
        tracing::debug!(
            target: SQL_TARGET,
            tag,
            dialect,
            param_count,
            sql = %self.truncate(sql),
        );
    }

    pub(crate) fn after(&self, tag: Option<&str>, sql: &str, elapsed: Duration) {
        let Some(threshold) = self.slow_threshold else {
            return;
        };
        if elapsed <= threshold {
            return;
        }
        tracing::warn!(
            target: SQL_TARGET,
            tag = tag.unwrap_or("-"),
            elapsed_ms = elapsed.as_millis() as u64,
            threshold_ms = threshold.as_millis() as u64,
            sql = %self.truncate(sql),
            "slow query",
        );
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
