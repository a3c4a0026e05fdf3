//! Session configuration.
//!
//! ```toml
//! driver = "postgres"
//! query_timeout_ms = 5000
//! slow_query_threshold_ms = 200
//! log_sql = true
//! max_logged_sql_length = 500
//! ```

use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::log::SqlLog;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for [`Db`](crate::Db).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Driver name resolved through [`Dialect::from_driver`].
    pub driver: String,
    /// Default deadline for statements without their own timeout.
    pub query_timeout_ms: Option<u64>,
    /// Statements slower than this are logged at `WARN`.
    pub slow_query_threshold_ms: Option<u64>,
    /// Whether to log statements before execution.
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            driver: "postgres".to_string(),
            query_timeout_ms: None,
            slow_query_threshold_ms: None,
            log_sql: true,
            max_logged_sql_length: Some(200),
        }
    }
}

impl DbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> OrmResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Set the driver name.
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    /// Set query timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.query_timeout_ms = Some(duration.as_millis() as u64);
        self
    }

    /// Set slow query threshold.
    pub fn slow_threshold(mut self, duration: Duration) -> Self {
        self.slow_query_threshold_ms = Some(duration.as_millis() as u64);
        self
    }

    /// Enable or disable statement logging.
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Resolve the configured driver to a dialect.
    pub fn dialect(&self) -> OrmResult<Dialect> {
        Dialect::from_driver(&self.driver)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }

    pub fn slow_query_threshold(&self) -> Option<Duration> {
        self.slow_query_threshold_ms.map(Duration::from_millis)
    }

    pub(crate) fn sql_log(&self, dialect: Dialect) -> SqlLog {
        SqlLog {
            enabled: self.log_sql,
            max_sql_length: self.max_logged_sql_length,
            slow_threshold: self.slow_query_threshold(),
            dialect: Some(dialect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrmError;

    #[test]
    fn parses_toml() {
        let cfg = DbConfig::from_toml_str(
            r#"
            driver = "sqlite"
            query_timeout_ms = 1500
            log_sql = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.dialect().unwrap(), Dialect::Sqlite);
        assert_eq!(cfg.query_timeout(), Some(Duration::from_millis(1500)));
        assert!(!cfg.log_sql);
        assert_eq!(cfg.max_logged_sql_length, Some(200));
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(DbConfig::from_toml_str("").unwrap(), DbConfig::default());
    }

    #[test]
    fn malformed_document_is_config_error() {
        let err = DbConfig::from_toml_str("query_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
        let err = DbConfig::from_toml_str("colour = 1").unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn unknown_driver_fails_at_resolution() {
        let cfg = DbConfig::new().driver("oracle");
        assert!(matches!(cfg.dialect(), Err(OrmError::UnknownDriver(_))));
    }

    #[test]
    fn builder_setters() {
        let cfg = DbConfig::new()
            .driver("mysql")
            .timeout(Duration::from_secs(2))
            .slow_threshold(Duration::from_millis(50));
        assert_eq!(cfg.query_timeout_ms, Some(2000));
        assert_eq!(cfg.slow_query_threshold(), Some(Duration::from_millis(50)));
    }
}
