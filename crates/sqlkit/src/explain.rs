//! Query-plan introspection.
//!
//! The compiled statement is prefixed with the dialect's EXPLAIN form and its
//! arguments are forwarded untouched; interpreting the plan rows is left to
//! the caller.

use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::statement::Statement;

/// EXPLAIN options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExplainOptions {
    /// Execute the statement and report actual timings.
    ///
    /// Not available on SQLite.
    pub analyze: bool,
}

impl ExplainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(mut self, analyze: bool) -> Self {
        self.analyze = analyze;
        self
    }
}

/// Wrap `stmt` in the dialect's EXPLAIN syntax.
///
/// | Dialect          | Plain                | `analyze`                        |
/// |------------------|----------------------|----------------------------------|
/// | Postgres, MySQL  | `EXPLAIN ...`        | `EXPLAIN ANALYZE ...`            |
/// | SQLite           | `EXPLAIN QUERY PLAN` | [`OrmError::Unsupported`](crate::OrmError::Unsupported) |
pub fn explain(stmt: &Statement, dialect: Dialect, opts: ExplainOptions) -> OrmResult<Statement> {
    let prefix = dialect.explain_prefix(opts.analyze)?;
    let explained = Statement::new(format!("{prefix}{}", stmt.sql()), stmt.args().to_vec());
    Ok(match stmt.tag() {
        Some(tag) => explained.tagged(format!("explain:{tag}")),
        None => explained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrmError;
    use crate::qb::{SqlQb, select};

    #[test]
    fn prefixes_and_forwards_args() {
        let stmt = select(&[]).from("users").eq("id", 1).build(Dialect::Postgres).unwrap();
        let plan = explain(&stmt, Dialect::Postgres, ExplainOptions::new()).unwrap();
        assert_eq!(plan.sql(), r#"EXPLAIN SELECT * FROM "users" WHERE "id" = $1"#);
        assert_eq!(plan.args(), stmt.args());

        let plan = explain(&stmt, Dialect::MySql, ExplainOptions::new().analyze(true)).unwrap();
        assert!(plan.sql().starts_with("EXPLAIN ANALYZE SELECT"));
    }

    #[test]
    fn sqlite_query_plan() {
        let stmt = Statement::new("SELECT 1", vec![]).tagged("ping");
        let plan = explain(&stmt, Dialect::Sqlite, ExplainOptions::new()).unwrap();
        assert_eq!(plan.sql(), "EXPLAIN QUERY PLAN SELECT 1");
        assert_eq!(plan.tag(), Some("explain:ping"));
    }

    #[test]
    fn analyze_on_sqlite_is_unsupported() {
        let stmt = Statement::new("SELECT 1", vec![]);
        let err = explain(&stmt, Dialect::Sqlite, ExplainOptions::new().analyze(true)).unwrap_err();
        assert!(matches!(err, OrmError::Unsupported { dialect: "sqlite", .. }));
    }
}
