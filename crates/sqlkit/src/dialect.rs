//! SQL dialects: placeholder tokens and identifier quoting.
//!
//! Three conventions are supported:
//!
//! | Dialect    | Placeholder     | Identifier  |
//! |------------|-----------------|-------------|
//! | `Postgres` | `$1, $2, ...`   | `"name"`    |
//! | `Sqlite`   | `?`             | `"name"`    |
//! | `MySql`    | `?`             | `` `name` `` |
//!
//! A dialect is resolved from a driver name with [`Dialect::from_driver`].

use crate::error::{OrmError, OrmResult};
use std::fmt;
use std::str::FromStr;

/// A database engine's placeholder and identifier-quoting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Numbered placeholders (`$n`), double-quoted identifiers.
    Postgres,
    /// Sequential placeholders (`?`), double-quoted identifiers.
    Sqlite,
    /// Sequential placeholders (`?`), backtick-quoted identifiers.
    MySql,
}

impl Dialect {
    /// Resolve a driver name to a dialect.
    ///
    /// Matching is case-insensitive. Unknown names are a configuration error.
    pub fn from_driver(driver: &str) -> OrmResult<Self> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" | "pgx" | "tokio-postgres" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "mysql" | "mariadb" => Ok(Self::MySql),
            _ => Err(OrmError::UnknownDriver(driver.to_string())),
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
        }
    }

    /// Whether placeholders carry their 1-based position.
    pub fn is_numbered(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Placeholder token for a 1-based argument position.
    pub fn placeholder(self, position: usize) -> String {
        let mut out = String::with_capacity(4);
        self.write_placeholder(&mut out, position);
        out
    }

    /// Append the placeholder token for `position` to `out`.
    pub fn write_placeholder(self, out: &mut String, position: usize) {
        match self {
            Self::Postgres => {
                out.push('$');
                out.push_str(&position.to_string());
            }
            Self::Sqlite | Self::MySql => out.push('?'),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Self::Postgres | Self::Sqlite => '"',
            Self::MySql => '`',
        }
    }

    /// Quote a single identifier part. Embedded quote characters are doubled.
    pub fn quote_ident(self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        self.write_ident(&mut out, name);
        out
    }

    /// Append a quoted identifier part to `out`.
    pub fn write_ident(self, out: &mut String, name: &str) {
        let q = self.quote_char();
        out.push(q);
        for ch in name.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
    }

    /// Whether `INSERT/UPDATE/DELETE ... RETURNING` is available.
    pub fn supports_returning(self) -> bool {
        !matches!(self, Self::MySql)
    }

    /// `LIMIT` value meaning "no limit", for dialects that reject `OFFSET` alone.
    pub(crate) fn unbounded_limit(self) -> Option<&'static str> {
        match self {
            Self::Postgres => None,
            Self::Sqlite => Some("-1"),
            Self::MySql => Some("18446744073709551615"),
        }
    }

    /// Keyword prefix for plan introspection.
    pub(crate) fn explain_prefix(self, analyze: bool) -> OrmResult<&'static str> {
        match (self, analyze) {
            (Self::Postgres | Self::MySql, false) => Ok("EXPLAIN "),
            (Self::Postgres | Self::MySql, true) => Ok("EXPLAIN ANALYZE "),
            (Self::Sqlite, false) => Ok("EXPLAIN QUERY PLAN "),
            (Self::Sqlite, true) => Err(OrmError::unsupported("EXPLAIN ANALYZE", self.name())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_driver(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(1), "$1");
        assert_eq!(Dialect::Postgres.placeholder(12), "$12");
    }

    #[test]
    fn sequential_placeholders() {
        assert_eq!(Dialect::Sqlite.placeholder(7), "?");
        assert_eq!(Dialect::MySql.placeholder(7), "?");
    }

    #[test]
    fn quoting() {
        assert_eq!(Dialect::Postgres.quote_ident("users"), r#""users""#);
        assert_eq!(Dialect::Sqlite.quote_ident(r#"we"ird"#), r#""we""ird""#);
        assert_eq!(Dialect::MySql.quote_ident("users"), "`users`");
        assert_eq!(Dialect::MySql.quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn registry_resolves_aliases() {
        assert_eq!(Dialect::from_driver("PostgreSQL").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_driver("sqlite3").unwrap(), Dialect::Sqlite);
        assert_eq!(Dialect::from_driver("mariadb").unwrap(), Dialect::MySql);
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MySql);
    }

    #[test]
    fn registry_rejects_unknown_driver() {
        let err = Dialect::from_driver("oracle").unwrap_err();
        assert!(matches!(err, OrmError::UnknownDriver(ref d) if d == "oracle"));
    }

    #[test]
    fn explain_analyze_on_sqlite_is_unsupported() {
        assert_eq!(Dialect::Sqlite.explain_prefix(false).unwrap(), "EXPLAIN QUERY PLAN ");
        assert!(matches!(
            Dialect::Sqlite.explain_prefix(true),
            Err(OrmError::Unsupported { dialect: "sqlite", .. })
        ));
    }
}
