//! Named-parameter binding: `:name` tokens become dialect placeholders.
//!
//! ```ignore
//! use sqlkit::{named, Dialect};
//!
//! let stmt = named("SELECT * FROM users WHERE id = :id AND created_at > :since::date")
//!     .bind("id", 7)
//!     .bind("since", "2024-01-01")
//!     .build(Dialect::Postgres)?;
//! // SELECT * FROM users WHERE id = $1 AND created_at > $2::date
//! ```
//!
//! `::` casts, single-quoted string literals and double-quoted identifiers are
//! left untouched. A name used twice binds its value twice.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::sql::Sql;
use crate::statement::Statement;
use crate::value::{Value, Values};

/// SQL text with `:name` parameters and their bound values.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedQuery {
    sql: String,
    params: Values,
}

/// Start a named-parameter query.
pub fn named(sql: impl Into<String>) -> NamedQuery {
    NamedQuery::new(sql)
}

impl NamedQuery {
    /// Create a query from SQL with `:name` parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Values::new(),
        }
    }

    /// Bind a value to `name` (without the leading `:`).
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Bind every entry of a name → value map.
    pub fn bind_all(mut self, values: Values) -> Self {
        self.params.extend(values);
        self
    }

    /// Parameter names in order of appearance (repeats included).
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        scan(&self.sql, |seg| {
            if let Segment::Name(name) = seg {
                names.push(name);
            }
        });
        names
    }

    /// Rewrite names to placeholders and bind their values.
    ///
    /// Fails with [`OrmError::MissingParam`] for the first unbound name.
    pub fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        let mut out = Sql::empty();
        let mut missing = None;
        scan(&self.sql, |seg| match seg {
            Segment::Text(text) => {
                out.push(text);
            }
            Segment::Name(name) => match self.params.get(name) {
                Some(value) => {
                    out.push_bind(value.clone());
                }
                None => {
                    missing.get_or_insert(name);
                }
            },
        });
        if let Some(name) = missing {
            return Err(OrmError::missing_param(name));
        }
        out.build(dialect)
    }
}

impl crate::qb::SqlQb for NamedQuery {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        NamedQuery::build(self, dialect)
    }
}

enum Segment<'a> {
    Text(&'a str),
    Name(&'a str),
}

fn is_name_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

fn is_name_char(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Split `sql` into literal text and parameter names.
fn scan<'a>(sql: &'a str, mut emit: impl FnMut(Segment<'a>)) {
    let bytes = sql.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                // Skip to the closing quote; doubled quotes are escapes.
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes.get(i + 1).copied().is_some_and(is_name_start) => {
                if start < i {
                    emit(Segment::Text(&sql[start..i]));
                }
                let name_start = i + 1;
                let mut end = name_start + 1;
                while end < bytes.len() && is_name_char(bytes[end]) {
                    end += 1;
                }
                emit(Segment::Name(&sql[name_start..end]));
                start = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        emit(Segment::Text(&sql[start..]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_names_in_order() {
        let stmt = named("SELECT * FROM users WHERE id = :id AND org = :org_id")
            .bind("org_id", 3)
            .bind("id", 7)
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id = $1 AND org = $2");
        assert_eq!(stmt.args(), &[Value::Int(7), Value::Int(3)]);
    }

    #[test]
    fn casts_and_literals_are_untouched() {
        let stmt = named("SELECT ':skip', \"a:b\", :v::int")
            .bind("v", "5")
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT ':skip', \"a:b\", $1::int");
    }

    #[test]
    fn escaped_quotes_inside_literals() {
        let q = named("SELECT 'it''s :not' WHERE a = :a");
        assert_eq!(q.names(), ["a"]);
    }

    #[test]
    fn repeated_name_binds_twice() {
        let stmt = named("a = :x OR b = :x")
            .bind("x", 1)
            .build(Dialect::MySql)
            .unwrap();
        assert_eq!(stmt.sql(), "a = ? OR b = ?");
        assert_eq!(stmt.args(), &[Value::Int(1), Value::Int(1)]);
    }

    #[test]
    fn missing_param_names_it() {
        let err = named("a = :a AND b = :b")
            .bind("a", 1)
            .build(Dialect::Sqlite)
            .unwrap_err();
        assert!(matches!(err, OrmError::MissingParam { ref name } if name == "b"));
    }
}
