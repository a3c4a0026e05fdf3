//! Unified expression layer for WHERE/HAVING/ON conditions.
//!
//! This module provides:
//! - [`Expr`]: AND/OR/NOT groups, comparisons, templates and raw fragments
//! - [`Condition`]: what builder methods accept, either a raw SQL string with
//!   `?` markers or an [`Expr`]
//! - [`ExprGroup`]: an ordered list of conditions joined by `AND`
//!
//! Expressions write into a [`Sql`] fragment, so placeholder positions are
//! assigned once, when the whole statement is rendered.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::render_column;
use crate::sql::{Sql, count_markers};
use crate::value::Value;

/// Expression node for building WHERE/HAVING clauses.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// AND group: all conditions must be true.
    And(Vec<Expr>),

    /// OR group: at least one condition must be true.
    Or(Vec<Expr>),

    /// NOT: negate the inner expression.
    Not(Box<Expr>),

    /// Simple comparison: `column op ?`
    Compare {
        column: String,
        op: &'static str,
        value: Value,
    },

    /// NULL check: `column IS NULL` or `column IS NOT NULL`
    NullCheck { column: String, is_null: bool },

    /// IN list: `column IN (?, ?, ...)` or `column NOT IN (...)`
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },

    /// BETWEEN: `column BETWEEN ? AND ?`
    Between {
        column: String,
        from: Value,
        to: Value,
        negated: bool,
    },

    /// SQL with `?` markers bound to `args` in order (`??` is a literal `?`).
    Template { sql: String, args: Vec<Value> },

    /// Raw SQL fragment without parameters.
    Raw(String),

    /// Always true (used for empty NOT IN lists).
    True,

    /// Always false (used for empty IN lists).
    False,
}

impl Expr {
    /// Create an AND expression from a list of expressions.
    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    /// Create an OR expression from a list of expressions.
    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    /// Create a NOT expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    fn compare(column: impl Into<String>, op: &'static str, value: impl Into<Value>) -> Self {
        Expr::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "=", value)
    }

    /// `column <> value`
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<>", value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, ">", value)
    }

    /// `column >= value`
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, ">=", value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<", value)
    }

    /// `column <= value`
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<=", value)
    }

    /// `column LIKE pattern`
    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, "LIKE", pattern)
    }

    /// `column NOT LIKE pattern`
    pub fn not_like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, "NOT LIKE", pattern)
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: true,
        }
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: false,
        }
    }

    /// `column IN (values...)`. An empty list never matches.
    pub fn in_list<T: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = T>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Expr::False;
        }
        Expr::InList {
            column: column.into(),
            values,
            negated: false,
        }
    }

    /// `column NOT IN (values...)`. An empty list always matches.
    pub fn not_in<T: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = T>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            column: column.into(),
            values,
            negated: true,
        }
    }

    /// `column BETWEEN from AND to`
    pub fn between(column: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Expr::Between {
            column: column.into(),
            from: from.into(),
            to: to.into(),
            negated: false,
        }
    }

    /// `column NOT BETWEEN from AND to`
    pub fn not_between(
        column: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: from.into(),
            to: to.into(),
            negated: true,
        }
    }

    /// Create a template expression with `?` markers.
    ///
    /// The marker count must match `args.len()`.
    ///
    /// # Example
    /// ```ignore
    /// Expr::template("a = ? OR b = ?", args![1, 2])?
    /// ```
    pub fn template(sql: impl Into<String>, args: Vec<Value>) -> OrmResult<Self> {
        let sql = sql.into();
        check_markers(&sql, &args)?;
        Ok(Expr::Template { sql, args })
    }

    /// Create a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// Check if this expression contributes nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => exprs.iter().all(Expr::is_empty),
            Expr::Not(inner) => inner.is_empty(),
            Expr::Template { sql, .. } | Expr::Raw(sql) => sql.trim().is_empty(),
            _ => false,
        }
    }

    /// Whether the fragment needs parentheses when joined with siblings.
    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::And(_) | Expr::Or(_) | Expr::Template { .. } | Expr::Raw(_)
        )
    }

    /// Compile to a standalone fragment and its arguments.
    ///
    /// Placeholders start at position 1. A template whose markers do not
    /// match its arguments is a validation error.
    pub fn compile(&self, dialect: Dialect) -> OrmResult<(String, Vec<Value>)> {
        let mut out = Sql::empty();
        self.write_to(dialect, &mut out);
        Ok(out.build(dialect)?.into_parts())
    }

    /// Append this expression to `out`. Empty expressions append nothing.
    pub fn write_to(&self, dialect: Dialect, out: &mut Sql) {
        match self {
            Expr::And(exprs) => write_joined(exprs, " AND ", dialect, out),
            Expr::Or(exprs) => write_joined(exprs, " OR ", dialect, out),
            Expr::Not(inner) => {
                if inner.is_empty() {
                    return;
                }
                out.push("NOT (");
                inner.write_to(dialect, out);
                out.push(")");
            }
            Expr::Compare { column, op, value } => {
                out.push(&render_column(dialect, column))
                    .push(" ")
                    .push(op)
                    .push(" ")
                    .push_bind(value.clone());
            }
            Expr::NullCheck { column, is_null } => {
                out.push(&render_column(dialect, column));
                out.push(if *is_null { " IS NULL" } else { " IS NOT NULL" });
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    out.push(if *negated { "1=1" } else { "1=0" });
                    return;
                }
                out.push(&render_column(dialect, column));
                out.push(if *negated { " NOT IN (" } else { " IN (" });
                out.push_bind_list(values.iter().cloned());
                out.push(")");
            }
            Expr::Between {
                column,
                from,
                to,
                negated,
            } => {
                out.push(&render_column(dialect, column));
                out.push(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                out.push_bind(from.clone())
                    .push(" AND ")
                    .push_bind(to.clone());
            }
            Expr::Template { sql, args } => {
                out.append_template(sql, args);
            }
            Expr::Raw(sql) => {
                out.push(sql);
            }
            Expr::True => {
                out.push("1=1");
            }
            Expr::False => {
                out.push("1=0");
            }
        }
    }
}

fn write_joined(exprs: &[Expr], keyword: &str, dialect: Dialect, out: &mut Sql) {
    let live: Vec<&Expr> = exprs.iter().filter(|e| !e.is_empty()).collect();
    let wrap = live.len() > 1;
    for (i, expr) in live.into_iter().enumerate() {
        if i > 0 {
            out.push(keyword);
        }
        if wrap && expr.is_compound() {
            out.push("(");
            expr.write_to(dialect, out);
            out.push(")");
        } else {
            expr.write_to(dialect, out);
        }
    }
}

fn check_markers(sql: &str, args: &[Value]) -> OrmResult<()> {
    let markers = count_markers(sql);
    if markers != args.len() {
        return Err(OrmError::validation(format!(
            "`{sql}` has {markers} placeholder(s) but {} argument(s)",
            args.len()
        )));
    }
    Ok(())
}

/// A condition accepted by `filter`, `having` and join `ON` clauses.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// SQL text with `?` markers and their arguments.
    Raw { sql: String, args: Vec<Value> },
    /// A structured expression.
    Expr(Expr),
}

impl Condition {
    /// Create a raw condition.
    pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            args,
        }
    }

    /// Check if this condition contributes nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Raw { sql, .. } => sql.trim().is_empty(),
            Condition::Expr(expr) => expr.is_empty(),
        }
    }

    /// Check that a raw condition's markers match its arguments.
    pub fn validate(&self) -> OrmResult<()> {
        match self {
            Condition::Raw { sql, args } => check_markers(sql, args),
            Condition::Expr(_) => Ok(()),
        }
    }

    fn is_compound(&self) -> bool {
        match self {
            Condition::Raw { .. } => true,
            Condition::Expr(expr) => expr.is_compound(),
        }
    }

    /// Append this condition to `out`.
    pub fn write_to(&self, dialect: Dialect, out: &mut Sql) {
        match self {
            Condition::Raw { sql, args } => {
                out.append_template(sql, args);
            }
            Condition::Expr(expr) => expr.write_to(dialect, out),
        }
    }
}

impl From<Expr> for Condition {
    fn from(expr: Expr) -> Self {
        Condition::Expr(expr)
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Condition::raw(sql, Vec::new())
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Condition::raw(sql, Vec::new())
    }
}

/// An ordered list of conditions joined by `AND`.
///
/// With more than one live entry, raw and compound entries are parenthesized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExprGroup {
    conds: Vec<Condition>,
}

impl ExprGroup {
    /// Create a new empty group.
    pub fn new() -> Self {
        Self { conds: Vec::new() }
    }

    /// Check if the group renders nothing.
    pub fn is_empty(&self) -> bool {
        self.conds.iter().all(Condition::is_empty)
    }

    /// Add a condition to be ANDed.
    pub fn push(&mut self, cond: impl Into<Condition>) {
        self.conds.push(cond.into());
    }

    /// Add a condition after checking its markers.
    pub fn try_push(&mut self, cond: impl Into<Condition>) -> OrmResult<()> {
        let cond = cond.into();
        cond.validate()?;
        self.conds.push(cond);
        Ok(())
    }

    /// Conditions in insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conds
    }

    /// Append the group's content (without a keyword) to `out`.
    pub fn write_to(&self, dialect: Dialect, out: &mut Sql) {
        let live: Vec<&Condition> = self.conds.iter().filter(|c| !c.is_empty()).collect();
        let wrap = live.len() > 1;
        for (i, cond) in live.into_iter().enumerate() {
            if i > 0 {
                out.push(" AND ");
            }
            if wrap && cond.is_compound() {
                out.push("(");
                cond.write_to(dialect, out);
                out.push(")");
            } else {
                cond.write_to(dialect, out);
            }
        }
    }

    /// Append ` {keyword} <conditions>` to `out` unless the group is empty.
    pub(crate) fn write_clause(&self, keyword: &str, dialect: Dialect, out: &mut Sql) {
        if self.is_empty() {
            return;
        }
        out.push(keyword);
        self.write_to(dialect, out);
    }

    /// Compile to a standalone fragment and its arguments.
    pub fn compile(&self, dialect: Dialect) -> OrmResult<(String, Vec<Value>)> {
        let mut out = Sql::empty();
        self.write_to(dialect, &mut out);
        Ok(out.build(dialect)?.into_parts())
    }
}

/// Generates the WHERE helper methods shared by SELECT, UPDATE and DELETE.
///
/// The builder must have `where_group: ExprGroup` and `build_error: Option<String>` fields.
macro_rules! impl_where_methods {
    () => {
        /// Add a WHERE condition: a raw SQL string or an [`Expr`](crate::qb::Expr).
        ///
        /// Marker/argument mismatches in raw conditions are reported by `build`.
        pub fn filter(mut self, cond: impl Into<$crate::qb::Condition>) -> Self {
            if let Err(err) = self.where_group.try_push(cond) {
                self.build_error.get_or_insert(err.to_string());
            }
            self
        }

        /// Add a raw WHERE condition with `?` markers.
        pub fn where_sql(self, sql: &str, args: Vec<$crate::value::Value>) -> Self {
            self.filter($crate::qb::Condition::raw(sql, args))
        }

        /// Add an expression to the WHERE clause.
        pub fn where_expr(mut self, expr: $crate::qb::Expr) -> Self {
            self.where_group.push(expr);
            self
        }

        /// Add WHERE: column = value
        pub fn eq(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
            self.where_expr($crate::qb::Expr::eq(column, value))
        }

        /// Add WHERE: column <> value
        pub fn ne(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
            self.where_expr($crate::qb::Expr::ne(column, value))
        }

        /// Add WHERE: column > value
        pub fn gt(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
            self.where_expr($crate::qb::Expr::gt(column, value))
        }

        /// Add WHERE: column >= value
        pub fn gte(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
            self.where_expr($crate::qb::Expr::gte(column, value))
        }

        /// Add WHERE: column < value
        pub fn lt(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
            self.where_expr($crate::qb::Expr::lt(column, value))
        }

        /// Add WHERE: column <= value
        pub fn lte(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
            self.where_expr($crate::qb::Expr::lte(column, value))
        }

        /// Add WHERE: column LIKE pattern
        pub fn like(self, column: &str, pattern: impl Into<$crate::value::Value>) -> Self {
            self.where_expr($crate::qb::Expr::like(column, pattern))
        }

        /// Add WHERE: column IN (values...)
        pub fn in_list<T: Into<$crate::value::Value>>(
            self,
            column: &str,
            values: impl IntoIterator<Item = T>,
        ) -> Self {
            self.where_expr($crate::qb::Expr::in_list(column, values))
        }

        /// Add WHERE: column NOT IN (values...)
        pub fn not_in<T: Into<$crate::value::Value>>(
            self,
            column: &str,
            values: impl IntoIterator<Item = T>,
        ) -> Self {
            self.where_expr($crate::qb::Expr::not_in(column, values))
        }

        /// Add WHERE: column IS NULL
        pub fn is_null(self, column: &str) -> Self {
            self.where_expr($crate::qb::Expr::is_null(column))
        }

        /// Add WHERE: column IS NOT NULL
        pub fn is_not_null(self, column: &str) -> Self {
            self.where_expr($crate::qb::Expr::is_not_null(column))
        }

        /// Add WHERE: column BETWEEN from AND to
        pub fn between(
            self,
            column: &str,
            from: impl Into<$crate::value::Value>,
            to: impl Into<$crate::value::Value>,
        ) -> Self {
            self.where_expr($crate::qb::Expr::between(column, from, to))
        }

        /// Add WHERE: column = value when `value` is `Some`.
        pub fn eq_opt<T: Into<$crate::value::Value>>(self, column: &str, value: Option<T>) -> Self {
            match value {
                Some(v) => self.eq(column, v),
                None => self,
            }
        }
    };
}

pub(crate) use impl_where_methods;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    const PG: Dialect = Dialect::Postgres;

    #[test]
    fn simple_eq_quotes_column() {
        let (sql, args) = Expr::eq("name", "alice").compile(PG).unwrap();
        assert_eq!(sql, r#""name" = $1"#);
        assert_eq!(args, vec![Value::from("alice")]);
    }

    #[test]
    fn and_group() {
        let expr = Expr::and(vec![Expr::eq("status", "active"), Expr::gt("age", 18)]);
        let (sql, args) = expr.compile(PG).unwrap();
        assert_eq!(sql, r#""status" = $1 AND "age" > $2"#);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn nested_combinators_are_parenthesized() {
        let expr = Expr::and(vec![
            Expr::eq("status", "active"),
            Expr::or(vec![Expr::eq("role", "admin"), Expr::eq("role", "owner")]),
        ]);
        let (sql, _) = expr.compile(PG).unwrap();
        assert_eq!(sql, r#""status" = $1 AND ("role" = $2 OR "role" = $3)"#);

        let (sql, _) = expr.compile(Dialect::MySql).unwrap();
        assert_eq!(sql, "`status` = ? AND (`role` = ? OR `role` = ?)");
    }

    #[test]
    fn empty_children_are_skipped() {
        let expr = Expr::and(vec![
            Expr::or(vec![]),
            Expr::eq("id", 1),
            Expr::not(Expr::and(vec![])),
        ]);
        let (sql, args) = expr.compile(PG).unwrap();
        assert_eq!(sql, r#""id" = $1"#);
        assert_eq!(args.len(), 1);
        assert!(Expr::and(vec![Expr::or(vec![])]).is_empty());
        assert_eq!(Expr::or(vec![]).compile(PG).unwrap().0, "");
    }

    #[test]
    fn in_list_and_empty_lists() {
        let (sql, args) = Expr::in_list("id", [1, 2, 3]).compile(PG).unwrap();
        assert_eq!(sql, r#""id" IN ($1, $2, $3)"#);
        assert_eq!(args.len(), 3);

        assert_eq!(Expr::in_list("id", Vec::<i32>::new()).compile(PG).unwrap().0, "1=0");
        assert_eq!(Expr::not_in("id", Vec::<i32>::new()).compile(PG).unwrap().0, "1=1");
    }

    #[test]
    fn between_and_not() {
        let (sql, _) = Expr::between("age", 18, 65).compile(PG).unwrap();
        assert_eq!(sql, r#""age" BETWEEN $1 AND $2"#);

        let (sql, _) = Expr::not(Expr::eq("banned", true)).compile(PG).unwrap();
        assert_eq!(sql, r#"NOT ("banned" = $1)"#);
    }

    #[test]
    fn template_validates_at_construction() {
        let expr = Expr::template("a = ? OR b = ?", args![1, 2]).unwrap();
        assert_eq!(expr.compile(PG).unwrap().0, "a = $1 OR b = $2");
        assert!(Expr::template("a = ?", args![]).unwrap_err().is_validation());
    }

    #[test]
    fn group_parenthesizes_raw_entries() {
        let mut group = ExprGroup::new();
        group.push(Condition::raw("a = ? OR b = ?", args![1, 2]));
        group.push(Expr::is_null("deleted_at"));
        let (sql, args) = group.compile(PG).unwrap();
        assert_eq!(sql, r#"(a = $1 OR b = $2) AND "deleted_at" IS NULL"#);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn single_raw_entry_is_bare() {
        let mut group = ExprGroup::new();
        group.push(Condition::raw("status = ?", args![1]));
        assert_eq!(group.compile(PG).unwrap().0, "status = $1");
    }

    #[test]
    fn empty_group_renders_nothing() {
        let mut group = ExprGroup::new();
        group.push(Expr::and(vec![]));
        group.push("");
        assert!(group.is_empty());
        assert_eq!(group.compile(PG).unwrap(), (String::new(), vec![]));
    }

    #[test]
    fn try_push_rejects_mismatch() {
        let mut group = ExprGroup::new();
        let err = group
            .try_push(Condition::raw("a = ?", args![1, 2]))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(group.conditions().is_empty());
    }
}
