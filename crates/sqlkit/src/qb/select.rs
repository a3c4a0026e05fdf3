//! SELECT query builder.
//!
//! Compilation writes every clause into one [`Sql`] fragment in a fixed order:
//!
//! 1. `WITH [RECURSIVE]` definitions
//! 2. select list (columns, then raw select expressions)
//! 3. `FROM` table or subquery
//! 4. `JOIN`s
//! 5. `WHERE`
//! 6. `GROUP BY`
//! 7. `HAVING`
//! 8. `ORDER BY`
//! 9. `LIMIT` / `OFFSET` as literal integers
//!
//! With set operations, the statement above (minus its `WITH` header) becomes
//! `(A) UNION (B) ...` and the header is prefixed to the whole text.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::{render_column, render_order_item, render_table_ref};
use crate::qb::expr::{Condition, Expr, ExprGroup, impl_where_methods};
use crate::qb::traits::SqlQb;
use crate::sql::{Sql, count_markers};
use crate::statement::Statement;
use crate::value::Value;

/// JOIN flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => " INNER JOIN ",
            JoinKind::Left => " LEFT JOIN ",
            JoinKind::Right => " RIGHT JOIN ",
            JoinKind::Full => " FULL JOIN ",
            JoinKind::Cross => " CROSS JOIN ",
        }
    }
}

/// Set operation combining two SELECTs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOpKind {
    fn is_union(self) -> bool {
        matches!(self, SetOpKind::Union | SetOpKind::UnionAll)
    }

    fn keyword(self) -> &'static str {
        match self {
            SetOpKind::Union => " UNION ",
            SetOpKind::UnionAll => " UNION ALL ",
            SetOpKind::Intersect => " INTERSECT ",
            SetOpKind::Except => " EXCEPT ",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum FromSource {
    Table(String),
    Subquery { query: Box<SelectQb>, alias: String },
}

#[derive(Clone, Debug, PartialEq)]
struct Join {
    kind: JoinKind,
    table: String,
    on: Option<Condition>,
}

#[derive(Clone, Debug, PartialEq)]
struct Cte {
    name: String,
    columns: Vec<String>,
    query: SelectQb,
    recursive: bool,
}

/// SELECT query builder.
///
/// All clause methods consume and return the builder. Misuse that can be
/// detected when a call is made returns an error from that call; marker
/// mismatches in raw conditions are reported by [`SqlQb::build`].
#[must_use]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQb {
    /// CTE definitions, in declaration order
    ctes: Vec<Cte>,
    /// Plain select-list columns
    columns: Vec<String>,
    /// Select expressions with `?` markers
    select_exprs: Vec<(String, Vec<Value>)>,
    distinct: bool,
    from: Option<FromSource>,
    joins: Vec<Join>,
    /// WHERE conditions
    where_group: ExprGroup,
    group_by: Vec<String>,
    /// HAVING conditions
    having_group: ExprGroup,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    set_ops: Vec<(SetOpKind, SelectQb)>,
    /// First deferred construction error
    build_error: Option<String>,
}

impl SelectQb {
    /// Create a SELECT with the given columns and no FROM clause.
    ///
    /// An empty column list selects `*`.
    pub fn new(columns: &[&str]) -> Self {
        Self::default().columns(columns)
    }

    // ==================== SELECT list ====================

    /// Append select-list columns.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns.extend(
            columns
                .iter()
                .filter(|c| !c.trim().is_empty())
                .map(|c| c.to_string()),
        );
        self
    }

    /// Append one select-list column.
    pub fn column(self, column: &str) -> Self {
        self.columns(&[column])
    }

    /// Append a select expression whose `?` markers bind `args`.
    pub fn select_expr(mut self, sql: &str, args: Vec<Value>) -> Self {
        let markers = count_markers(sql);
        if markers != args.len() {
            self.build_error.get_or_insert(format!(
                "select expression `{sql}` has {markers} placeholder(s) but {} argument(s)",
                args.len()
            ));
            return self;
        }
        self.select_exprs.push((sql.to_string(), args));
        self
    }

    /// Toggle `SELECT DISTINCT`. The last call wins.
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    // ==================== FROM ====================

    /// Set the FROM table (`users`, `public.users`, `users u`).
    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(FromSource::Table(table.to_string()));
        self
    }

    /// Set the FROM table with an alias.
    pub fn from_as(self, table: &str, alias: &str) -> Self {
        self.from(&format!("{table} {alias}"))
    }

    /// Select from a subquery: `FROM (...) AS alias`.
    pub fn from_subquery(mut self, query: SelectQb, alias: &str) -> OrmResult<Self> {
        if alias.trim().is_empty() {
            return Err(OrmError::validation("subquery in FROM requires an alias"));
        }
        self.from = Some(FromSource::Subquery {
            query: Box::new(query),
            alias: alias.trim().to_string(),
        });
        Ok(self)
    }

    // ==================== JOIN ====================

    fn join(mut self, kind: JoinKind, table: &str, on: Option<Condition>) -> Self {
        if let Some(cond) = &on
            && let Err(err) = cond.validate()
        {
            self.build_error.get_or_insert(err.to_string());
        }
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            on,
        });
        self
    }

    /// Add an INNER JOIN.
    pub fn inner_join(self, table: &str, on: impl Into<Condition>) -> Self {
        self.join(JoinKind::Inner, table, Some(on.into()))
    }

    /// Add a LEFT JOIN.
    pub fn left_join(self, table: &str, on: impl Into<Condition>) -> Self {
        self.join(JoinKind::Left, table, Some(on.into()))
    }

    /// Add a RIGHT JOIN.
    pub fn right_join(self, table: &str, on: impl Into<Condition>) -> Self {
        self.join(JoinKind::Right, table, Some(on.into()))
    }

    /// Add a FULL JOIN.
    pub fn full_join(self, table: &str, on: impl Into<Condition>) -> Self {
        self.join(JoinKind::Full, table, Some(on.into()))
    }

    /// Add a CROSS JOIN (never has an ON clause).
    pub fn cross_join(self, table: &str) -> Self {
        self.join(JoinKind::Cross, table, None)
    }

    // ==================== WHERE ====================

    impl_where_methods!();

    // ==================== GROUP BY / HAVING ====================

    /// Append GROUP BY columns.
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by.extend(
            columns
                .iter()
                .filter(|c| !c.trim().is_empty())
                .map(|c| c.to_string()),
        );
        self
    }

    /// Add a raw HAVING condition with `?` markers.
    pub fn having(mut self, sql: &str, args: Vec<Value>) -> Self {
        if let Err(err) = self.having_group.try_push(Condition::raw(sql, args)) {
            self.build_error.get_or_insert(err.to_string());
        }
        self
    }

    /// Add an expression to the HAVING clause.
    pub fn having_expr(mut self, expr: Expr) -> Self {
        self.having_group.push(expr);
        self
    }

    // ==================== ORDER BY / LIMIT / OFFSET ====================

    /// Append an ORDER BY entry (`col`, `col DESC`, `COUNT(*) DESC`).
    ///
    /// Empty entries are ignored.
    pub fn order_by(mut self, entry: &str) -> Self {
        if !entry.trim().is_empty() {
            self.order_by.push(entry.to_string());
        }
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Set LIMIT/OFFSET for a 1-based page number.
    ///
    /// The offset saturates at `u64::MAX` for out-of-range page numbers.
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        self.limit(per_page).offset((page - 1).saturating_mul(per_page))
    }

    // ==================== CTE ====================

    fn push_cte(
        mut self,
        name: &str,
        columns: &[&str],
        query: SelectQb,
        recursive: bool,
    ) -> OrmResult<Self> {
        if name.trim().is_empty() {
            return Err(OrmError::validation("CTE requires a name"));
        }
        self.ctes.push(Cte {
            name: name.trim().to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            query,
            recursive,
        });
        Ok(self)
    }

    /// Add a CTE: `WITH name AS (query)`.
    pub fn with(self, name: &str, query: SelectQb) -> OrmResult<Self> {
        self.push_cte(name, &[], query, false)
    }

    /// Add a CTE with an explicit column list: `WITH name (a, b) AS (query)`.
    pub fn with_columns(self, name: &str, columns: &[&str], query: SelectQb) -> OrmResult<Self> {
        self.push_cte(name, columns, query, false)
    }

    /// Add a recursive CTE. The query must combine an anchor and a recursive
    /// member with UNION or UNION ALL.
    ///
    /// Members render parenthesized, which SQLite rejects inside compound
    /// selects; on [`Dialect::Sqlite`] write such statements with [`crate::sql()`].
    pub fn with_recursive(self, name: &str, columns: &[&str], query: SelectQb) -> OrmResult<Self> {
        let unions = query.set_ops.iter().all(|(kind, _)| kind.is_union());
        if query.set_ops.is_empty() || !unions {
            return Err(OrmError::validation(format!(
                "recursive CTE `{name}` requires UNION or UNION ALL"
            )));
        }
        self.push_cte(name, columns, query, true)
    }

    // ==================== Set operations ====================

    fn set_op(mut self, kind: SetOpKind, other: impl Into<Option<SelectQb>>) -> Self {
        if let Some(other) = other.into() {
            self.set_ops.push((kind, other));
        }
        self
    }

    /// `(self) UNION (other)`. `None` is a no-op.
    ///
    /// SQLite does not accept parenthesized compound members, so set
    /// operations built here fail to parse on [`Dialect::Sqlite`].
    pub fn union(self, other: impl Into<Option<SelectQb>>) -> Self {
        self.set_op(SetOpKind::Union, other)
    }

    /// `(self) UNION ALL (other)`. `None` is a no-op.
    pub fn union_all(self, other: impl Into<Option<SelectQb>>) -> Self {
        self.set_op(SetOpKind::UnionAll, other)
    }

    /// `(self) INTERSECT (other)`. `None` is a no-op.
    pub fn intersect(self, other: impl Into<Option<SelectQb>>) -> Self {
        self.set_op(SetOpKind::Intersect, other)
    }

    /// `(self) EXCEPT (other)`. `None` is a no-op.
    pub fn except(self, other: impl Into<Option<SelectQb>>) -> Self {
        self.set_op(SetOpKind::Except, other)
    }

    // ==================== Build helpers ====================

    fn check(&self) -> OrmResult<()> {
        if let Some(err) = &self.build_error {
            return Err(OrmError::Validation(err.clone()));
        }
        Ok(())
    }

    fn write_with(&self, dialect: Dialect, out: &mut Sql) -> OrmResult<()> {
        if self.ctes.is_empty() {
            return Ok(());
        }
        if self.ctes.iter().any(|c| c.recursive) {
            out.push("WITH RECURSIVE ");
        } else {
            out.push("WITH ");
        }
        for (i, cte) in self.ctes.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push_ident(dialect, &cte.name);
            if !cte.columns.is_empty() {
                out.push(" (");
                for (j, col) in cte.columns.iter().enumerate() {
                    if j > 0 {
                        out.push(", ");
                    }
                    out.push_ident(dialect, col);
                }
                out.push(")");
            }
            out.push(" AS (");
            cte.query.write_to(dialect, out)?;
            out.push(")");
        }
        out.push(" ");
        Ok(())
    }

    fn write_select_list(&self, dialect: Dialect, out: &mut Sql) {
        if self.columns.is_empty() && self.select_exprs.is_empty() {
            out.push("*");
            return;
        }
        let mut first = true;
        for col in &self.columns {
            if !first {
                out.push(", ");
            }
            first = false;
            out.push(&render_column(dialect, col));
        }
        for (sql, args) in &self.select_exprs {
            if !first {
                out.push(", ");
            }
            first = false;
            out.append_template(sql, args);
        }
    }

    /// One SELECT statement, without WITH header or set operations.
    fn write_single(&self, dialect: Dialect, out: &mut Sql) -> OrmResult<()> {
        out.push(if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        });
        self.write_select_list(dialect, out);
        self.write_from_onward(dialect, out)?;
        self.write_tail(dialect, out);
        Ok(())
    }

    /// FROM, JOIN, WHERE, GROUP BY and HAVING.
    fn write_from_onward(&self, dialect: Dialect, out: &mut Sql) -> OrmResult<()> {
        match &self.from {
            Some(FromSource::Table(table)) => {
                out.push(" FROM ");
                out.push(&render_table_ref(dialect, table));
            }
            Some(FromSource::Subquery { query, alias }) => {
                out.push(" FROM (");
                query.write_to(dialect, out)?;
                out.push(") AS ");
                out.push_ident(dialect, alias);
            }
            None => {}
        }

        for join in &self.joins {
            out.push(join.kind.keyword());
            out.push(&render_table_ref(dialect, &join.table));
            if join.kind != JoinKind::Cross
                && let Some(on) = join.on.as_ref().filter(|c| !c.is_empty())
            {
                out.push(" ON ");
                on.write_to(dialect, out);
            }
        }

        self.where_group.write_clause(" WHERE ", dialect, out);

        if !self.group_by.is_empty() {
            out.push(" GROUP BY ");
            for (i, col) in self.group_by.iter().enumerate() {
                if i > 0 {
                    out.push(", ");
                }
                out.push(&render_column(dialect, col));
            }
        }

        self.having_group.write_clause(" HAVING ", dialect, out);
        Ok(())
    }

    /// ORDER BY, LIMIT and OFFSET.
    fn write_tail(&self, dialect: Dialect, out: &mut Sql) {
        let items: Vec<String> = self
            .order_by
            .iter()
            .filter_map(|entry| render_order_item(dialect, entry))
            .collect();
        if !items.is_empty() {
            out.push(" ORDER BY ");
            out.push(&items.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), _) => {
                out.push(&format!(" LIMIT {limit}"));
            }
            (None, Some(_)) => {
                if let Some(unbounded) = dialect.unbounded_limit() {
                    out.push(" LIMIT ").push(unbounded);
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = self.offset {
            out.push(&format!(" OFFSET {offset}"));
        }
    }

    /// The statement body: a single SELECT or `(A) OP (B) ...`.
    fn write_body(&self, dialect: Dialect, out: &mut Sql) -> OrmResult<()> {
        if self.set_ops.is_empty() {
            return self.write_single(dialect, out);
        }
        out.push("(");
        self.write_single(dialect, out)?;
        out.push(")");
        for (kind, other) in &self.set_ops {
            out.push(kind.keyword());
            out.push("(");
            other.write_to(dialect, out)?;
            out.push(")");
        }
        Ok(())
    }

    /// Append the complete statement to `out`.
    pub(crate) fn write_to(&self, dialect: Dialect, out: &mut Sql) -> OrmResult<()> {
        self.check()?;
        self.write_with(dialect, out)?;
        self.write_body(dialect, out)
    }

    /// Whether counting must wrap the statement in a subquery.
    fn needs_count_subquery(&self) -> bool {
        self.distinct || !self.group_by.is_empty() || !self.set_ops.is_empty()
    }

    /// Build `SELECT COUNT(*)` over the rows this statement would return,
    /// ignoring ORDER BY, LIMIT and OFFSET.
    pub fn build_count(&self, dialect: Dialect) -> OrmResult<Statement> {
        let mut base = self.clone();
        base.order_by.clear();
        base.limit = None;
        base.offset = None;

        let mut out = Sql::empty();
        base.check()?;
        base.write_with(dialect, &mut out)?;
        if base.needs_count_subquery() {
            out.push("SELECT COUNT(*) FROM (");
            base.write_body(dialect, &mut out)?;
            out.push(") AS ");
            out.push_ident(dialect, "count_subquery");
        } else {
            out.push("SELECT COUNT(*)");
            base.write_from_onward(dialect, &mut out)?;
        }
        out.build(dialect)
    }
}

impl SqlQb for SelectQb {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        let mut out = Sql::empty();
        self.write_to(dialect, &mut out)?;
        out.build(dialect)
    }
}
