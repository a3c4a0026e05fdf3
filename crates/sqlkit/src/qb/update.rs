//! UPDATE query builder using the unified expression layer.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::render_table_ref;
use crate::qb::expr::{ExprGroup, impl_where_methods};
use crate::qb::insert::SetField;
use crate::qb::traits::SqlQb;
use crate::qb::write_returning;
use crate::sql::Sql;
use crate::statement::Statement;
use crate::value::{Value, Values};
use std::collections::BTreeMap;

/// UPDATE query builder with expression-based WHERE.
///
/// Building without a WHERE clause fails unless [`UpdateQb::all_rows`] was called.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateQb {
    table: String,
    /// SET clauses, sorted by column
    set_fields: BTreeMap<String, SetField>,
    /// WHERE conditions
    where_group: ExprGroup,
    returning: Vec<String>,
    all_rows: bool,
    build_error: Option<String>,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            set_fields: BTreeMap::new(),
            where_group: ExprGroup::new(),
            returning: Vec::new(),
            all_rows: false,
            build_error: None,
        }
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set_fields
            .insert(column.to_string(), SetField::Value(value.into()));
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a raw SQL expression (e.g. `count + 1`).
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        self.set_fields
            .insert(column.to_string(), SetField::Raw(expr.to_string()));
        self
    }

    /// Set every column of a column → value map.
    pub fn values(mut self, values: Values) -> Self {
        for (column, value) in values {
            self.set_fields.insert(column, SetField::Value(value));
        }
        self
    }

    /// Allow an UPDATE without WHERE.
    pub fn all_rows(mut self) -> Self {
        self.all_rows = true;
        self
    }

    // ==================== WHERE conditions ====================

    impl_where_methods!();

    /// Add RETURNING columns. Not available on MySQL.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    fn validate(&self) -> OrmResult<()> {
        if let Some(err) = &self.build_error {
            return Err(OrmError::Validation(err.clone()));
        }
        if self.set_fields.is_empty() {
            return Err(OrmError::validation(format!(
                "UPDATE {} has no SET columns",
                self.table
            )));
        }
        if self.where_group.is_empty() && !self.all_rows {
            return Err(OrmError::validation(format!(
                "UPDATE {} without WHERE; call all_rows() to update every row",
                self.table
            )));
        }
        Ok(())
    }
}

impl SqlQb for UpdateQb {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        self.validate()?;
        let mut out = Sql::new("UPDATE ");
        out.push(&render_table_ref(dialect, &self.table));
        out.push(" SET ");
        for (i, (column, field)) in self.set_fields.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push_ident(dialect, column).push(" = ");
            field.write_to(&mut out);
        }
        self.where_group.write_clause(" WHERE ", dialect, &mut out);
        write_returning(&self.returning, dialect, &mut out)?;
        out.build(dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_params_precede_where_params() {
        let stmt = UpdateQb::new("users")
            .set("status", "inactive")
            .set_raw("updated_at", "now()")
            .eq("id", 42)
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"UPDATE "users" SET "status" = $1, "updated_at" = now() WHERE "id" = $2"#
        );
        assert_eq!(stmt.args(), &[Value::from("inactive"), Value::Int(42)]);
    }

    #[test]
    fn empty_set_is_rejected() {
        let err = UpdateQb::new("users").eq("id", 1).build(Dialect::Postgres).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn missing_where_requires_opt_in() {
        let qb = UpdateQb::new("users").set("active", false);
        assert!(qb.build(Dialect::Postgres).unwrap_err().is_validation());
        let stmt = qb.all_rows().build(Dialect::Sqlite).unwrap();
        assert_eq!(stmt.sql(), r#"UPDATE "users" SET "active" = ?"#);
    }

    #[test]
    fn returning_on_postgres() {
        let stmt = UpdateQb::new("users")
            .set("name", "b")
            .eq("id", 1)
            .returning(&["id", "name"])
            .build(Dialect::Postgres)
            .unwrap();
        assert!(stmt.sql().ends_with(r#"RETURNING "id", "name""#));
    }
}
