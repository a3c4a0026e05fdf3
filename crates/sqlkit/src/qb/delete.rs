//! DELETE query builder using the unified expression layer.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::render_table_ref;
use crate::qb::expr::{ExprGroup, impl_where_methods};
use crate::qb::traits::SqlQb;
use crate::qb::write_returning;
use crate::sql::Sql;
use crate::statement::Statement;

/// DELETE query builder.
///
/// Building without a WHERE clause fails unless [`DeleteQb::all_rows`] was called.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteQb {
    table: String,
    /// WHERE conditions
    where_group: ExprGroup,
    returning: Vec<String>,
    all_rows: bool,
    build_error: Option<String>,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            where_group: ExprGroup::new(),
            returning: Vec::new(),
            all_rows: false,
            build_error: None,
        }
    }

    /// Allow a DELETE without WHERE.
    pub fn all_rows(mut self) -> Self {
        self.all_rows = true;
        self
    }

    impl_where_methods!();

    /// Add RETURNING columns. Not available on MySQL.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning.extend(columns.iter().map(|c| c.to_string()));
        self
    }
}

impl SqlQb for DeleteQb {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        if let Some(err) = &self.build_error {
            return Err(OrmError::Validation(err.clone()));
        }
        if self.where_group.is_empty() && !self.all_rows {
            return Err(OrmError::validation(format!(
                "DELETE FROM {} without WHERE; call all_rows() to delete every row",
                self.table
            )));
        }
        let mut out = Sql::new("DELETE FROM ");
        out.push(&render_table_ref(dialect, &self.table));
        self.where_group.write_clause(" WHERE ", dialect, &mut out);
        write_returning(&self.returning, dialect, &mut out)?;
        out.build(dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::error::OrmError;

    #[test]
    fn delete_with_where() {
        let stmt = DeleteQb::new("sessions")
            .where_sql("expires_at < ?", args!["2024-01-01"])
            .in_list("user_id", [1, 2])
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"DELETE FROM "sessions" WHERE (expires_at < $1) AND "user_id" IN ($2, $3)"#
        );
        assert_eq!(stmt.args().len(), 3);
    }

    #[test]
    fn delete_all_requires_opt_in() {
        let qb = DeleteQb::new("sessions");
        assert!(qb.build(Dialect::Postgres).unwrap_err().is_validation());
        assert_eq!(
            qb.all_rows().to_sql(Dialect::MySql).unwrap(),
            "DELETE FROM `sessions`"
        );
    }

    #[test]
    fn returning_unsupported_on_mysql() {
        let err = DeleteQb::new("sessions")
            .eq("id", 1)
            .returning(&["id"])
            .build(Dialect::MySql)
            .unwrap_err();
        assert!(matches!(err, OrmError::Unsupported { .. }));
    }
}
