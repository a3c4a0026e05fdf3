//! Insert-or-update on conflict.
//!
//! | Dialect           | Do nothing                         | Update                                      |
//! |-------------------|------------------------------------|---------------------------------------------|
//! | Postgres, SQLite  | `ON CONFLICT (k) DO NOTHING`       | `ON CONFLICT (k) DO UPDATE SET c = EXCLUDED.c` |
//! | MySQL             | `ON DUPLICATE KEY UPDATE k = k`    | `ON DUPLICATE KEY UPDATE c = VALUES(c)`     |

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::qb::insert::InsertQb;
use crate::qb::traits::SqlQb;
use crate::qb::write_returning;
use crate::sql::Sql;
use crate::statement::Statement;
use crate::value::Values;

/// What to do when the insert hits a conflict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConflictAction {
    /// Keep the existing row.
    DoNothing,
    /// Overwrite these columns; `None` means every inserted non-conflict column.
    DoUpdate(Option<Vec<String>>),
}

/// UPSERT builder.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct UpsertQb {
    insert: InsertQb,
    conflict: Vec<String>,
    action: ConflictAction,
}

impl UpsertQb {
    /// Create an upsert inserting `values` into `table`.
    pub fn new(table: &str, values: Values) -> Self {
        Self::from_insert(InsertQb::new(table).values(values))
    }

    pub(crate) fn from_insert(insert: InsertQb) -> Self {
        Self {
            insert,
            conflict: Vec::new(),
            action: ConflictAction::DoUpdate(None),
        }
    }

    /// Conflict target columns.
    pub fn on_conflict(mut self, columns: &[&str]) -> Self {
        self.conflict = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Keep the existing row on conflict.
    pub fn do_nothing(mut self) -> Self {
        self.action = ConflictAction::DoNothing;
        self
    }

    /// Overwrite every inserted column except the conflict target.
    pub fn do_update(mut self) -> Self {
        self.action = ConflictAction::DoUpdate(None);
        self
    }

    /// Overwrite only `columns`.
    pub fn do_update_columns(mut self, columns: &[&str]) -> Self {
        self.action = ConflictAction::DoUpdate(Some(columns.iter().map(|c| c.to_string()).collect()));
        self
    }

    /// Add RETURNING columns. Not available on MySQL.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.insert = self.insert.returning(columns);
        self
    }

    /// Columns overwritten on conflict. Empty means "do nothing".
    pub fn update_columns(&self) -> Vec<String> {
        match &self.action {
            ConflictAction::DoNothing => Vec::new(),
            ConflictAction::DoUpdate(Some(columns)) => columns.clone(),
            ConflictAction::DoUpdate(None) => self
                .insert
                .column_names()
                .filter(|c| !self.conflict.iter().any(|k| k == c))
                .map(str::to_string)
                .collect(),
        }
    }

    fn write_conflict(&self, dialect: Dialect, out: &mut Sql) {
        let update = self.update_columns();
        match dialect {
            Dialect::Postgres | Dialect::Sqlite => {
                out.push(" ON CONFLICT (");
                for (i, col) in self.conflict.iter().enumerate() {
                    if i > 0 {
                        out.push(", ");
                    }
                    out.push_ident(dialect, col);
                }
                out.push(")");
                if update.is_empty() {
                    out.push(" DO NOTHING");
                    return;
                }
                out.push(" DO UPDATE SET ");
                for (i, col) in update.iter().enumerate() {
                    if i > 0 {
                        out.push(", ");
                    }
                    out.push_ident(dialect, col)
                        .push(" = EXCLUDED.")
                        .push_ident(dialect, col);
                }
            }
            Dialect::MySql => {
                out.push(" ON DUPLICATE KEY UPDATE ");
                if update.is_empty() {
                    let key = &self.conflict[0];
                    out.push_ident(dialect, key).push(" = ").push_ident(dialect, key);
                    return;
                }
                for (i, col) in update.iter().enumerate() {
                    if i > 0 {
                        out.push(", ");
                    }
                    out.push_ident(dialect, col)
                        .push(" = VALUES(")
                        .push_ident(dialect, col)
                        .push(")");
                }
            }
        }
    }
}

impl SqlQb for UpsertQb {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        if self.conflict.is_empty() {
            return Err(OrmError::validation("upsert requires conflict target columns"));
        }
        let mut out = Sql::empty();
        self.insert.write_base(dialect, &mut out);
        self.write_conflict(dialect, &mut out);
        write_returning(self.insert.returning_columns(), dialect, &mut out)?;
        out.build(dialect)
    }
}
