//! Dynamic SQL builder and the fragment representation shared by all compilers.
//!
//! `Sql` stores raw SQL pieces and parameter slots separately. Placeholder
//! tokens are only produced by [`Sql::render`], in a single left-to-right pass,
//! so nested subqueries, CTEs and set operations can be spliced together with
//! [`Sql::push_sql`] without tracking indices.
//!
//! # Example
//!
//! ```ignore
//! use sqlkit::{sql, Dialect};
//!
//! let mut q = sql("SELECT id, username FROM users WHERE 1=1");
//! if let Some(status) = status {
//!     q.push(" AND status = ").push_bind(status);
//! }
//! q.push(" ORDER BY created_at DESC");
//!
//! let stmt = q.build(Dialect::Postgres)?;
//! ```

mod builder;


pub use builder::Sql;

/// Start building a SQL statement.
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}

/// Count the `?` argument markers in a template (`??` is an escaped `?`).
pub(crate) fn count_markers(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '?' {
            if chars.peek() == Some(&'?') {
                chars.next();
            } else {
                count += 1;
            }
        }
    }
    count
}
