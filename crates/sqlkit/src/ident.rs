//! Identifier rendering for column lists, table references and ORDER BY items.
//!
//! Builders accept identifiers as plain strings. Simple names are quoted for the
//! target dialect; anything that already looks like an expression is emitted
//! as written:
//!
//! | Input              | Postgres output        |
//! |--------------------|------------------------|
//! | `*`                | `*`                    |
//! | `id`               | `"id"`                 |
//! | `u.id`             | `"u"."id"`             |
//! | `u.*`              | `"u".*`                |
//! | `COUNT(*)`         | `COUNT(*)`             |
//! | `name AS n`        | `name AS n`            |
//! | `users u`          | `"users" AS "u"` (table reference) |

use crate::dialect::Dialect;

/// Whether a fragment must be emitted verbatim rather than quoted.
fn is_expression(s: &str) -> bool {
    s.contains('(') || s.contains('"') || s.contains('`') || s.chars().any(char::is_whitespace)
}

fn write_dotted(out: &mut String, dialect: Dialect, name: &str) {
    for (i, part) in name.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        if part == "*" {
            out.push('*');
        } else {
            dialect.write_ident(out, part);
        }
    }
}

/// Append a select-list or comparison column to `out`.
pub fn write_column(out: &mut String, dialect: Dialect, col: &str) {
    let col = col.trim();
    if col == "*" || is_expression(col) {
        out.push_str(col);
    } else if !col.is_empty() {
        write_dotted(out, dialect, col);
    }
}

/// Render a select-list or comparison column.
pub fn render_column(dialect: Dialect, col: &str) -> String {
    let mut out = String::with_capacity(col.len() + 4);
    write_column(&mut out, dialect, col);
    out
}

/// Render a table reference: `users`, `public.users`, `users u` or `users AS u`.
///
/// Other shapes (subquery text, quoted names, more tokens) are emitted verbatim.
pub fn render_table_ref(dialect: Dialect, table: &str) -> String {
    let table = table.trim();
    if table.contains('(') || table.contains('"') || table.contains('`') {
        return table.to_string();
    }

    let tokens: Vec<&str> = table.split_whitespace().collect();
    let (name, alias) = match tokens.as_slice() {
        [] => return String::new(),
        [name] => (*name, None),
        [name, alias] => (*name, Some(*alias)),
        [name, kw, alias] if kw.eq_ignore_ascii_case("AS") => (*name, Some(*alias)),
        _ => return table.to_string(),
    };

    let mut out = String::with_capacity(table.len() + 8);
    write_dotted(&mut out, dialect, name);
    if let Some(alias) = alias {
        out.push_str(" AS ");
        dialect.write_ident(&mut out, alias);
    }
    out
}

fn direction(token: &str) -> Option<&'static str> {
    if token.eq_ignore_ascii_case("ASC") {
        Some("ASC")
    } else if token.eq_ignore_ascii_case("DESC") {
        Some("DESC")
    } else {
        None
    }
}

/// Render one ORDER BY entry.
///
/// - an empty entry yields `None` and is dropped by the caller
/// - `col` / `col asc` / `col DESC`: the column is quoted and a valid
///   direction is normalized to upper case; any other second token is ignored
/// - an entry containing a function call is kept verbatim, except that a
///   trailing direction is normalized
pub fn render_order_item(dialect: Dialect, entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    if entry.contains('(') {
        if let Some((head, tail)) = entry.rsplit_once(char::is_whitespace)
            && let Some(dir) = direction(tail)
        {
            return Some(format!("{} {dir}", head.trim_end()));
        }
        return Some(entry.to_string());
    }

    let mut tokens = entry.split_whitespace();
    let column = tokens.next()?;
    let mut out = render_column(dialect, column);
    if let Some(dir) = tokens.next().and_then(direction) {
        out.push(' ');
        out.push_str(dir);
    }
    Some(out)
}
