use super::count_markers;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::statement::Statement;
use crate::value::Value;

#[derive(Debug, Clone)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A parameter-safe dynamic SQL builder.
///
/// `Sql` stores SQL pieces and parameters separately and generates the
/// dialect's placeholders only when rendered.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
    tag: Option<String>,
    // First template whose markers did not match its arguments.
    template_error: Option<String>,
}

fn marker_mismatch(template: &str, markers: usize, args: usize) -> String {
    format!("`{template}` has {markers} placeholder(s) but {args} argument(s)")
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let initial = initial_sql.into();
        let parts = if initial.is_empty() {
            Vec::new()
        } else {
            vec![SqlPart::Raw(initial)]
        };
        Self {
            parts,
            params: Vec::new(),
            tag: None,
            template_error: None,
        }
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Associate a tag for logging.
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    /// Associate a tag for logging (consuming version).
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append a comma-separated list of placeholders and bind all values.
    ///
    /// If `values` is empty, this appends `NULL` (so `IN (NULL)` is valid SQL
    /// but never matches).
    pub fn push_bind_list<T: Into<Value>>(
        &mut self,
        values: impl IntoIterator<Item = T>,
    ) -> &mut Self {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };

        self.push_bind(first);
        for v in iter {
            self.push(", ");
            self.push_bind(v);
        }
        self
    }

    /// Append another `Sql` fragment, consuming it.
    ///
    /// The other fragment's parameters follow this fragment's parameters.
    pub fn push_sql(&mut self, mut other: Sql) -> &mut Self {
        for part in other.parts.drain(..) {
            match part {
                SqlPart::Raw(s) => {
                    self.push(&s);
                }
                SqlPart::Param => self.parts.push(SqlPart::Param),
            }
        }
        self.params.append(&mut other.params);
        if self.tag.is_none() {
            self.tag = other.tag;
        }
        if self.template_error.is_none() {
            self.template_error = other.template_error;
        }
        self
    }

    /// Append a quoted identifier part (no dotted splitting).
    pub fn push_ident(&mut self, dialect: Dialect, name: &str) -> &mut Self {
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => dialect.write_ident(last, name),
            _ => self.parts.push(SqlPart::Raw(dialect.quote_ident(name))),
        }
        self
    }

    /// Append a template whose `?` markers are bound to `args` in order.
    ///
    /// `??` renders a literal `?`. The marker count must equal `args.len()`.
    pub fn push_template(&mut self, template: &str, args: &[Value]) -> OrmResult<&mut Self> {
        let markers = count_markers(template);
        if markers != args.len() {
            return Err(OrmError::Validation(marker_mismatch(
                template,
                markers,
                args.len(),
            )));
        }
        Ok(self.append_template(template, args))
    }

    /// Like [`Sql::push_template`], but a count mismatch is recorded and
    /// reported by [`Sql::build`] instead of returned here.
    pub(crate) fn append_template(&mut self, template: &str, args: &[Value]) -> &mut Self {
        let markers = count_markers(template);
        if markers != args.len() && self.template_error.is_none() {
            self.template_error = Some(marker_mismatch(template, markers, args.len()));
        }
        let mut raw = String::new();
        let mut args = args.iter();
        let mut chars = template.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '?' {
                raw.push(ch);
                continue;
            }
            if chars.peek() == Some(&'?') {
                chars.next();
                raw.push('?');
                continue;
            }
            match args.next() {
                Some(value) => {
                    self.push(&raw);
                    raw.clear();
                    self.push_bind(value.clone());
                }
                None => raw.push('?'),
            }
        }
        self.push(&raw);
        self
    }

    /// Bind a parameter and return `self` (consuming version of [`Sql::push_bind`]).
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.push_bind(value);
        self
    }

    /// Whether no SQL text or parameters have been pushed.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of bound parameters.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Render SQL with the dialect's placeholders.
    pub fn render(&self, dialect: Dialect) -> String {
        let mut cap = 0;
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => cap += s.len(),
                SqlPart::Param => cap += 4,
            }
        }

        let mut out = String::with_capacity(cap);
        let mut idx = 0;
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    dialect.write_placeholder(&mut out, idx);
                }
            }
        }
        out
    }

    fn validate(&self) -> OrmResult<()> {
        if let Some(err) = &self.template_error {
            return Err(OrmError::Validation(err.clone()));
        }
        let placeholder_count = self
            .parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param))
            .count();

        if placeholder_count != self.params.len() {
            let params_len = self.params.len();
            return Err(OrmError::Validation(format!(
                "Sql: placeholders({placeholder_count}) != params({params_len})"
            )));
        }
        Ok(())
    }

    /// Render into an immutable [`Statement`].
    pub fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        self.validate()?;
        let stmt = Statement::new(self.render(dialect), self.params.clone());
        Ok(match &self.tag {
            Some(tag) => stmt.tagged(tag.clone()),
            None => stmt,
        })
    }
}

impl crate::qb::SqlQb for Sql {
    fn build(&self, dialect: Dialect) -> OrmResult<Statement> {
        Sql::build(self, dialect)
    }
}
