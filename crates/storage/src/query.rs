//! Minimal statement builders. Clauses are written with `?` markers and
//! rendered with the dialect's placeholders, numbered in clause order.

use rusqlite::types::Value as SqlValue;

use crate::dialect::Dialect;

pub fn text(s: impl AsRef<str>) -> SqlValue {
    SqlValue::Text(s.as_ref().to_string())
}

/// `LIKE` pattern matching `needle` anywhere, with `%`, `_` and `\` escaped.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Replace each `?` in `fragment` with the next numbered placeholder.
fn bind(dialect: &dyn Dialect, fragment: &str, next: &mut usize) -> String {
    let mut out = String::with_capacity(fragment.len() + 8);
    for c in fragment.chars() {
        if c == '?' {
            *next += 1;
            out.push_str(&dialect.placeholder(*next));
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Default, Clone)]
struct Conditions {
    clauses: Vec<String>,
    params: Vec<SqlValue>,
}

impl Conditions {
    fn eq(&mut self, column: &str, value: SqlValue) {
        self.clauses.push(format!("{column} = ?"));
        self.params.push(value);
    }

    /// Free-form clauses are always parenthesized so their operators bind
    /// inside the `AND` chain.
    fn expr(&mut self, expr: &str, params: Vec<SqlValue>) {
        self.clauses.push(format!("({expr})"));
        self.params.extend(params);
    }

    fn render(&self, dialect: &dyn Dialect, sql: &mut String, next: &mut usize) {
        if self.clauses.is_empty() {
            return;
        }
        sql.push_str(" WHERE ");
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            sql.push_str(&bind(dialect, clause, next));
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Select {
    options: Option<String>,
    columns: Vec<String>,
    from: String,
    joins: Vec<String>,
    conditions: Conditions,
    group_by: Option<String>,
    order_by: Vec<String>,
    limit: Option<u64>,
}

impl Select {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn from(mut self, table: &str) -> Self {
        self.from = table.to_string();
        self
    }

    /// Modifier placed right after `SELECT`, e.g. `DISTINCT`.
    pub fn options(mut self, options: String) -> Self {
        self.options = Some(options);
        self
    }

    pub fn join(mut self, join: String) -> Self {
        self.joins.push(join);
        self
    }

    pub fn where_eq(mut self, column: &str, value: SqlValue) -> Self {
        self.conditions.eq(column, value);
        self
    }

    pub fn where_expr(mut self, expr: &str, params: Vec<SqlValue>) -> Self {
        self.conditions.expr(expr, params);
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by = Some(column.to_string());
        self
    }

    pub fn order_by(mut self, clause: &str) -> Self {
        self.order_by.push(clause.to_string());
        self
    }

    /// Zero leaves the statement unbounded.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = (limit != 0).then_some(limit);
        self
    }

    pub fn build(&self, dialect: &dyn Dialect) -> (String, Vec<SqlValue>) {
        let mut sql = String::from("SELECT ");
        if let Some(options) = &self.options {
            sql.push_str(options);
            sql.push(' ');
        }
        sql.push_str(&self.columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.from);
        for join in &self.joins {
            sql.push_str(" JOIN ");
            sql.push_str(join);
        }
        let mut next = 0;
        self.conditions.render(dialect, &mut sql, &mut next);
        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        (sql, self.conditions.params.clone())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Insert {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    pub fn value(mut self, column: &str, value: SqlValue) -> Self {
        self.columns.push(column.to_string());
        self.values.push(value);
        self
    }

    pub fn build(&self, dialect: &dyn Dialect) -> (String, Vec<SqlValue>) {
        let placeholders: Vec<String> = (1..=self.values.len())
            .map(|n| dialect.placeholder(n))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            placeholders.join(", ")
        );
        (sql, self.values.clone())
    }
}

/// An `UPDATE` whose table is supplied at build time, so the same statement
/// can be run against the live and history tables.
#[derive(Debug, Default, Clone)]
pub struct Update {
    sets: Vec<String>,
    set_params: Vec<SqlValue>,
    conditions: Conditions,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &str, value: SqlValue) -> Self {
        self.sets.push(format!("{column} = ?"));
        self.set_params.push(value);
        self
    }

    pub fn set_expr(mut self, column: &str, expr: &str, params: Vec<SqlValue>) -> Self {
        self.sets.push(format!("{column} = {expr}"));
        self.set_params.extend(params);
        self
    }

    pub fn where_eq(mut self, column: &str, value: SqlValue) -> Self {
        self.conditions.eq(column, value);
        self
    }

    pub fn where_expr(mut self, expr: &str, params: Vec<SqlValue>) -> Self {
        self.conditions.expr(expr, params);
        self
    }

    pub fn build(&self, dialect: &dyn Dialect, table: &str) -> (String, Vec<SqlValue>) {
        let mut next = 0;
        let mut sql = format!("UPDATE {table} SET ");
        let sets: Vec<String> = self
            .sets
            .iter()
            .map(|set| bind(dialect, set, &mut next))
            .collect();
        sql.push_str(&sets.join(", "));
        self.conditions.render(dialect, &mut sql, &mut next);
        let mut params = self.set_params.clone();
        params.extend(self.conditions.params.iter().cloned());
        (sql, params)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Delete {
    table: String,
    conditions: Conditions,
}

impl Delete {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    pub fn where_eq(mut self, column: &str, value: SqlValue) -> Self {
        self.conditions.eq(column, value);
        self
    }

    pub fn where_expr(mut self, expr: &str, params: Vec<SqlValue>) -> Self {
        self.conditions.expr(expr, params);
        self
    }

    pub fn build(&self, dialect: &dyn Dialect) -> (String, Vec<SqlValue>) {
        let mut next = 0;
        let mut sql = format!("DELETE FROM {}", self.table);
        self.conditions.render(dialect, &mut sql, &mut next);
        (sql, self.conditions.params.clone())
    }
}
