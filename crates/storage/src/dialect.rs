//! SQL fragments that differ between backends.
//!
//! One [`Dialect`] is chosen from the configured [`DbType`] when a store is
//! opened; query code asks it for fragments instead of branching on the
//! backend itself.

use std::fmt;
use std::str::FromStr;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbType {
    #[default]
    Sqlite,
    Postgres,
    Mysql,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite3",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite3" | "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            other => Err(StorageError::UnsupportedDialect(other.to_string())),
        }
    }
}

/// Where and how the embedded `contentOrder` list is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentOrderRewrite {
    /// Right-hand side of `SET fields = ...`; binds (old, new).
    pub set_expr: &'static str,
    /// Expression matched with `LIKE` against the old id.
    pub match_target: &'static str,
}

pub trait Dialect: Send + Sync {
    fn db_type(&self) -> DbType;

    /// Bind marker for the 1-based parameter `n`.
    fn placeholder(&self, n: usize) -> String;

    fn escape_field(&self, name: &str) -> String;

    /// Select `column` formatted as a comparable timestamp string, aliased.
    fn timestamp_to_char(&self, column: &str, alias: &str) -> String;

    /// Truthy when `fields.isTemplate` is set.
    fn is_template_filter(&self) -> &'static str;

    /// Select modifier that collapses rows sharing `column`.
    fn distinct(&self, column: &str) -> String;

    fn content_order_rewrite(&self) -> ContentOrderRewrite;

    /// Suffix making backslash the escape character of a `LIKE` pattern.
    fn like_escape(&self) -> &'static str {
        ""
    }

    /// `fields` as text, comparable with a bound string.
    fn fields_text(&self) -> &'static str {
        "fields"
    }

    /// History column ordering rows that share an `insert_at`, if the
    /// schema has one.
    fn history_tiebreak(&self) -> Option<&'static str> {
        None
    }
}

pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn db_type(&self) -> DbType {
        DbType::Sqlite
    }

    fn placeholder(&self, n: usize) -> String {
        format!("?{n}")
    }

    fn escape_field(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    fn timestamp_to_char(&self, column: &str, alias: &str) -> String {
        format!("{column} AS {alias}")
    }

    fn is_template_filter(&self) -> &'static str {
        "json_extract(fields, '$.isTemplate')"
    }

    fn distinct(&self, _column: &str) -> String {
        "DISTINCT".to_string()
    }

    fn content_order_rewrite(&self) -> ContentOrderRewrite {
        ContentOrderRewrite {
            set_expr: "REPLACE(fields, ?, ?)",
            match_target: "json_extract(fields, '$.contentOrder')",
        }
    }

    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    fn history_tiebreak(&self) -> Option<&'static str> {
        Some("seq")
    }
}

pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn db_type(&self) -> DbType {
        DbType::Postgres
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${n}")
    }

    fn escape_field(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    fn timestamp_to_char(&self, column: &str, alias: &str) -> String {
        format!("to_char({column}, 'YYYY-MM-DD HH:MI:SS.MS') AS {alias}")
    }

    fn is_template_filter(&self) -> &'static str {
        "(fields->'isTemplate')::text::boolean"
    }

    fn distinct(&self, column: &str) -> String {
        format!("DISTINCT ON ({column})")
    }

    fn content_order_rewrite(&self) -> ContentOrderRewrite {
        ContentOrderRewrite {
            set_expr: "REPLACE(fields::text, ?, ?)::json",
            match_target: "fields->>'contentOrder'",
        }
    }

    fn fields_text(&self) -> &'static str {
        "fields::text"
    }
}

pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn db_type(&self) -> DbType {
        DbType::Mysql
    }

    fn placeholder(&self, _n: usize) -> String {
        "?".to_string()
    }

    fn escape_field(&self, name: &str) -> String {
        format!("`{name}`")
    }

    fn timestamp_to_char(&self, column: &str, alias: &str) -> String {
        format!("date_format({column}, '%Y-%m-%d %H:%i:%S') AS {alias}")
    }

    fn is_template_filter(&self) -> &'static str {
        "json_extract(fields, '$.isTemplate')"
    }

    fn distinct(&self, _column: &str) -> String {
        "DISTINCT".to_string()
    }

    fn content_order_rewrite(&self) -> ContentOrderRewrite {
        ContentOrderRewrite {
            set_expr: "REPLACE(fields, ?, ?)",
            match_target: "json_extract(fields, '$.contentOrder')",
        }
    }
}

pub fn for_db_type(db_type: DbType) -> Box<dyn Dialect> {
    match db_type {
        DbType::Sqlite => Box::new(SqliteDialect),
        DbType::Postgres => Box::new(PostgresDialect),
        DbType::Mysql => Box::new(MysqlDialect),
    }
}
