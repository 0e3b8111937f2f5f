//! # Dialect
//!
//! Every syntax difference between the supported engines lives behind the
//! [`Dialect`] trait, adding an engine means adding an implementation.

use std::{fmt, str::FromStr};

use dyntab_error::Result;

use crate::ColumnType;

pub trait Dialect: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    /// Type keyword of a column
    fn column_type(&self, ty: &ColumnType) -> String;

    /// Type keyword replacing `column_type` on an auto increment primary key
    fn auto_increment_type(&self, ty: &ColumnType) -> String;

    fn primary_key_clause(&self, auto_increment: bool) -> &'static str;

    /// Format raw default text as a literal of the column type
    fn default_literal(&self, ty: &ColumnType, raw: &str) -> Result<String> {
        let trimmed = raw.trim();
        match ty {
            ColumnType::Bool => match trimmed.to_lowercase().as_str() {
                "true" | "1" => Ok(self.bool_literal(true).into()),
                "false" | "0" => Ok(self.bool_literal(false).into()),
                _ => Err(dyntab_error::query_builder!(
                    "Invalid bool default `{}`",
                    raw
                )),
            },
            ColumnType::Int | ColumnType::BigInt => trimmed
                .parse::<i64>()
                .map(|v| v.to_string())
                .map_err(|_| dyntab_error::query_builder!("Invalid integer default `{}`", raw)),
            ColumnType::Float | ColumnType::Decimal => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|_| trimmed.to_string())
                .ok_or_else(|| dyntab_error::query_builder!("Invalid number default `{}`", raw)),
            ColumnType::Time => match trimmed.to_uppercase().as_str() {
                "CURRENT_TIMESTAMP" | "NOW" | "NOW()" => Ok("CURRENT_TIMESTAMP".into()),
                _ => Ok(quote_literal(raw)),
            },
            ColumnType::Date => match trimmed.to_uppercase().as_str() {
                "CURRENT_DATE" | "TODAY" => Ok("CURRENT_DATE".into()),
                _ => Ok(quote_literal(raw)),
            },
            ColumnType::Str(_) | ColumnType::Text | ColumnType::Json | ColumnType::Uuid => {
                Ok(quote_literal(raw))
            }
        }
    }

    fn bool_literal(&self, v: bool) -> &'static str;

    /// Rewrite `?` placeholders into the dialect's own syntax
    fn bind_placeholders(&self, sql: &str) -> String {
        sql.to_string()
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String>;

    /// Query returning one `name` row per column of the table bound to `?`
    fn table_columns_query(&self) -> &'static str;

    /// Query returning a row when the table bound to `?` exists
    fn table_exists_query(&self) -> &'static str;
}

pub fn quote_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    Sqlite,
    Postgres,
}

static SQLITE: Sqlite = Sqlite;
static POSTGRES: Postgres = Postgres;

impl DialectKind {
    /// Resolve the dialect from a connection url scheme
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split("://").next().unwrap_or_default();
        scheme.parse()
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            Self::Sqlite => &SQLITE,
            Self::Postgres => &POSTGRES,
        }
    }
}

impl FromStr for DialectKind {
    type Err = dyntab_error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(dyntab_error::config!("Unsupported dialect `{}`", s)),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Bool => "INTEGER".into(),
            ColumnType::Int => "INTEGER".into(),
            ColumnType::BigInt => "INTEGER".into(),
            ColumnType::Float => "REAL".into(),
            ColumnType::Decimal => "NUMERIC".into(),
            ColumnType::Str(_) => "TEXT".into(),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Time => "DATETIME".into(),
            ColumnType::Date => "DATE".into(),
            ColumnType::Json => "TEXT".into(),
            ColumnType::Uuid => "TEXT".into(),
        }
    }

    fn auto_increment_type(&self, _ty: &ColumnType) -> String {
        // AUTOINCREMENT is only accepted on an INTEGER PRIMARY KEY
        "INTEGER".into()
    }

    fn primary_key_clause(&self, auto_increment: bool) -> &'static str {
        if auto_increment {
            "PRIMARY KEY AUTOINCREMENT"
        } else {
            "PRIMARY KEY"
        }
    }

    fn bool_literal(&self, v: bool) -> &'static str {
        if v {
            "1"
        } else {
            "0"
        }
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (Some(l), Some(o)) => Some(format!("LIMIT {} OFFSET {}", l, o)),
            (Some(l), None) => Some(format!("LIMIT {}", l)),
            (None, Some(o)) => Some(format!("LIMIT -1 OFFSET {}", o)),
            (None, None) => None,
        }
    }

    fn table_columns_query(&self) -> &'static str {
        "SELECT name FROM pragma_table_info(?) ORDER BY cid"
    }

    fn table_exists_query(&self) -> &'static str {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Bool => "BOOLEAN".into(),
            ColumnType::Int => "INTEGER".into(),
            ColumnType::BigInt => "BIGINT".into(),
            ColumnType::Float => "DOUBLE PRECISION".into(),
            ColumnType::Decimal => "NUMERIC".into(),
            ColumnType::Str(len) => format!("VARCHAR({})", len.unwrap_or(255)),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Time => "TIMESTAMP".into(),
            ColumnType::Date => "DATE".into(),
            ColumnType::Json => "JSONB".into(),
            ColumnType::Uuid => "UUID".into(),
        }
    }

    fn auto_increment_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Int => "SERIAL".into(),
            _ => "BIGSERIAL".into(),
        }
    }

    fn primary_key_clause(&self, _auto_increment: bool) -> &'static str {
        "PRIMARY KEY"
    }

    fn bool_literal(&self, v: bool) -> &'static str {
        if v {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn bind_placeholders(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut index = 0;
        let mut in_quote = false;

        for c in sql.chars() {
            match c {
                '\'' => {
                    in_quote = !in_quote;
                    out.push(c);
                }
                '?' if !in_quote => {
                    index += 1;
                    out.push('$');
                    out.push_str(&index.to_string());
                }
                _ => out.push(c),
            }
        }

        out
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (Some(l), Some(o)) => Some(format!("LIMIT {} OFFSET {}", l, o)),
            (Some(l), None) => Some(format!("LIMIT {}", l)),
            (None, Some(o)) => Some(format!("OFFSET {}", o)),
            (None, None) => None,
        }
    }

    fn table_columns_query(&self) -> &'static str {
        "SELECT column_name AS name FROM information_schema.columns WHERE table_name = ? ORDER BY ordinal_position"
    }

    fn table_exists_query(&self) -> &'static str {
        "SELECT table_name AS name FROM information_schema.tables WHERE table_name = ?"
    }
}
