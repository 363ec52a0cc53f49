//! Literal SQL rendering shared by both backends.
//!
//! Bulk inserts are sent as multi-row `VALUES` lists with escaped
//! literals, so one statement text works unchanged on Postgres and
//! SQLite and no driver-specific parameter binding is needed.

use crate::{
    error::{GenError, GenResult},
    types::Money,
};
use chrono::NaiveDateTime;

/// Rows per INSERT statement. Keeps statement text bounded no matter
/// how large the caller's batch is.
pub const MAX_ROWS_PER_STATEMENT: usize = 1_000;

/// IDs per `IN (...)` list.
pub const MAX_IDS_PER_LOOKUP: usize = 5_000;

/// A value written into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Real(f64),
    Money(Money),
    Text(String),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Null,
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn render(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Real(v) => v.to_string(),
            Self::Money(m) => m.to_string(),
            Self::Text(s) => quote_literal(s),
            Self::Bool(true) => "TRUE".into(),
            Self::Bool(false) => "FALSE".into(),
            Self::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
            Self::Null => "NULL".into(),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Money> for SqlValue {
    fn from(m: Money) -> Self {
        Self::Money(m)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(ts: NaiveDateTime) -> Self {
        Self::Timestamp(ts)
    }
}

/// A value read back from a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Real(f64),
    Text(String),
    Null,
}

impl Cell {
    pub fn as_i64(&self, column: usize) -> GenResult<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(GenError::UnexpectedValue {
                column,
                detail: format!("expected integer, got {other:?}"),
            }),
        }
    }

    pub fn as_text(&self, column: usize) -> GenResult<String> {
        match self {
            Self::Text(s) => Ok(s.clone()),
            other => Err(GenError::UnexpectedValue {
                column,
                detail: format!("expected text, got {other:?}"),
            }),
        }
    }
}

pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Render `INSERT INTO table (cols) VALUES (...), (...) <tail>`.
pub fn insert_statement(table: &str, columns: &[&str], rows: &[Vec<SqlValue>], tail: &str) -> String {
    let values: Vec<String> = rows
        .iter()
        .map(|row| {
            debug_assert_eq!(row.len(), columns.len(), "row width mismatch for {table}");
            let cells: Vec<String> = row.iter().map(SqlValue::render).collect();
            format!("({})", cells.join(", "))
        })
        .collect();
    let mut sql = format!(
        "INSERT INTO {table} ({}) VALUES {}",
        columns.join(", "),
        values.join(", ")
    );
    if !tail.is_empty() {
        sql.push(' ');
        sql.push_str(tail);
    }
    sql
}

/// Render a comma-separated ID list for `IN (...)`.
pub fn id_list(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn renders_each_literal_kind() {
        let ts = NaiveDate::from_ymd_opt(2026, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        assert_eq!(SqlValue::Int(-3).render(), "-3");
        assert_eq!(SqlValue::Real(0.03).render(), "0.03");
        assert_eq!(SqlValue::Money(Money::from_cents(100_050)).render(), "1000.50");
        assert_eq!(SqlValue::text("O'Brien").render(), "'O''Brien'");
        assert_eq!(SqlValue::Bool(true).render(), "TRUE");
        assert_eq!(SqlValue::Timestamp(ts).render(), "'2026-03-04 05:06:07'");
        assert_eq!(SqlValue::Null.render(), "NULL");
    }

    #[test]
    fn builds_multi_row_insert() {
        let rows = vec![
            vec![SqlValue::Int(1), SqlValue::text("a")],
            vec![SqlValue::Int(2), SqlValue::text("b")],
        ];
        let sql = insert_statement("t", &["id", "name"], &rows, "ON CONFLICT DO NOTHING");
        assert_eq!(
            sql,
            "INSERT INTO t (id, name) VALUES (1, 'a'), (2, 'b') ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("yape_1_000_000"), "\"yape_1_000_000\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
