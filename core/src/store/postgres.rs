//! Postgres backend.
//!
//! The generator is strictly sequential, so the async driver runs on a
//! private current-thread runtime and every call blocks until the
//! database answers.

use super::{
    backend::{Backend, DatabaseKind},
    sql::{quote_ident, quote_literal, Cell},
};
use crate::{
    config::SessionConfig,
    error::{GenError, GenResult},
};
use sqlx::{postgres::PgRow, Column, Connection, Executor, PgConnection, Row, TypeInfo};
use tokio::runtime::Runtime;

pub struct PostgresBackend {
    runtime: Runtime,
    conn: PgConnection,
}

impl PostgresBackend {
    pub fn connect(url: &str) -> GenResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let conn = runtime.block_on(PgConnection::connect(url))?;
        log::info!("postgres: connection established");
        Ok(Self { runtime, conn })
    }
}

impl Backend for PostgresBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }

    fn configure_session(&mut self, session: &SessionConfig) -> GenResult<()> {
        let synchronous = if session.synchronous_commit { "ON" } else { "OFF" };
        let script = format!(
            "SET search_path TO {}; SET synchronous_commit TO {synchronous}; SET work_mem = {};",
            quote_ident(&session.schema),
            quote_literal(&session.work_mem),
        );
        self.execute_script(&script)
    }

    fn execute(&mut self, sql: &str) -> GenResult<u64> {
        let result = self
            .runtime
            .block_on(sqlx::query(sql).persistent(false).execute(&mut self.conn))?;
        Ok(result.rows_affected())
    }

    fn execute_script(&mut self, sql: &str) -> GenResult<()> {
        // A bare &str runs through the simple-query protocol, which
        // accepts several statements at once.
        self.runtime.block_on(self.conn.execute(sql))?;
        Ok(())
    }

    fn query(&mut self, sql: &str) -> GenResult<Vec<Vec<Cell>>> {
        let rows = self
            .runtime
            .block_on(sqlx::query(sql).persistent(false).fetch_all(&mut self.conn))?;
        rows.iter()
            .map(|row| {
                (0..row.columns().len())
                    .map(|i| decode_cell(row, i))
                    .collect::<GenResult<Vec<_>>>()
            })
            .collect()
    }
}

fn decode_cell(row: &PgRow, i: usize) -> GenResult<Cell> {
    let type_name = row.column(i).type_info().name().to_string();
    let cell = match type_name.as_str() {
        "INT2" => row.try_get::<Option<i16>, _>(i)?.map(|v| Cell::Int(v.into())),
        "INT4" => row.try_get::<Option<i32>, _>(i)?.map(|v| Cell::Int(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(i)?.map(Cell::Int),
        "FLOAT4" => row.try_get::<Option<f32>, _>(i)?.map(|v| Cell::Real(v.into())),
        "FLOAT8" => row.try_get::<Option<f64>, _>(i)?.map(Cell::Real),
        "BOOL" => row.try_get::<Option<bool>, _>(i)?.map(|v| Cell::Int(v.into())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row.try_get::<Option<String>, _>(i)?.map(Cell::Text),
        other => {
            return Err(GenError::UnexpectedValue {
                column: i,
                detail: format!("unsupported column type {other}; cast it in the query"),
            })
        }
    };
    Ok(cell.unwrap_or(Cell::Null))
}
