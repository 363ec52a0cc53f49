//! Embedded SQLite backend, used for local runs and the test suite.

use super::{
    backend::{Backend, DatabaseKind},
    sql::Cell,
};
use crate::{config::SessionConfig, error::GenResult};
use rusqlite::{types::ValueRef, Connection, OpenFlags};

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`. URI filenames are
    /// accepted, so `file:name?mode=memory&cache=shared` lets several
    /// phase connections share one in-memory database.
    pub fn open(path: &str) -> GenResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }
}

impl Backend for SqliteBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    fn configure_session(&mut self, session: &SessionConfig) -> GenResult<()> {
        // Single-file database: there is no schema namespace to select.
        log::debug!("sqlite: ignoring schema '{}'", session.schema);
        let synchronous = if session.synchronous_commit { "NORMAL" } else { "OFF" };
        self.conn
            .execute_batch(&format!("PRAGMA synchronous = {synchronous};"))?;
        if let Some(kib) = session.work_mem_kib() {
            // Negative cache_size is a size in KiB rather than pages.
            self.conn
                .execute_batch(&format!("PRAGMA cache_size = -{kib};"))?;
        }
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> GenResult<u64> {
        let affected = self.conn.execute(sql, [])?;
        Ok(affected as u64)
    }

    fn execute_script(&mut self, sql: &str) -> GenResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query(&mut self, sql: &str) -> GenResult<Vec<Vec<Cell>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let width = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| {
                        Ok(match row.get_ref(i)? {
                            ValueRef::Null => Cell::Null,
                            ValueRef::Integer(v) => Cell::Int(v),
                            ValueRef::Real(v) => Cell::Real(v),
                            ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
                            ValueRef::Blob(b) => Cell::Text(hex::encode(b)),
                        })
                    })
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
