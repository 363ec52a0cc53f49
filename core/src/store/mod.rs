//! Persistence layer over the external wallet schema.
//!
//! RULE: Only the store talks to the database.
//! Phases call store methods; they never execute SQL directly.

mod actor;
mod backend;
mod feature;
mod notification;
mod postgres;
pub mod sql;
mod sqlite;
mod transaction;
mod wallet;

pub use backend::{Backend, DatabaseKind};
pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;

use crate::{config::SessionConfig, error::GenResult};
use sql::{insert_statement, Cell, SqlValue, MAX_ROWS_PER_STATEMENT};

pub struct WalletStore {
    backend: Box<dyn Backend>,
    url: String,
    session: SessionConfig,
}

impl WalletStore {
    /// Open a connection for `url` and apply the session settings.
    pub fn connect(url: &str, session: &SessionConfig) -> GenResult<Self> {
        let (kind, target) = DatabaseKind::detect(url)?;
        let backend: Box<dyn Backend> = match kind {
            DatabaseKind::Postgres => Box::new(PostgresBackend::connect(target)?),
            DatabaseKind::Sqlite => Box::new(SqliteBackend::open(target)?),
        };
        let mut store = Self {
            backend,
            url: url.to_string(),
            session: session.clone(),
        };
        store.backend.configure_session(session)?;
        Ok(store)
    }

    /// Open a fresh connection to the same database with the same
    /// session settings. Every phase runs on its own connection.
    pub fn reopen(&self) -> GenResult<Self> {
        Self::connect(&self.url, &self.session)
    }

    pub fn kind(&self) -> DatabaseKind {
        self.backend.kind()
    }

    // ── Transactions ───────────────────────────────────────────

    pub fn begin(&mut self) -> GenResult<()> {
        self.backend.begin()
    }

    pub fn commit(&mut self) -> GenResult<()> {
        self.backend.commit()
    }

    /// Run `body` inside one database transaction.
    /// On error the connection is left mid-transaction and the caller
    /// aborts the run, so uncommitted rows are discarded with it.
    pub fn in_transaction<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> GenResult<T>,
    ) -> GenResult<T> {
        self.begin()?;
        let value = body(self)?;
        self.commit()?;
        Ok(value)
    }

    // ── Raw access ─────────────────────────────────────────────

    /// Run a multi-statement script (fixtures and maintenance).
    pub fn execute_script(&mut self, sql: &str) -> GenResult<()> {
        self.backend.execute_script(sql)
    }

    /// Run an ad-hoc read query. Used by tests and diagnostics;
    /// phases go through the typed methods.
    pub fn query(&mut self, sql: &str) -> GenResult<Vec<Vec<Cell>>> {
        self.backend.query(sql)
    }

    pub fn count_rows(&mut self, table: &str) -> GenResult<i64> {
        self.scalar_i64(&format!("SELECT COUNT(*) FROM {table}"))
    }

    // ── Helpers shared by the per-table modules ────────────────

    fn scalar_i64(&mut self, sql: &str) -> GenResult<i64> {
        let rows = self.backend.query(sql)?;
        match rows.first().and_then(|r| r.first()) {
            Some(Cell::Null) | None => Ok(0),
            Some(cell) => cell.as_i64(0),
        }
    }

    fn id_column(&mut self, sql: &str) -> GenResult<Vec<i64>> {
        self.backend
            .query(sql)?
            .iter()
            .map(|row| row[0].as_i64(0))
            .collect()
    }

    fn id_pairs(&mut self, sql: &str) -> GenResult<Vec<(i64, i64)>> {
        self.backend
            .query(sql)?
            .iter()
            .map(|row| Ok((row[0].as_i64(0)?, row[1].as_i64(1)?)))
            .collect()
    }

    /// Multi-row insert, split into statements of at most
    /// `MAX_ROWS_PER_STATEMENT` rows. Returns the affected row count.
    fn insert_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
        tail: &str,
    ) -> GenResult<u64> {
        let mut affected = 0;
        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            affected += self
                .backend
                .execute(&insert_statement(table, columns, chunk, tail))?;
        }
        Ok(affected)
    }

    /// Multi-row insert with a `RETURNING` clause; returned rows are
    /// concatenated across statements.
    fn insert_rows_returning(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
        returning: &str,
    ) -> GenResult<Vec<Vec<Cell>>> {
        let mut out = Vec::with_capacity(rows.len());
        let tail = format!("RETURNING {returning}");
        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            out.extend(
                self.backend
                    .query(&insert_statement(table, columns, chunk, &tail))?,
            );
        }
        Ok(out)
    }

    /// Insert rows whose serial key is assigned by the database and
    /// return the new keys in ascending order, which is the order the
    /// rows were listed in.
    fn insert_rows_returning_ids(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
        key: &str,
    ) -> GenResult<Vec<i64>> {
        let mut ids = self
            .insert_rows_returning(table, columns, rows, key)?
            .iter()
            .map(|row| row[0].as_i64(0))
            .collect::<GenResult<Vec<_>>>()?;
        ids.sort_unstable();
        Ok(ids)
    }
}
