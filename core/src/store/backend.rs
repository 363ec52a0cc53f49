//! Connection seam between the store and a concrete database driver.

use super::sql::Cell;
use crate::{
    config::SessionConfig,
    error::{GenError, GenResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
}

impl DatabaseKind {
    /// Classify a connection URL.
    ///
    /// `postgres://` and `postgresql://` select Postgres. `sqlite:` (prefix
    /// stripped), `file:` URIs, `:memory:` and `.db`/`.sqlite` paths select
    /// the embedded SQLite backend.
    pub fn detect(url: &str) -> GenResult<(Self, &str)> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok((Self::Postgres, url));
        }
        if let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
            return Ok((Self::Sqlite, path));
        }
        if url.starts_with("file:")
            || url == ":memory:"
            || url.ends_with(".db")
            || url.ends_with(".sqlite")
        {
            return Ok((Self::Sqlite, url));
        }
        Err(GenError::UnsupportedDatabaseUrl {
            url: url.to_string(),
        })
    }
}

/// The operations the store needs from a database connection.
///
/// RULE: statements arrive fully rendered (see `sql.rs`); backends never
/// rewrite SQL, they only run it and translate rows into `Cell`s.
pub trait Backend {
    fn kind(&self) -> DatabaseKind;

    /// Apply the per-session settings every phase connection needs.
    fn configure_session(&mut self, session: &SessionConfig) -> GenResult<()>;

    /// Run one statement, returning the affected row count.
    fn execute(&mut self, sql: &str) -> GenResult<u64>;

    /// Run several `;`-separated statements.
    fn execute_script(&mut self, sql: &str) -> GenResult<()>;

    /// Run one statement and collect every row it returns.
    fn query(&mut self, sql: &str) -> GenResult<Vec<Vec<Cell>>>;

    fn begin(&mut self) -> GenResult<()> {
        self.execute("BEGIN").map(|_| ())
    }

    fn commit(&mut self) -> GenResult<()> {
        self.execute("COMMIT").map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_backends_from_urls() {
        assert_eq!(
            DatabaseKind::detect("postgres://u:p@localhost:5434/yape").unwrap().0,
            DatabaseKind::Postgres
        );
        assert_eq!(
            DatabaseKind::detect("sqlite:run.db").unwrap(),
            (DatabaseKind::Sqlite, "run.db")
        );
        assert_eq!(
            DatabaseKind::detect("file:x?mode=memory&cache=shared").unwrap().0,
            DatabaseKind::Sqlite
        );
        assert!(matches!(
            DatabaseKind::detect("mysql://nope"),
            Err(GenError::UnsupportedDatabaseUrl { .. })
        ));
    }
}
