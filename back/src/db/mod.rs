//! SQLite connection bootstrap.
//!
//! Every connection handed out has `foreign_keys` enabled (completions rely on
//! `ON DELETE CASCADE`) and all migrations applied.

pub mod migrations;

use std::{path::Path, time::Duration};

use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let mut conn = Connection::open(path)?;
    bootstrap(&mut conn)?;

    info!(path = %path.display(), "opened database");

    Ok(conn)
}

pub fn open_db_in_memory() -> DbResult<Connection> {
    let mut conn = Connection::open_in_memory()?;
    bootstrap(&mut conn)?;
    Ok(conn)
}

fn bootstrap(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    migrations::apply_migrations(conn)
}
