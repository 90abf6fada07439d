//! Connection bootstrap.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a database file, creating it and its parent directory if needed.
///
/// File databases run in WAL mode so a UI session and the CLI can read the
/// same file while the other writes.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    let result = ensure_parent_dir(path)
        .and_then(|()| Connection::open(path).map_err(DbError::from))
        .and_then(|conn| prepare(conn, true));
    log_open("file", started_at, &result);
    result
}

/// Opens a private in-memory database with the current schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|conn| prepare(conn, false));
    log_open("memory", started_at, &result);
    result
}

fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn prepare(mut conn: Connection, wal: bool) -> DbResult<Connection> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if wal {
        // journal_mode returns the resulting mode as a row.
        conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
    }
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn log_open(mode: &str, started_at: Instant, result: &DbResult<Connection>) {
    let elapsed_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={elapsed_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={elapsed_ms} error={err}"
        ),
    }
}
