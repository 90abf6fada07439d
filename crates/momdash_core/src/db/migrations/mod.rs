//! Versioned schema for the document table.
//!
//! Versions are listed in ascending order; each entry runs once and bumps
//! `PRAGMA user_version` in the same transaction.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

const MIGRATIONS: &[(u32, &str)] = &[
    (1, include_str!("0001_documents.sql")),
    (2, include_str!("0002_document_order_index.sql")),
];

/// Newest schema version this build can write.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Schema version currently recorded in `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _)| *version > from)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        debug!("event=db_migrate_step module=db status=start version={version}");
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from} to_version={latest}");
    Ok(())
}
