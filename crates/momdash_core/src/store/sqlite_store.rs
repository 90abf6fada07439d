//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist meeting documents as JSON bodies in the `documents` table.
//! - Merge partial updates into stored documents atomically.
//! - Publish a full snapshot to subscribers after every successful write,
//!   and after writes other connections commit to the same file.
//!
//! # Invariants
//! - Snapshots are ordered by `seq` (insertion order), never by update time.
//! - A partial update never touches fields absent from the patch.
//! - Snapshots are read and published under the connection lock, so
//!   subscribers see them in commit order.
//! - A failed snapshot read after a committed write is logged, not returned;
//!   the write itself already succeeded.

use crate::db::migrations::apply_migrations;
use crate::db::{open_db, open_db_in_memory};
use crate::model::meeting::{Meeting, MeetingFields, MeetingId, MeetingPatch};
use crate::store::feed::{Snapshot, SnapshotFeed, Subscription};
use crate::store::{normalize_collection, MeetingStore, StoreError, StoreResult};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

struct Handle {
    conn: Connection,
    /// Last `PRAGMA data_version` observed. It only moves when another
    /// connection commits.
    seen_version: i64,
}

/// Document store over one SQLite connection.
pub struct SqliteMeetingStore {
    handle: Mutex<Handle>,
    feed: SnapshotFeed,
}

impl SqliteMeetingStore {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_ready(open_db(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_ready(open_db_in_memory()?)
    }

    /// Wraps an existing connection, migrating it first.
    pub fn try_new(mut conn: Connection) -> StoreResult<Self> {
        apply_migrations(&mut conn)?;
        Self::from_ready(conn)
    }

    fn from_ready(conn: Connection) -> StoreResult<Self> {
        let seen_version = data_version(&conn)?;
        Ok(Self {
            handle: Mutex::new(Handle { conn, seen_version }),
            feed: SnapshotFeed::new(),
        })
    }

    /// Reads the current ordered contents of one collection.
    pub fn snapshot(&self, collection: &str) -> StoreResult<Snapshot> {
        let collection = normalize_collection(collection)?;
        load_snapshot(&self.handle().conn, collection)
    }

    /// Looks up one document.
    pub fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Meeting>> {
        let collection = normalize_collection(collection)?;
        let handle = self.handle();
        let body: Option<String> = handle
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|body| decode_meeting(id, &body)).transpose()
    }

    fn handle(&self) -> MutexGuard<'_, Handle> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the committed state of `collection`. Callers hold the lock.
    fn publish_locked(&self, conn: &Connection, collection: &str) {
        if !self.feed.has_subscribers(collection) {
            return;
        }
        match load_snapshot(conn, collection) {
            Ok(snapshot) => {
                self.feed.publish(collection, &snapshot);
            }
            Err(err) => {
                error!(
                    "event=feed_publish module=store status=error backend=sqlite collection={collection} error={err}"
                );
            }
        }
    }
}

impl MeetingStore for SqliteMeetingStore {
    fn subscribe(&self, collection: &str) -> StoreResult<Subscription> {
        let collection = normalize_collection(collection)?;
        let handle = self.handle();
        let initial = load_snapshot(&handle.conn, collection)?;
        Ok(self.feed.register(collection, initial))
    }

    fn refresh(&self, collection: &str) -> StoreResult<bool> {
        let collection = normalize_collection(collection)?;
        let mut handle = self.handle();
        let current = data_version(&handle.conn)?;
        if current == handle.seen_version {
            return Ok(false);
        }
        handle.seen_version = current;
        debug!(
            "event=store_refresh module=store status=ok backend=sqlite collection={collection} data_version={current}"
        );
        if !self.feed.has_subscribers(collection) {
            return Ok(false);
        }
        let snapshot = load_snapshot(&handle.conn, collection)?;
        self.feed.publish(collection, &snapshot);
        Ok(true)
    }

    fn insert(&self, collection: &str, fields: &MeetingFields) -> StoreResult<MeetingId> {
        let collection = normalize_collection(collection)?;
        let id = Uuid::new_v4().simple().to_string();
        let body = serde_json::to_string(fields)
            .map_err(|err| StoreError::InvalidData(format!("cannot encode document: {err}")))?;

        let handle = self.handle();
        handle.conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);",
            params![collection, id.as_str(), body],
        )?;
        self.publish_locked(&handle.conn, collection);
        drop(handle);

        info!("event=store_insert module=store status=ok backend=sqlite collection={collection} id={id}");
        Ok(id)
    }

    fn update_partial(
        &self,
        collection: &str,
        id: &str,
        patch: &MeetingPatch,
    ) -> StoreResult<()> {
        let collection = normalize_collection(collection)?;
        {
            let mut handle = self.handle();
            let tx = handle
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)?;
            let stored: Option<String> = tx
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
                    params![collection, id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(stored) = stored else {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            };

            let merged = merge_patch(&stored, patch)?;
            tx.execute(
                "UPDATE documents
                 SET
                    body = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE collection = ?1
                   AND id = ?2;",
                params![collection, id, merged],
            )?;
            tx.commit()?;
            self.publish_locked(&handle.conn, collection);
        }

        info!(
            "event=store_update module=store status=ok backend=sqlite collection={collection} id={id} fields={}",
            patch.field_names().join(",")
        );
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let collection = normalize_collection(collection)?;
        let handle = self.handle();
        let changed = handle.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection, id],
        )?;
        if changed > 0 {
            self.publish_locked(&handle.conn, collection);
        }
        drop(handle);

        info!(
            "event=store_delete module=store status=ok backend=sqlite collection={collection} id={id} removed={}",
            changed > 0
        );
        Ok(())
    }
}

fn data_version(conn: &Connection) -> StoreResult<i64> {
    Ok(conn.query_row("PRAGMA data_version;", [], |row| row.get(0))?)
}

fn load_snapshot(conn: &Connection, collection: &str) -> StoreResult<Snapshot> {
    let mut stmt = conn.prepare(
        "SELECT id, body
         FROM documents
         WHERE collection = ?1
         ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query([collection])?;
    let mut meetings = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get("id")?;
        let body: String = row.get("body")?;
        meetings.push(decode_meeting(&id, &body)?);
    }
    Ok(meetings)
}

fn decode_meeting(id: &str, body: &str) -> StoreResult<Meeting> {
    let fields: MeetingFields = serde_json::from_str(body).map_err(|err| {
        StoreError::InvalidData(format!("document `{id}` has invalid body: {err}"))
    })?;
    Ok(Meeting::from_fields(id, fields))
}

fn merge_patch(stored: &str, patch: &MeetingPatch) -> StoreResult<String> {
    let mut document: Map<String, Value> = serde_json::from_str(stored)
        .map_err(|err| StoreError::InvalidData(format!("stored body is not an object: {err}")))?;
    let changes = match serde_json::to_value(patch) {
        Ok(Value::Object(changes)) => changes,
        Ok(other) => {
            return Err(StoreError::InvalidData(format!(
                "patch encoded as non-object `{other}`"
            )))
        }
        Err(err) => {
            return Err(StoreError::InvalidData(format!(
                "cannot encode patch: {err}"
            )))
        }
    };
    document.extend(changes);
    serde_json::to_string(&document)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode document: {err}")))
}

#[cfg(test)]
mod tests {
    use super::merge_patch;
    use crate::model::meeting::MeetingPatch;
    use serde_json::Value;

    #[test]
    fn merge_patch_keeps_untouched_fields_and_unknown_keys() {
        let stored = r#"{"title":"Old","date":"2024-01-05","time":"09:00","content":"x","owner":"ops"}"#;
        let patch = MeetingPatch {
            title: Some("New".to_string()),
            ..MeetingPatch::default()
        };
        let merged: Value = serde_json::from_str(&merge_patch(stored, &patch).unwrap()).unwrap();
        assert_eq!(merged["title"], "New");
        assert_eq!(merged["content"], "x");
        assert_eq!(merged["owner"], "ops");
    }

    #[test]
    fn merge_patch_rejects_non_object_body() {
        assert!(merge_patch("[1,2]", &MeetingPatch::content("x")).is_err());
    }
}
