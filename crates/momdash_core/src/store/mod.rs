//! Remote document store contract and implementations.
//!
//! # Responsibility
//! - Define the four store operations the dashboard depends on
//!   (`subscribe`, `insert`, `update_partial`, `delete`).
//! - Deliver collection changes as full snapshots over a channel so the
//!   controller stays decoupled from any concrete backend.
//!
//! # Invariants
//! - Every successful write is followed by a snapshot to all subscribers of
//!   the written collection.
//! - Snapshots are complete and ordered by insertion.
//! - Store errors are returned to callers, never swallowed here.

pub mod feed;
pub mod memory_store;
pub mod sqlite_store;

use crate::db::DbError;
use crate::model::meeting::{MeetingFields, MeetingId, MeetingPatch};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub use feed::{Snapshot, SnapshotFeed, Subscription};
pub use memory_store::InMemoryMeetingStore;
pub use sqlite_store::SqliteMeetingStore;

/// Default collection holding meeting documents.
pub const DEFAULT_COLLECTION: &str = "meetings";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of one remote store operation.
#[derive(Debug)]
pub enum StoreError {
    /// Local persistence failure.
    Db(DbError),
    /// Target document does not exist.
    NotFound {
        collection: String,
        id: MeetingId,
    },
    /// Collection name is empty or has characters outside `[a-z0-9_-]`.
    InvalidCollection(String),
    /// Stored document could not be decoded.
    InvalidData(String),
    /// Transport-level failure reported by a remote adapter.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => {
                write!(f, "document not found: {collection}/{id}")
            }
            Self::InvalidCollection(name) => write!(f, "invalid collection name: `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Document store operations used by the dashboard.
pub trait MeetingStore {
    /// Opens a standing subscription. The current snapshot is queued
    /// immediately; dropping the returned handle unsubscribes.
    fn subscribe(&self, collection: &str) -> StoreResult<Subscription>;
    /// Inserts a new document and returns its store-assigned id.
    fn insert(&self, collection: &str, fields: &MeetingFields) -> StoreResult<MeetingId>;
    /// Replaces only the fields present in `patch`.
    fn update_partial(&self, collection: &str, id: &str, patch: &MeetingPatch)
        -> StoreResult<()>;
    /// Removes a document. Deleting a missing id is not an error.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
    /// Publishes a fresh snapshot if another client changed `collection`
    /// since it was last seen. Returns whether anything was published.
    ///
    /// Stores that publish every change themselves keep the default.
    fn refresh(&self, _collection: &str) -> StoreResult<bool> {
        Ok(false)
    }
}

impl<S: MeetingStore + ?Sized> MeetingStore for &S {
    fn subscribe(&self, collection: &str) -> StoreResult<Subscription> {
        (**self).subscribe(collection)
    }

    fn insert(&self, collection: &str, fields: &MeetingFields) -> StoreResult<MeetingId> {
        (**self).insert(collection, fields)
    }

    fn update_partial(
        &self,
        collection: &str,
        id: &str,
        patch: &MeetingPatch,
    ) -> StoreResult<()> {
        (**self).update_partial(collection, id, patch)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }

    fn refresh(&self, collection: &str) -> StoreResult<bool> {
        (**self).refresh(collection)
    }
}

impl<S: MeetingStore + ?Sized> MeetingStore for Arc<S> {
    fn subscribe(&self, collection: &str) -> StoreResult<Subscription> {
        (**self).subscribe(collection)
    }

    fn insert(&self, collection: &str, fields: &MeetingFields) -> StoreResult<MeetingId> {
        (**self).insert(collection, fields)
    }

    fn update_partial(
        &self,
        collection: &str,
        id: &str,
        patch: &MeetingPatch,
    ) -> StoreResult<()> {
        (**self).update_partial(collection, id, patch)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }

    fn refresh(&self, collection: &str) -> StoreResult<bool> {
        (**self).refresh(collection)
    }
}

/// Validates a collection name and returns it trimmed.
pub fn normalize_collection(collection: &str) -> StoreResult<&str> {
    let trimmed = collection.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(trimmed)
    } else {
        Err(StoreError::InvalidCollection(collection.to_string()))
    }
}
