//! In-process document store.
//!
//! Keeps each collection as an insertion-ordered vector behind a mutex and
//! fans out snapshots through [`SnapshotFeed`]. Used by tests, demos and any
//! host that does not need persistence.

use crate::model::meeting::{Meeting, MeetingFields, MeetingId, MeetingPatch};
use crate::store::feed::{Snapshot, SnapshotFeed, Subscription};
use crate::store::{normalize_collection, MeetingStore, StoreError, StoreResult};
use log::info;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

type IdSource = Box<dyn FnMut() -> MeetingId + Send>;

/// Mutex-guarded in-memory collections with live snapshots.
pub struct InMemoryMeetingStore {
    collections: Mutex<BTreeMap<String, Vec<Meeting>>>,
    id_source: Mutex<IdSource>,
    feed: SnapshotFeed,
}

impl Default for InMemoryMeetingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMeetingStore {
    /// Creates an empty store assigning random uuid ids.
    pub fn new() -> Self {
        Self::with_id_source(|| Uuid::new_v4().simple().to_string())
    }

    /// Creates an empty store assigning ids from `source`.
    pub fn with_id_source(source: impl FnMut() -> MeetingId + Send + 'static) -> Self {
        Self {
            collections: Mutex::new(BTreeMap::new()),
            id_source: Mutex::new(Box::new(source)),
            feed: SnapshotFeed::new(),
        }
    }

    /// Current contents of one collection.
    pub fn snapshot(&self, collection: &str) -> Snapshot {
        self.collections()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Looks up one document.
    pub fn get(&self, collection: &str, id: &str) -> Option<Meeting> {
        self.collections()
            .get(collection)
            .and_then(|docs| docs.iter().find(|meeting| meeting.id == id).cloned())
    }

    pub fn subscriber_count(&self) -> usize {
        self.feed.subscriber_count()
    }

    fn collections(&self) -> MutexGuard<'_, BTreeMap<String, Vec<Meeting>>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> MeetingId {
        let mut source = self.id_source.lock().unwrap_or_else(PoisonError::into_inner);
        (*source)()
    }

    /// Publishes while the caller still holds the collections lock, so
    /// snapshots reach subscribers in write order.
    fn publish_locked(&self, collections: &BTreeMap<String, Vec<Meeting>>, collection: &str) {
        if self.feed.has_subscribers(collection) {
            let snapshot = collections.get(collection).cloned().unwrap_or_default();
            self.feed.publish(collection, &snapshot);
        }
    }
}

impl MeetingStore for InMemoryMeetingStore {
    fn subscribe(&self, collection: &str) -> StoreResult<Subscription> {
        let collection = normalize_collection(collection)?;
        let collections = self.collections();
        let initial = collections.get(collection).cloned().unwrap_or_default();
        Ok(self.feed.register(collection, initial))
    }

    fn insert(&self, collection: &str, fields: &MeetingFields) -> StoreResult<MeetingId> {
        let collection = normalize_collection(collection)?;
        let id = self.next_id();
        {
            let mut collections = self.collections();
            let docs = collections.entry(collection.to_string()).or_default();
            if docs.iter().any(|meeting| meeting.id == id) {
                return Err(StoreError::InvalidData(format!(
                    "id source produced duplicate id `{id}`"
                )));
            }
            docs.push(Meeting::from_fields(id.clone(), fields.clone()));
            self.publish_locked(&collections, collection);
        }
        info!("event=store_insert module=store status=ok backend=memory collection={collection} id={id}");
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
            let mut collections = self.collections();
            let meeting = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|meeting| meeting.id == id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            patch.apply_to(meeting);
            self.publish_locked(&collections, collection);
        }
        info!(
            "event=store_update module=store status=ok backend=memory collection={collection} id={id} fields={}",
            patch.field_names().join(",")
        );
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let collection = normalize_collection(collection)?;
        let removed = {
            let mut collections = self.collections();
            let removed = match collections.get_mut(collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|meeting| meeting.id != id);
                    before != docs.len()
                }
                None => false,
            };
            if removed {
                self.publish_locked(&collections, collection);
            }
            removed
        };
        info!("event=store_delete module=store status=ok backend=memory collection={collection} id={id} removed={removed}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryMeetingStore;
    use crate::model::meeting::{MeetingDraft, MeetingPatch};
    use crate::store::{MeetingStore, StoreError};

    #[test]
    fn insert_uses_id_source_and_keeps_insertion_order() {
        let mut counter = 0;
        let store = InMemoryMeetingStore::with_id_source(move || {
            counter += 1;
            format!("m{counter}")
        });
        let first = store
            .insert("meetings", &MeetingDraft::new("A", "d", "t").into_fields())
            .unwrap();
        let second = store
            .insert("meetings", &MeetingDraft::new("B", "d", "t").into_fields())
            .unwrap();
        assert_eq!((first.as_str(), second.as_str()), ("m1", "m2"));
        let titles: Vec<_> = store
            .snapshot("meetings")
            .into_iter()
            .map(|meeting| meeting.title)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn update_missing_document_is_not_found() {
        let store = InMemoryMeetingStore::new();
        let err = store
            .update_partial("meetings", "nope", &MeetingPatch::content("x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn duplicate_ids_from_source_are_rejected() {
        let store = InMemoryMeetingStore::with_id_source(|| "same".to_string());
        let fields = MeetingDraft::new("A", "d", "t").into_fields();
        store.insert("meetings", &fields).unwrap();
        let err = store.insert("meetings", &fields).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert_eq!(store.snapshot("meetings").len(), 1);
    }
}
