//! Snapshot fan-out shared by store implementations.
//!
//! # Responsibility
//! - Track live subscriptions per collection.
//! - Push full snapshots to every live subscriber of a collection.
//!
//! # Invariants
//! - A snapshot always carries the whole collection, never a delta.
//! - Dropped subscriptions are unregistered; senders whose receiver is gone
//!   are pruned on the next publish.

use crate::model::meeting::Meeting;
use log::debug;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Full ordered contents of one collection.
pub type Snapshot = Vec<Meeting>;

struct Subscriber {
    collection: String,
    sender: Sender<Snapshot>,
}

#[derive(Default)]
struct FeedInner {
    next_id: u64,
    subscribers: BTreeMap<u64, Subscriber>,
}

/// Registry of snapshot subscribers.
#[derive(Clone, Default)]
pub struct SnapshotFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl SnapshotFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and queues `initial` as its first snapshot.
    pub fn register(&self, collection: &str, initial: Snapshot) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        // Receiver is alive; the send cannot fail.
        let _ = sender.send(initial);

        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(
            id,
            Subscriber {
                collection: collection.to_string(),
                sender,
            },
        );
        debug!("event=feed_subscribe module=store status=ok collection={collection} subscription_id={id}");

        Subscription {
            id,
            collection: collection.to_string(),
            receiver,
            feed: Arc::downgrade(&self.inner),
        }
    }

    /// Returns whether any live subscriber watches `collection`.
    pub fn has_subscribers(&self, collection: &str) -> bool {
        lock(&self.inner)
            .subscribers
            .values()
            .any(|subscriber| subscriber.collection == collection)
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    /// Sends `snapshot` to every subscriber of `collection`.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, collection: &str, snapshot: &Snapshot) -> usize {
        let mut inner = lock(&self.inner);
        let mut delivered = 0;
        let mut disconnected = Vec::new();
        for (id, subscriber) in &inner.subscribers {
            if subscriber.collection != collection {
                continue;
            }
            if subscriber.sender.send(snapshot.clone()).is_ok() {
                delivered += 1;
            } else {
                disconnected.push(*id);
            }
        }
        for id in disconnected {
            inner.subscribers.remove(&id);
        }
        debug!(
            "event=feed_publish module=store status=ok collection={collection} records={} delivered={delivered}",
            snapshot.len()
        );
        delivered
    }
}

/// Live subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    collection: String,
    receiver: Receiver<Snapshot>,
    feed: Weak<Mutex<FeedInner>>,
}

impl Subscription {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Drains queued snapshots and returns only the newest one.
    pub fn drain_latest(&self) -> Option<Snapshot> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(snapshot) => latest = Some(snapshot),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        latest
    }

    /// Returns whether the backing store still exists.
    pub fn is_connected(&self) -> bool {
        self.feed.strong_count() > 0
    }

    /// Explicit form of dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.feed.upgrade() {
            lock(&inner).subscribers.remove(&self.id);
            debug!(
                "event=feed_unsubscribe module=store status=ok collection={} subscription_id={}",
                self.collection, self.id
            );
        }
    }
}

fn lock(inner: &Mutex<FeedInner>) -> MutexGuard<'_, FeedInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
