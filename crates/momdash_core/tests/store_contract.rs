use momdash_core::{
    Dashboard, DashboardConfig, InMemoryMeetingStore, MeetingDraft, MeetingPatch, MeetingStore,
    SqliteMeetingStore, StoreError,
};

const COLLECTION: &str = "meetings";

fn draft(title: &str) -> momdash_core::MeetingFields {
    MeetingDraft::new(title, "2024-01-05", "09:00").into_fields()
}

fn stores() -> Vec<(&'static str, Box<dyn MeetingStore>)> {
    vec![
        ("memory", Box::new(InMemoryMeetingStore::new())),
        ("sqlite", Box::new(SqliteMeetingStore::open_in_memory().unwrap())),
    ]
}

#[test]
fn subscribe_delivers_current_snapshot_immediately() {
    for (name, store) in stores() {
        store.insert(COLLECTION, &draft("Existing")).unwrap();

        let subscription = store.subscribe(COLLECTION).unwrap();
        let snapshot = subscription.drain_latest().expect("initial snapshot");
        assert_eq!(snapshot.len(), 1, "{name}");
        assert_eq!(snapshot[0].title, "Existing", "{name}");
        assert_eq!(subscription.collection(), COLLECTION);
    }
}

#[test]
fn every_write_publishes_a_full_ordered_snapshot() {
    for (name, store) in stores() {
        let subscription = store.subscribe(COLLECTION).unwrap();
        subscription.drain_latest();

        let first = store.insert(COLLECTION, &draft("First")).unwrap();
        let second = store.insert(COLLECTION, &draft("Second")).unwrap();
        assert_ne!(first, second, "{name}");

        let snapshot = subscription.drain_latest().expect("snapshot after inserts");
        let ids: Vec<_> = snapshot.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str()], "{name}");
        assert!(snapshot.iter().all(|m| m.content.is_empty()), "{name}");

        store
            .update_partial(COLLECTION, &first, &MeetingPatch::content("## Notes"))
            .unwrap();
        let snapshot = subscription.drain_latest().expect("snapshot after update");
        assert_eq!(snapshot[0].content, "## Notes", "{name}");
        assert_eq!(snapshot[0].title, "First", "{name}");
        assert_eq!(snapshot[0].id, first, "update keeps order for {name}");

        store.delete(COLLECTION, &first).unwrap();
        let snapshot = subscription.drain_latest().expect("snapshot after delete");
        assert_eq!(snapshot.len(), 1, "{name}");
        assert_eq!(snapshot[0].id, second, "{name}");
    }
}

#[test]
fn partial_update_touches_only_named_fields() {
    for (name, store) in stores() {
        let id = store.insert(COLLECTION, &draft("Planning")).unwrap();
        store
            .update_partial(COLLECTION, &id, &MeetingPatch::content("body"))
            .unwrap();
        let patch = MeetingPatch {
            time: Some("14:00".to_string()),
            ..MeetingPatch::default()
        };
        store.update_partial(COLLECTION, &id, &patch).unwrap();

        let subscription = store.subscribe(COLLECTION).unwrap();
        let meeting = subscription.drain_latest().unwrap().remove(0);
        assert_eq!(meeting.title, "Planning", "{name}");
        assert_eq!(meeting.date, "2024-01-05", "{name}");
        assert_eq!(meeting.time, "14:00", "{name}");
        assert_eq!(meeting.content, "body", "{name}");
    }
}

#[test]
fn update_of_missing_document_is_not_found_and_delete_is_idempotent() {
    for (name, store) in stores() {
        let err = store
            .update_partial(COLLECTION, "missing", &MeetingPatch::content("x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }), "{name}: {err}");

        store.delete(COLLECTION, "missing").unwrap();
    }
}

#[test]
fn collections_are_isolated_and_names_validated() {
    for (name, store) in stores() {
        let other = store.subscribe("archive").unwrap();
        other.drain_latest();
        store.insert(COLLECTION, &draft("Only here")).unwrap();
        assert!(other.drain_latest().is_none(), "{name}");

        let err = store.insert("Bad Name", &draft("x")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCollection(_)), "{name}");
    }
}

#[test]
fn dropped_subscription_stops_receiving() {
    let store = InMemoryMeetingStore::new();
    let subscription = store.subscribe(COLLECTION).unwrap();
    assert_eq!(store.subscriber_count(), 1);
    drop(subscription);
    assert_eq!(store.subscriber_count(), 0);
    store.insert(COLLECTION, &draft("After")).unwrap();
}

#[test]
fn sqlite_store_persists_documents_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("momdash.db");

    let id = {
        let store = SqliteMeetingStore::open(&path).unwrap();
        let id = store.insert(COLLECTION, &draft("Durable")).unwrap();
        store
            .update_partial(COLLECTION, &id, &MeetingPatch::content("- kept"))
            .unwrap();
        id
    };

    let store = SqliteMeetingStore::open(&path).unwrap();
    let meeting = store.get(COLLECTION, &id).unwrap().expect("meeting persisted");
    assert_eq!(meeting.title, "Durable");
    assert_eq!(meeting.content, "- kept");
    assert_eq!(store.snapshot(COLLECTION).unwrap().len(), 1);
}

#[test]
fn sqlite_store_get_distinguishes_present_and_absent() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let store = SqliteMeetingStore::try_new(conn).unwrap();
    let id = store.insert(COLLECTION, &draft("Fine")).unwrap();
    assert!(store.get(COLLECTION, &id).unwrap().is_some());
    assert!(store.get(COLLECTION, "absent").unwrap().is_none());
}

#[test]
fn sqlite_store_reports_documents_with_wrong_field_types() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.db");
    let store = SqliteMeetingStore::open(&path).unwrap();

    let raw = rusqlite::Connection::open(&path).unwrap();
    raw.execute(
        "INSERT INTO documents (collection, id, body) VALUES ('meetings', 'bad', '{\"title\": 5}');",
        [],
    )
    .unwrap();

    let err = store.snapshot(COLLECTION).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)), "{err}");
    assert!(store.subscribe(COLLECTION).is_err());
}

fn assert_last_snapshot_is_current<S: MeetingStore + Sync>(name: &str, store: &S) {
    const WRITERS: usize = 4;
    const INSERTS_PER_WRITER: usize = 20;

    let subscription = store.subscribe(COLLECTION).unwrap();
    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            scope.spawn(move || {
                for n in 0..INSERTS_PER_WRITER {
                    store
                        .insert(COLLECTION, &draft(&format!("w{writer}-{n}")))
                        .unwrap();
                }
            });
        }
    });

    let last = subscription.drain_latest().expect("snapshots after writes");
    let current = store
        .subscribe(COLLECTION)
        .unwrap()
        .drain_latest()
        .expect("current snapshot");
    assert_eq!(current.len(), WRITERS * INSERTS_PER_WRITER, "{name}");
    assert_eq!(last, current, "{name}: last delivered snapshot is stale");
}

#[test]
fn concurrent_writers_leave_subscribers_on_the_newest_snapshot() {
    for round in 0..50 {
        let store = InMemoryMeetingStore::new();
        assert_last_snapshot_is_current(&format!("memory round {round}"), &store);
    }
    for round in 0..5 {
        let store = SqliteMeetingStore::open_in_memory().unwrap();
        assert_last_snapshot_is_current(&format!("sqlite round {round}"), &store);
    }
}

#[test]
fn sqlite_store_sees_writes_committed_by_another_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let ui = SqliteMeetingStore::open(&path).unwrap();
    let cli = SqliteMeetingStore::open(&path).unwrap();

    let subscription = ui.subscribe(COLLECTION).unwrap();
    subscription.drain_latest();
    assert!(!ui.refresh(COLLECTION).unwrap());

    let id = cli.insert(COLLECTION, &draft("From CLI")).unwrap();
    assert!(subscription.drain_latest().is_none());
    assert!(ui.refresh(COLLECTION).unwrap());
    let snapshot = subscription.drain_latest().expect("snapshot after refresh");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, id);
    assert!(!ui.refresh(COLLECTION).unwrap());

    // Own writes publish directly and do not count as foreign changes.
    ui.update_partial(COLLECTION, &id, &MeetingPatch::content("local"))
        .unwrap();
    assert!(subscription.drain_latest().is_some());
    assert!(!ui.refresh(COLLECTION).unwrap());
}

#[test]
fn dashboard_on_shared_file_follows_other_clients() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let ui = SqliteMeetingStore::open(&path).unwrap();
    let cli = SqliteMeetingStore::open(&path).unwrap();

    let mut dashboard = Dashboard::new(&ui, DashboardConfig::default());
    dashboard.activate().unwrap();
    assert!(dashboard.meetings().is_empty());

    let id = cli.insert(COLLECTION, &draft("Standup")).unwrap();
    assert!(dashboard.poll_snapshots());
    assert_eq!(dashboard.meetings().len(), 1);
    assert!(!dashboard.poll_snapshots());

    cli.update_partial(COLLECTION, &id, &MeetingPatch::content("## Notes"))
        .unwrap();
    assert!(dashboard.poll_snapshots());
    assert_eq!(dashboard.meeting(&id).unwrap().content, "## Notes");

    cli.delete(COLLECTION, &id).unwrap();
    assert!(dashboard.poll_snapshots());
    assert!(dashboard.meetings().is_empty());
}
