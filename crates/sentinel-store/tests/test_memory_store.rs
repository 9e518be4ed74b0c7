use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jiff::{SignedDuration, Timestamp};
use sentinel_core::{BreakGlassEvent, BreakGlassStatus, ReasonCode, Request, RequestStatus};
use sentinel_store::{
    BreakGlassStore, MemoryBreakGlassStore, MemoryRequestStore, NotifyRequestStore, RequestStore,
    StoreError, StoreObserver, StoreOp,
};

fn request(requester: &str, profile: &str, created_at: Timestamp) -> Request {
    Request::new(
        requester,
        profile,
        "incident INC-1 needs prod access",
        SignedDuration::from_hours(2),
        created_at,
    )
    .unwrap()
}

fn break_glass(invoker: &str, profile: &str) -> BreakGlassEvent {
    BreakGlassEvent::new(
        invoker,
        profile,
        ReasonCode::Incident,
        "production outage, paging gave no responder",
        SignedDuration::from_hours(2),
        Timestamp::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn create_get_round_trip() {
    let store = MemoryRequestStore::new();
    let r = request("alice", "prod", Timestamp::UNIX_EPOCH);
    store.create(&r).await.unwrap();

    let fetched = store.get(&r.id).await.unwrap();
    assert_eq!(fetched.requester, "alice");
    assert_eq!(fetched.status, RequestStatus::Pending);
}

#[tokio::test]
async fn duplicate_create_fails() {
    let store = MemoryRequestStore::new();
    let r = request("alice", "prod", Timestamp::UNIX_EPOCH);
    store.create(&r).await.unwrap();
    let err = store.create(&r).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let store = MemoryRequestStore::new();
    let err = store.get("0123456789abcdef").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn update_stamps_a_new_version() {
    let store = MemoryRequestStore::new();
    let r = request("alice", "prod", Timestamp::UNIX_EPOCH);
    store.create(&r).await.unwrap();

    let mut changed = r.clone();
    changed.approve("bob", Some("ok")).unwrap();
    let stored = store.update(&changed).await.unwrap();

    assert_eq!(stored.status, RequestStatus::Approved);
    assert!(stored.updated_at > r.updated_at);
    assert_eq!(store.get(&r.id).await.unwrap().updated_at, stored.updated_at);
}

#[tokio::test]
async fn concurrent_update_loses_exactly_once() {
    let store = MemoryRequestStore::new();
    let r = request("alice", "prod", Timestamp::UNIX_EPOCH);
    store.create(&r).await.unwrap();

    // Two writers loaded the same snapshot.
    let mut first = r.clone();
    first.approve("bob", None).unwrap();
    let mut second = r.clone();
    second.deny("carol", None).unwrap();

    store.update(&first).await.unwrap();
    let err = store.update(&second).await.unwrap_err();
    assert!(matches!(err, StoreError::ConcurrentModification { .. }));

    // The winner's decision is what persisted.
    assert_eq!(store.get(&r.id).await.unwrap().status, RequestStatus::Approved);
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let store = MemoryRequestStore::new();
    let mut r = request("alice", "prod", Timestamp::UNIX_EPOCH);
    r.approve("bob", None).unwrap();
    let err = store.update(&r).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = MemoryRequestStore::new();
    let r = request("alice", "prod", Timestamp::UNIX_EPOCH);
    store.create(&r).await.unwrap();
    store.delete(&r.id).await.unwrap();
    store.delete(&r.id).await.unwrap();
    assert!(store.get(&r.id).await.is_err());
}

#[tokio::test]
async fn listings_are_newest_first_and_bounded() {
    let store = MemoryRequestStore::new();
    let base = Timestamp::UNIX_EPOCH;
    for i in 0..5 {
        let r = request("alice", "prod", base.saturating_add(SignedDuration::from_mins(i)).expect("fixed test offset"));
        store.create(&r).await.unwrap();
    }

    let listed = store.list_by_requester("alice", 3).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert_eq!(
        listed[0].created_at,
        base.saturating_add(SignedDuration::from_mins(4)).expect("fixed test offset")
    );

    assert_eq!(store.list_by_status(RequestStatus::Pending, 10).await.unwrap().len(), 5);
    assert!(store.list_by_profile("staging", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn at_most_one_active_break_glass_per_invoker_profile() {
    let store = MemoryBreakGlassStore::new();
    let first = break_glass("alice", "prod");
    store.create(&first).await.unwrap();

    // Same (invoker, profile) is refused while the first is active.
    let err = store.create(&break_glass("alice", "prod")).await.unwrap_err();
    assert!(matches!(err, StoreError::ActiveExists { .. }));

    // A different profile or invoker is fine.
    store.create(&break_glass("alice", "staging")).await.unwrap();
    store.create(&break_glass("bob", "prod")).await.unwrap();

    // Closing the first frees the slot.
    let mut closed = first.clone();
    closed.close("alice", "incident resolved").unwrap();
    store.update(&closed).await.unwrap();
    assert!(store.find_active("alice", "prod").await.unwrap().is_none());
    store.create(&break_glass("alice", "prod")).await.unwrap();
}

#[tokio::test]
async fn expired_active_event_does_not_block_creation() {
    let store = MemoryBreakGlassStore::new();
    // Crafted far in the past so expires_at is behind the clock; status is
    // still the stored "active" label because expiry is a purge, not a
    // transition.
    let stale = BreakGlassEvent::new(
        "alice",
        "prod",
        ReasonCode::Recovery,
        "restore from backup after data loss",
        SignedDuration::from_hours(1),
        Timestamp::UNIX_EPOCH,
    )
    .unwrap();
    store.create(&stale).await.unwrap();
    assert_eq!(store.get(&stale.id).await.unwrap().status, BreakGlassStatus::Active);

    assert!(store.find_active("alice", "prod").await.unwrap().is_none());
    store.create(&break_glass("alice", "prod")).await.unwrap();
}

struct CountingObserver {
    created: AtomicUsize,
    updated: AtomicUsize,
}

impl StoreObserver for CountingObserver {
    fn on_request(&self, op: StoreOp, _request: &Request) {
        match op {
            StoreOp::Created => self.created.fetch_add(1, Ordering::SeqCst),
            StoreOp::Updated => self.updated.fetch_add(1, Ordering::SeqCst),
        };
    }

    fn on_break_glass(&self, _op: StoreOp, _event: &BreakGlassEvent) {}
}

#[tokio::test]
async fn notify_decorator_emits_on_create_and_update() {
    let observer = Arc::new(CountingObserver {
        created: AtomicUsize::new(0),
        updated: AtomicUsize::new(0),
    });
    let store = NotifyRequestStore::new(MemoryRequestStore::new(), observer.clone());

    let r = request("alice", "prod", Timestamp::UNIX_EPOCH);
    store.create(&r).await.unwrap();
    let mut changed = r.clone();
    changed.approve("bob", None).unwrap();
    store.update(&changed).await.unwrap();
    store.get(&r.id).await.unwrap();

    assert_eq!(observer.created.load(Ordering::SeqCst), 1);
    assert_eq!(observer.updated.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_write_does_not_notify() {
    let observer = Arc::new(CountingObserver {
        created: AtomicUsize::new(0),
        updated: AtomicUsize::new(0),
    });
    let store = NotifyRequestStore::new(MemoryRequestStore::new(), observer.clone());

    let r = request("alice", "prod", Timestamp::UNIX_EPOCH);
    store.create(&r).await.unwrap();
    store.create(&r).await.unwrap_err();
    assert_eq!(observer.created.load(Ordering::SeqCst), 1);
}
