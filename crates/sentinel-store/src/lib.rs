//! sentinel-store
//!
//! Persistence contract for requests and break-glass events, plus the two
//! implementations: DynamoDB for production and an in-memory store for
//! tests and dry runs. A decorator ([`notify::NotifyRequestStore`],
//! [`notify::NotifyBreakGlassStore`]) emits observer callbacks on writes.
//!
//! Concurrency is optimistic: `updated_at` is the version token. `update`
//! succeeds only when the caller's copy of `updated_at` matches the stored
//! row, and stamps a fresh `updated_at` on success. Nothing in this crate
//! retries a business-logic failure.

use std::future::Future;
use std::pin::Pin;

use jiff::{SignedDuration, Timestamp};
use sentinel_core::{BreakGlassEvent, BreakGlassStatus, Request, RequestStatus};

pub mod dynamo;
pub mod error;
pub mod marshal;
pub mod memory;
pub mod notify;

pub use crate::dynamo::{DynamoBreakGlassStore, DynamoRequestStore};
pub use crate::error::StoreError;
pub use crate::memory::{MemoryBreakGlassStore, MemoryRequestStore};
pub use crate::notify::{
    NotifyBreakGlassStore, NotifyRequestStore, StoreObserver, StoreOp, TracingObserver,
};

pub type Bf<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The fresh `updated_at` stamped on a successful update. Guaranteed to
/// differ from `prev` so the version token always advances, even when the
/// clock hasn't.
pub(crate) fn next_version(prev: Timestamp) -> Timestamp {
    let now = Timestamp::now();
    if now > prev {
        now
    } else {
        prev.saturating_add(SignedDuration::from_nanos(1))
            .unwrap_or(Timestamp::MAX)
    }
}

/// Store for [`Request`] rows.
///
/// Listings are paged secondary-index scans, newest-first by `created_at`;
/// callers may not assume the absence of further rows beyond `limit`.
/// Expiry is a purge, not a transition — readers treat `now > expires_at`
/// as the authoritative signal regardless of the stored status label.
pub trait RequestStore: Send + Sync {
    /// Fails `AlreadyExists` on id collision.
    fn create<'a>(&'a self, request: &'a Request) -> Bf<'a, Result<(), StoreError>>;

    fn get<'a>(&'a self, id: &'a str) -> Bf<'a, Result<Request, StoreError>>;

    /// Conditional on the stored `updated_at` matching `request.updated_at`.
    /// Returns the persisted row carrying the freshly stamped `updated_at`.
    fn update<'a>(&'a self, request: &'a Request) -> Bf<'a, Result<Request, StoreError>>;

    /// Idempotent.
    fn delete<'a>(&'a self, id: &'a str) -> Bf<'a, Result<(), StoreError>>;

    fn list_by_requester<'a>(
        &'a self,
        requester: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>>;

    fn list_by_status<'a>(
        &'a self,
        status: RequestStatus,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>>;

    fn list_by_profile<'a>(
        &'a self,
        profile: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>>;
}

/// Store for [`BreakGlassEvent`] rows. Same contract as [`RequestStore`],
/// plus the at-most-one-active invariant checked at creation.
pub trait BreakGlassStore: Send + Sync {
    /// Fails `AlreadyExists` on id collision and `ActiveExists` when an
    /// active event already exists for `(invoker, profile)`. The check is
    /// read-then-create: two concurrent creators can both pass it. That
    /// race is documented and tolerated — both events land in the audit
    /// trail.
    fn create<'a>(&'a self, event: &'a BreakGlassEvent) -> Bf<'a, Result<(), StoreError>>;

    fn get<'a>(&'a self, id: &'a str) -> Bf<'a, Result<BreakGlassEvent, StoreError>>;

    fn update<'a>(&'a self, event: &'a BreakGlassEvent)
    -> Bf<'a, Result<BreakGlassEvent, StoreError>>;

    fn delete<'a>(&'a self, id: &'a str) -> Bf<'a, Result<(), StoreError>>;

    fn list_by_invoker<'a>(
        &'a self,
        invoker: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>>;

    fn list_by_status<'a>(
        &'a self,
        status: BreakGlassStatus,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>>;

    fn list_by_profile<'a>(
        &'a self,
        profile: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>>;

    /// The sole active event for `(invoker, profile)`, or `None`.
    fn find_active<'a>(
        &'a self,
        invoker: &'a str,
        profile: &'a str,
    ) -> Bf<'a, Result<Option<BreakGlassEvent>, StoreError>>;
}
