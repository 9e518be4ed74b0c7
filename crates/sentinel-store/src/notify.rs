//! Store decorators that surface writes to an observer.
//!
//! Observers run after the write has committed and cannot veto or fail it;
//! whatever delivery they do is their own concern.

use std::sync::Arc;

use sentinel_core::{BreakGlassEvent, BreakGlassStatus, Request, RequestStatus};

use crate::error::StoreError;
use crate::{Bf, BreakGlassStore, RequestStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Created,
    Updated,
}

pub trait StoreObserver: Send + Sync {
    fn on_request(&self, op: StoreOp, request: &Request);
    fn on_break_glass(&self, op: StoreOp, event: &BreakGlassEvent);
}

/// Observer that just logs. The default when no delivery backend is wired.
pub struct TracingObserver;

impl StoreObserver for TracingObserver {
    fn on_request(&self, op: StoreOp, request: &Request) {
        tracing::info!(
            op = ?op,
            id = %request.id,
            profile = %request.profile,
            status = %request.status,
            "request store event"
        );
    }

    fn on_break_glass(&self, op: StoreOp, event: &BreakGlassEvent) {
        tracing::info!(
            op = ?op,
            id = %event.id,
            profile = %event.profile,
            status = %event.status,
            "break-glass store event"
        );
    }
}

pub struct NotifyRequestStore<S> {
    inner: S,
    observer: Arc<dyn StoreObserver>,
}

impl<S: RequestStore> NotifyRequestStore<S> {
    pub fn new(inner: S, observer: Arc<dyn StoreObserver>) -> Self {
        Self { inner, observer }
    }
}

impl<S: RequestStore> RequestStore for NotifyRequestStore<S> {
    fn create<'a>(&'a self, request: &'a Request) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.inner.create(request).await?;
            self.observer.on_request(StoreOp::Created, request);
            Ok(())
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> Bf<'a, Result<Request, StoreError>> {
        self.inner.get(id)
    }

    fn update<'a>(&'a self, request: &'a Request) -> Bf<'a, Result<Request, StoreError>> {
        Box::pin(async move {
            let stored = self.inner.update(request).await?;
            self.observer.on_request(StoreOp::Updated, &stored);
            Ok(stored)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> Bf<'a, Result<(), StoreError>> {
        self.inner.delete(id)
    }

    fn list_by_requester<'a>(
        &'a self,
        requester: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        self.inner.list_by_requester(requester, limit)
    }

    fn list_by_status<'a>(
        &'a self,
        status: RequestStatus,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        self.inner.list_by_status(status, limit)
    }

    fn list_by_profile<'a>(
        &'a self,
        profile: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        self.inner.list_by_profile(profile, limit)
    }
}

pub struct NotifyBreakGlassStore<S> {
    inner: S,
    observer: Arc<dyn StoreObserver>,
}

impl<S: BreakGlassStore> NotifyBreakGlassStore<S> {
    pub fn new(inner: S, observer: Arc<dyn StoreObserver>) -> Self {
        Self { inner, observer }
    }
}

impl<S: BreakGlassStore> BreakGlassStore for NotifyBreakGlassStore<S> {
    fn create<'a>(&'a self, event: &'a BreakGlassEvent) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.inner.create(event).await?;
            self.observer.on_break_glass(StoreOp::Created, event);
            Ok(())
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> Bf<'a, Result<BreakGlassEvent, StoreError>> {
        self.inner.get(id)
    }

    fn update<'a>(
        &'a self,
        event: &'a BreakGlassEvent,
    ) -> Bf<'a, Result<BreakGlassEvent, StoreError>> {
        Box::pin(async move {
            let stored = self.inner.update(event).await?;
            self.observer.on_break_glass(StoreOp::Updated, &stored);
            Ok(stored)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> Bf<'a, Result<(), StoreError>> {
        self.inner.delete(id)
    }

    fn list_by_invoker<'a>(
        &'a self,
        invoker: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        self.inner.list_by_invoker(invoker, limit)
    }

    fn list_by_status<'a>(
        &'a self,
        status: BreakGlassStatus,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        self.inner.list_by_status(status, limit)
    }

    fn list_by_profile<'a>(
        &'a self,
        profile: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        self.inner.list_by_profile(profile, limit)
    }

    fn find_active<'a>(
        &'a self,
        invoker: &'a str,
        profile: &'a str,
    ) -> Bf<'a, Result<Option<BreakGlassEvent>, StoreError>> {
        self.inner.find_active(invoker, profile)
    }
}
