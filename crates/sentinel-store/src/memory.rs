//! In-memory stores with the same semantics as the DynamoDB ones.
//! Used by tests and local dry runs.

use std::collections::HashMap;
use std::sync::RwLock;

use jiff::Timestamp;
use sentinel_core::{BreakGlassEvent, BreakGlassStatus, Request, RequestStatus};

use crate::error::StoreError;
use crate::{Bf, BreakGlassStore, RequestStore, next_version};

#[derive(Default)]
pub struct MemoryRequestStore {
    rows: RwLock<HashMap<String, Request>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
pub struct MemoryBreakGlassStore {
    rows: RwLock<HashMap<String, BreakGlassEvent>>,
}

impl MemoryBreakGlassStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> Timestamp, limit: i32) -> Vec<T> {
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows.truncate(limit.max(0) as usize);
    rows
}

fn poisoned() -> StoreError {
    StoreError::Config("memory store lock poisoned".into())
}

impl RequestStore for MemoryRequestStore {
    fn create<'a>(&'a self, request: &'a Request) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move {
            request.validate()?;
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            if rows.contains_key(&request.id) {
                return Err(StoreError::AlreadyExists {
                    id: request.id.clone(),
                });
            }
            rows.insert(request.id.clone(), request.clone());
            Ok(())
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> Bf<'a, Result<Request, StoreError>> {
        Box::pin(async move {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            rows.get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
        })
    }

    fn update<'a>(&'a self, request: &'a Request) -> Bf<'a, Result<Request, StoreError>> {
        Box::pin(async move {
            request.validate()?;
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            let current = rows.get(&request.id).ok_or_else(|| StoreError::NotFound {
                id: request.id.clone(),
            })?;
            if current.updated_at != request.updated_at {
                return Err(StoreError::ConcurrentModification {
                    id: request.id.clone(),
                });
            }
            let mut stored = request.clone();
            stored.updated_at = next_version(request.updated_at);
            rows.insert(stored.id.clone(), stored.clone());
            Ok(stored)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            rows.remove(id);
            Ok(())
        })
    }

    fn list_by_requester<'a>(
        &'a self,
        requester: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        Box::pin(async move {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            let matched: Vec<Request> = rows
                .values()
                .filter(|r| r.requester == requester)
                .cloned()
                .collect();
            Ok(newest_first(matched, |r| r.created_at, limit))
        })
    }

    fn list_by_status<'a>(
        &'a self,
        status: RequestStatus,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        Box::pin(async move {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            let matched: Vec<Request> =
                rows.values().filter(|r| r.status == status).cloned().collect();
            Ok(newest_first(matched, |r| r.created_at, limit))
        })
    }

    fn list_by_profile<'a>(
        &'a self,
        profile: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        Box::pin(async move {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            let matched: Vec<Request> = rows
                .values()
                .filter(|r| r.profile == profile)
                .cloned()
                .collect();
            Ok(newest_first(matched, |r| r.created_at, limit))
        })
    }
}

impl BreakGlassStore for MemoryBreakGlassStore {
    fn create<'a>(&'a self, event: &'a BreakGlassEvent) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move {
            event.validate()?;
            if self.find_active(&event.invoker, &event.profile).await?.is_some() {
                return Err(StoreError::ActiveExists {
                    invoker: event.invoker.clone(),
                    profile: event.profile.clone(),
                });
            }
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            if rows.contains_key(&event.id) {
                return Err(StoreError::AlreadyExists {
                    id: event.id.clone(),
                });
            }
            rows.insert(event.id.clone(), event.clone());
            Ok(())
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> Bf<'a, Result<BreakGlassEvent, StoreError>> {
        Box::pin(async move {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            rows.get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
        })
    }

    fn update<'a>(
        &'a self,
        event: &'a BreakGlassEvent,
    ) -> Bf<'a, Result<BreakGlassEvent, StoreError>> {
        Box::pin(async move {
            event.validate()?;
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            let current = rows.get(&event.id).ok_or_else(|| StoreError::NotFound {
                id: event.id.clone(),
            })?;
            if current.updated_at != event.updated_at {
                return Err(StoreError::ConcurrentModification {
                    id: event.id.clone(),
                });
            }
            let mut stored = event.clone();
            stored.updated_at = next_version(event.updated_at);
            rows.insert(stored.id.clone(), stored.clone());
            Ok(stored)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            rows.remove(id);
            Ok(())
        })
    }

    fn list_by_invoker<'a>(
        &'a self,
        invoker: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        Box::pin(async move {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            let matched: Vec<BreakGlassEvent> = rows
                .values()
                .filter(|e| e.invoker == invoker)
                .cloned()
                .collect();
            Ok(newest_first(matched, |e| e.created_at, limit))
        })
    }

    fn list_by_status<'a>(
        &'a self,
        status: BreakGlassStatus,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        Box::pin(async move {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            let matched: Vec<BreakGlassEvent> =
                rows.values().filter(|e| e.status == status).cloned().collect();
            Ok(newest_first(matched, |e| e.created_at, limit))
        })
    }

    fn list_by_profile<'a>(
        &'a self,
        profile: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        Box::pin(async move {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            let matched: Vec<BreakGlassEvent> = rows
                .values()
                .filter(|e| e.profile == profile)
                .cloned()
                .collect();
            Ok(newest_first(matched, |e| e.created_at, limit))
        })
    }

    fn find_active<'a>(
        &'a self,
        invoker: &'a str,
        profile: &'a str,
    ) -> Bf<'a, Result<Option<BreakGlassEvent>, StoreError>> {
        Box::pin(async move {
            let now = Timestamp::now();
            let rows = self.rows.read().map_err(|_| poisoned())?;
            Ok(rows
                .values()
                .find(|e| {
                    e.invoker == invoker
                        && e.profile == profile
                        && e.status == BreakGlassStatus::Active
                        && !e.is_expired(now)
                })
                .cloned())
        })
    }
}
