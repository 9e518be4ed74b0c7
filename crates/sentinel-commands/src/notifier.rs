//! Notification seam. Delivery backends (SNS, webhooks) live outside this
//! workspace; the default implementation just logs.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::CommandError;

type Bf<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub event: String,
    pub actor: String,
    pub profile: String,
    pub entity_id: String,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, notification: &'a Notification) -> Bf<'a, Result<(), CommandError>>;
}

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> Bf<'a, Result<(), CommandError>> {
        Box::pin(async move {
            tracing::info!(
                event = %notification.event,
                actor = %notification.actor,
                profile = %notification.profile,
                entity_id = %notification.entity_id,
                "{}",
                notification.message
            );
            Ok(())
        })
    }
}
