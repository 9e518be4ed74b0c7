//! sentinel-commands
//!
//! The orchestration layer binding identity, policy, store, audit log,
//! and notifications together. Every mutating command walks the same
//! skeleton: identify → validate → authorize → load → check transition →
//! persist with version check → signed log entry → notification.
//!
//! The last two steps are best-effort: once the store write committed,
//! the outcome stands. A failed audit append or notification is logged to
//! the operator and shows up as a gap the verifier can detect — it never
//! produces a divergence between the store and the reported result.
//! `ConcurrentModification` is surfaced to the caller untouched; nothing
//! here retries business-logic failures.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sentinel_audit::{AuditError, AuditLog};
use sentinel_core::ApprovalPolicy;
use sentinel_store::{BreakGlassStore, RequestStore};
use serde_json::Value;

pub mod audit;
pub mod break_glass;
pub mod error;
pub mod exit;
pub mod identity;
pub mod notifier;
pub mod requests;
pub mod trust;

pub use crate::audit::{DetectParams, detect_untracked, verify_log};
pub use crate::break_glass::{
    BreakGlassFilter, InvokeParams, close_break_glass, invoke_break_glass, list_break_glass,
};
pub use crate::error::CommandError;
pub use crate::identity::{CallerIdentity, IdentityProvider, StaticIdentity, StsIdentityProvider};
pub use crate::notifier::{Notification, Notifier, TracingNotifier};
pub use crate::requests::{
    CreateRequestParams, RequestFilter, approve_request, cancel_request, create_request,
    deny_request, list_requests,
};
pub use crate::trust::validate_trust;

/// Everything a command needs, wired once at startup.
pub struct CommandContext {
    pub requests: Arc<dyn RequestStore>,
    pub break_glass: Arc<dyn BreakGlassStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub policy: ApprovalPolicy,
    /// `None` disables audit logging (surfaced loudly at startup, not here).
    pub audit: Option<AuditLog>,
}

/// Bound a command with an externally supplied deadline. Expiry cancels
/// the in-flight future at its next suspension point and surfaces as
/// [`CommandError::DeadlineExceeded`].
pub async fn run_with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> Result<T, CommandError>
where
    F: Future<Output = Result<T, CommandError>>,
{
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(CommandError::DeadlineExceeded),
        },
        None => fut.await,
    }
}

/// Best-effort audit append, used only after the state change committed.
pub(crate) fn append_audit(
    ctx: &CommandContext,
    build: impl FnOnce() -> Result<Value, AuditError>,
) {
    let Some(log) = &ctx.audit else {
        return;
    };
    if let Err(e) = build().and_then(|entry| log.append(&entry)) {
        tracing::warn!(error = %e, "audit append failed after state change; continuing");
    }
}

/// Best-effort notification, same policy as [`append_audit`].
pub(crate) async fn send_notification(ctx: &CommandContext, notification: Notification) {
    if let Err(e) = ctx.notifier.notify(&notification).await {
        tracing::warn!(error = %e, "notification delivery failed; continuing");
    }
}
