//! Break-glass commands: invoke and close.

use jiff::{SignedDuration, Timestamp};
use sentinel_audit::events;
use sentinel_core::{BreakGlassEvent, BreakGlassStatus, ReasonCode, id};

use crate::error::CommandError;
use crate::{CommandContext, Notification, append_audit, send_notification};

#[derive(Debug, Clone)]
pub struct InvokeParams {
    pub profile: String,
    pub reason_code: ReasonCode,
    pub justification: String,
    pub duration: SignedDuration,
}

/// Invoke break-glass: an immediately-active grant with no approval step.
/// The store refuses a second active event for the same
/// `(invoker, profile)` — that surfaces as `ActiveExists`.
pub async fn invoke_break_glass(
    ctx: &CommandContext,
    params: InvokeParams,
) -> Result<BreakGlassEvent, CommandError> {
    let caller = ctx.identity.caller_identity().await?;
    let invoker = caller.username().to_string();
    let now = Timestamp::now();

    let event = BreakGlassEvent::new(
        &invoker,
        &params.profile,
        params.reason_code,
        &params.justification,
        params.duration,
        now,
    )?;
    ctx.break_glass.create(&event).await?;
    tracing::warn!(
        id = %event.id,
        invoker = %invoker,
        profile = %event.profile,
        reason = %event.reason_code,
        "break-glass invoked"
    );

    append_audit(ctx, || {
        events::break_glass_event(events::BREAK_GLASS_INVOKED, &event, &invoker)
    });
    send_notification(
        ctx,
        Notification {
            event: events::BREAK_GLASS_INVOKED.into(),
            actor: invoker.clone(),
            profile: event.profile.clone(),
            entity_id: event.id.clone(),
            message: format!(
                "{invoker} invoked break-glass for {} ({})",
                event.profile, event.reason_code
            ),
        },
    )
    .await;

    Ok(event)
}

/// Narrowing for break-glass listings.
#[derive(Debug, Clone)]
pub enum BreakGlassFilter {
    Mine,
    Invoker(String),
    Status(BreakGlassStatus),
    Profile(String),
}

/// List break-glass events, newest-first, up to `limit`. Active rows past
/// their `expires_at` are projected as expired for display.
pub async fn list_break_glass(
    ctx: &CommandContext,
    filter: BreakGlassFilter,
    limit: i32,
) -> Result<Vec<BreakGlassEvent>, CommandError> {
    let mut rows = match filter {
        BreakGlassFilter::Mine => {
            let caller = ctx.identity.caller_identity().await?;
            ctx.break_glass
                .list_by_invoker(caller.username(), limit)
                .await?
        }
        BreakGlassFilter::Invoker(invoker) => {
            ctx.break_glass.list_by_invoker(&invoker, limit).await?
        }
        BreakGlassFilter::Status(status) => {
            ctx.break_glass.list_by_status(status, limit).await?
        }
        BreakGlassFilter::Profile(profile) => {
            ctx.break_glass.list_by_profile(&profile, limit).await?
        }
    };

    let now = Timestamp::now();
    for row in &mut rows {
        if !row.status.is_terminal() && row.is_expired(now) {
            row.status = BreakGlassStatus::Expired;
        }
    }
    Ok(rows)
}

/// Close an active break-glass event. Any identity may close one — the
/// closer is recorded — and a non-empty reason is mandatory.
pub async fn close_break_glass(
    ctx: &CommandContext,
    event_id: &str,
    reason: &str,
) -> Result<BreakGlassEvent, CommandError> {
    if !id::validate(event_id) {
        return Err(CommandError::InvalidInput(format!(
            "malformed event id: {event_id}"
        )));
    }
    let caller = ctx.identity.caller_identity().await?;
    let closer = caller.username().to_string();

    let event = ctx.break_glass.get(event_id).await?;
    let mut closed = event.clone();
    closed.close(&closer, reason)?;
    let closed = ctx.break_glass.update(&closed).await?;
    tracing::info!(id = %closed.id, closed_by = %closer, "break-glass closed");

    append_audit(ctx, || {
        events::break_glass_event(events::BREAK_GLASS_CLOSED, &closed, &closer)
    });
    send_notification(
        ctx,
        Notification {
            event: events::BREAK_GLASS_CLOSED.into(),
            actor: closer.clone(),
            profile: closed.profile.clone(),
            entity_id: closed.id.clone(),
            message: format!("break-glass {} closed by {closer}", closed.id),
        },
    )
    .await;

    Ok(closed)
}
