//! Request lifecycle commands: create, approve, deny, cancel.

use jiff::{SignedDuration, Timestamp};
use sentinel_audit::events;
use sentinel_core::models::policy;
use sentinel_core::{Request, RequestStatus, id};

use crate::error::CommandError;
use crate::{CommandContext, Notification, append_audit, send_notification};

/// Comment recorded on requests the policy approved without a human.
pub const AUTO_APPROVE_COMMENT: &str = "auto-approved by policy";

#[derive(Debug, Clone)]
pub struct CreateRequestParams {
    pub profile: String,
    pub justification: String,
    pub duration: SignedDuration,
}

/// Create a pending request; if the policy's auto-approve condition holds
/// for the caller it is immediately transitioned to approved, with the
/// requester recorded as approver. Both paths emit `request.created`; the
/// auto path emits `request.approved` right after.
pub async fn create_request(
    ctx: &CommandContext,
    params: CreateRequestParams,
) -> Result<Request, CommandError> {
    let caller = ctx.identity.caller_identity().await?;
    let requester = caller.username().to_string();
    let now = Timestamp::now();

    let request = Request::new(
        &requester,
        &params.profile,
        &params.justification,
        params.duration,
        now,
    )?;
    ctx.requests.create(&request).await?;
    tracing::info!(id = %request.id, profile = %request.profile, requester = %requester, "request created");

    append_audit(ctx, || {
        events::request_event(events::REQUEST_CREATED, &request, &requester)
    });
    send_notification(
        ctx,
        Notification {
            event: events::REQUEST_CREATED.into(),
            actor: requester.clone(),
            profile: request.profile.clone(),
            entity_id: request.id.clone(),
            message: format!("{requester} requested access to {}", request.profile),
        },
    )
    .await;

    if let Some(rule) = policy::find_rule(&ctx.policy, &request.profile)
        && policy::should_auto_approve(rule, &requester, now, request.duration)
    {
        let mut approved = request.clone();
        approved.approve(&requester, Some(AUTO_APPROVE_COMMENT))?;
        let approved = ctx.requests.update(&approved).await?;
        tracing::info!(id = %approved.id, rule = %rule.name, "request auto-approved");

        append_audit(ctx, || {
            events::request_event(events::REQUEST_APPROVED, &approved, &requester)
        });
        send_notification(
            ctx,
            Notification {
                event: events::REQUEST_APPROVED.into(),
                actor: requester.clone(),
                profile: approved.profile.clone(),
                entity_id: approved.id.clone(),
                message: format!("request {} auto-approved by policy", approved.id),
            },
        )
        .await;
        return Ok(approved);
    }

    Ok(request)
}

/// Approve a pending request.
///
/// When a rule matches the request's profile the caller must be in its
/// approver list. When no rule matches, any authenticated caller may
/// approve — open-by-default is the documented migration semantic.
pub async fn approve_request(
    ctx: &CommandContext,
    request_id: &str,
    comment: Option<String>,
) -> Result<Request, CommandError> {
    decide(ctx, request_id, comment, Decision::Approve).await
}

/// Deny a pending request. Same authorization as approval.
pub async fn deny_request(
    ctx: &CommandContext,
    request_id: &str,
    comment: Option<String>,
) -> Result<Request, CommandError> {
    decide(ctx, request_id, comment, Decision::Deny).await
}

enum Decision {
    Approve,
    Deny,
}

async fn decide(
    ctx: &CommandContext,
    request_id: &str,
    comment: Option<String>,
    decision: Decision,
) -> Result<Request, CommandError> {
    if !id::validate(request_id) {
        return Err(CommandError::InvalidInput(format!(
            "malformed request id: {request_id}"
        )));
    }
    let caller = ctx.identity.caller_identity().await?;
    let approver = caller.username().to_string();

    let request = ctx.requests.get(request_id).await?;

    if let Some(rule) = policy::find_rule(&ctx.policy, &request.profile)
        && !policy::can_approve(rule, &approver)
    {
        return Err(CommandError::Unauthorized(format!(
            "{approver} is not an authorized approver for profile {}",
            request.profile
        )));
    }

    let now = Timestamp::now();
    if request.is_expired(now) {
        // The row may still read "pending" until the TTL purge catches up;
        // the clock is authoritative.
        return Err(CommandError::Core(sentinel_core::CoreError::IllegalTransition {
            from: "expired",
            to: match decision {
                Decision::Approve => "approved",
                Decision::Deny => "denied",
            },
        }));
    }

    let mut decided = request.clone();
    let (event_kind, verb) = match decision {
        Decision::Approve => {
            decided.approve(&approver, comment.as_deref())?;
            (events::REQUEST_APPROVED, "approved")
        }
        Decision::Deny => {
            decided.deny(&approver, comment.as_deref())?;
            (events::REQUEST_DENIED, "denied")
        }
    };
    let decided = ctx.requests.update(&decided).await?;
    tracing::info!(id = %decided.id, approver = %approver, "request {verb}");

    append_audit(ctx, || events::request_event(event_kind, &decided, &approver));
    send_notification(
        ctx,
        Notification {
            event: event_kind.into(),
            actor: approver.clone(),
            profile: decided.profile.clone(),
            entity_id: decided.id.clone(),
            message: format!("request {} {verb} by {approver}", decided.id),
        },
    )
    .await;

    Ok(decided)
}

/// Narrowing for request listings.
#[derive(Debug, Clone)]
pub enum RequestFilter {
    /// The caller's own requests.
    Mine,
    Requester(String),
    Status(RequestStatus),
    Profile(String),
}

/// List requests, newest-first, up to `limit`. Read-only.
///
/// Rows whose `expires_at` has passed are projected as `expired` for
/// display — the store never rewrites them, the TTL purge removes them.
pub async fn list_requests(
    ctx: &CommandContext,
    filter: RequestFilter,
    limit: i32,
) -> Result<Vec<Request>, CommandError> {
    let mut rows = match filter {
        RequestFilter::Mine => {
            let caller = ctx.identity.caller_identity().await?;
            ctx.requests
                .list_by_requester(caller.username(), limit)
                .await?
        }
        RequestFilter::Requester(requester) => {
            ctx.requests.list_by_requester(&requester, limit).await?
        }
        RequestFilter::Status(status) => ctx.requests.list_by_status(status, limit).await?,
        RequestFilter::Profile(profile) => ctx.requests.list_by_profile(&profile, limit).await?,
    };

    let now = Timestamp::now();
    for row in &mut rows {
        if !row.status.is_terminal() && row.is_expired(now) {
            row.status = RequestStatus::Expired;
        }
    }
    Ok(rows)
}

/// Cancel a pending request. Only the requester may cancel their own.
pub async fn cancel_request(
    ctx: &CommandContext,
    request_id: &str,
) -> Result<Request, CommandError> {
    if !id::validate(request_id) {
        return Err(CommandError::InvalidInput(format!(
            "malformed request id: {request_id}"
        )));
    }
    let caller = ctx.identity.caller_identity().await?;
    let username = caller.username().to_string();

    let request = ctx.requests.get(request_id).await?;
    if request.requester != username {
        return Err(CommandError::Unauthorized(format!(
            "only the requester may cancel request {request_id}"
        )));
    }

    let mut cancelled = request.clone();
    cancelled.cancel()?;
    let cancelled = ctx.requests.update(&cancelled).await?;
    tracing::info!(id = %cancelled.id, "request cancelled");

    append_audit(ctx, || {
        events::request_event(events::REQUEST_CANCELLED, &cancelled, &username)
    });
    send_notification(
        ctx,
        Notification {
            event: events::REQUEST_CANCELLED.into(),
            actor: username.clone(),
            profile: cancelled.profile.clone(),
            entity_id: cancelled.id.clone(),
            message: format!("request {} cancelled", cancelled.id),
        },
    )
    .await;

    Ok(cancelled)
}
