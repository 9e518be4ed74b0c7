//! Domain event payloads for the signed log.
//!
//! Each payload captures the entity snapshot *after* the mutation plus the
//! actor who drove it. Payloads are plain JSON values — the log does not
//! interpret them.

use sentinel_core::{BreakGlassEvent, Request};
use serde_json::{Value, json};

use crate::error::AuditError;

pub const REQUEST_CREATED: &str = "request.created";
pub const REQUEST_APPROVED: &str = "request.approved";
pub const REQUEST_DENIED: &str = "request.denied";
pub const REQUEST_CANCELLED: &str = "request.cancelled";
pub const BREAK_GLASS_INVOKED: &str = "breakglass.invoked";
pub const BREAK_GLASS_CLOSED: &str = "breakglass.closed";

pub fn request_event(kind: &str, request: &Request, actor: &str) -> Result<Value, AuditError> {
    Ok(json!({
        "event": kind,
        "actor": actor,
        "request": serde_json::to_value(request)?,
    }))
}

pub fn break_glass_event(
    kind: &str,
    event: &BreakGlassEvent,
    actor: &str,
) -> Result<Value, AuditError> {
    Ok(json!({
        "event": kind,
        "actor": actor,
        "break_glass": serde_json::to_value(event)?,
    }))
}
