//! Mapping between domain entities and DynamoDB attribute maps.
//!
//! Timestamps are stored as RFC 3339 strings; `expires_at_unix` carries the
//! same instant as whole seconds for the table's TTL attribute.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use jiff::{SignedDuration, Timestamp};
use sentinel_core::{BreakGlassEvent, Request};

use crate::error::StoreError;

pub type Item = HashMap<String, AttributeValue>;

pub fn request_to_item(request: &Request) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttributeValue::S(request.id.clone()));
    item.insert("requester".into(), AttributeValue::S(request.requester.clone()));
    item.insert("profile".into(), AttributeValue::S(request.profile.clone()));
    item.insert(
        "justification".into(),
        AttributeValue::S(request.justification.clone()),
    );
    item.insert(
        "duration_secs".into(),
        AttributeValue::N(request.duration.as_secs().to_string()),
    );
    item.insert("status".into(), AttributeValue::S(request.status.as_str().into()));
    if let Some(approver) = &request.approver {
        item.insert("approver".into(), AttributeValue::S(approver.clone()));
    }
    if let Some(comment) = &request.approver_comment {
        item.insert("approver_comment".into(), AttributeValue::S(comment.clone()));
    }
    insert_timestamps(&mut item, request.created_at, request.updated_at, request.expires_at);
    item
}

pub fn request_from_item(item: &Item) -> Result<Request, StoreError> {
    Ok(Request {
        id: get_s(item, "id")?.to_string(),
        requester: get_s(item, "requester")?.to_string(),
        profile: get_s(item, "profile")?.to_string(),
        justification: get_s(item, "justification")?.to_string(),
        duration: SignedDuration::from_secs(get_n(item, "duration_secs")?),
        status: get_s(item, "status")?
            .parse()
            .map_err(|e| StoreError::Marshal(format!("{e}")))?,
        approver: opt_s(item, "approver"),
        approver_comment: opt_s(item, "approver_comment"),
        created_at: get_ts(item, "created_at")?,
        updated_at: get_ts(item, "updated_at")?,
        expires_at: get_ts(item, "expires_at")?,
    })
}

pub fn break_glass_to_item(event: &BreakGlassEvent) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttributeValue::S(event.id.clone()));
    item.insert("invoker".into(), AttributeValue::S(event.invoker.clone()));
    item.insert("profile".into(), AttributeValue::S(event.profile.clone()));
    item.insert(
        "reason_code".into(),
        AttributeValue::S(event.reason_code.as_str().into()),
    );
    item.insert(
        "justification".into(),
        AttributeValue::S(event.justification.clone()),
    );
    item.insert(
        "duration_secs".into(),
        AttributeValue::N(event.duration.as_secs().to_string()),
    );
    item.insert("status".into(), AttributeValue::S(event.status.as_str().into()));
    item.insert("request_id".into(), AttributeValue::S(event.request_id.clone()));
    if let Some(closed_by) = &event.closed_by {
        item.insert("closed_by".into(), AttributeValue::S(closed_by.clone()));
    }
    if let Some(reason) = &event.closed_reason {
        item.insert("closed_reason".into(), AttributeValue::S(reason.clone()));
    }
    insert_timestamps(&mut item, event.created_at, event.updated_at, event.expires_at);
    item
}

pub fn break_glass_from_item(item: &Item) -> Result<BreakGlassEvent, StoreError> {
    Ok(BreakGlassEvent {
        id: get_s(item, "id")?.to_string(),
        invoker: get_s(item, "invoker")?.to_string(),
        profile: get_s(item, "profile")?.to_string(),
        reason_code: get_s(item, "reason_code")?
            .parse()
            .map_err(|e| StoreError::Marshal(format!("{e}")))?,
        justification: get_s(item, "justification")?.to_string(),
        duration: SignedDuration::from_secs(get_n(item, "duration_secs")?),
        status: get_s(item, "status")?
            .parse()
            .map_err(|e| StoreError::Marshal(format!("{e}")))?,
        request_id: get_s(item, "request_id")?.to_string(),
        closed_by: opt_s(item, "closed_by"),
        closed_reason: opt_s(item, "closed_reason"),
        created_at: get_ts(item, "created_at")?,
        updated_at: get_ts(item, "updated_at")?,
        expires_at: get_ts(item, "expires_at")?,
    })
}

fn insert_timestamps(item: &mut Item, created: Timestamp, updated: Timestamp, expires: Timestamp) {
    item.insert("created_at".into(), AttributeValue::S(created.to_string()));
    item.insert("updated_at".into(), AttributeValue::S(updated.to_string()));
    item.insert("expires_at".into(), AttributeValue::S(expires.to_string()));
    // TTL attribute — DynamoDB wants epoch seconds
    item.insert(
        "expires_at_unix".into(),
        AttributeValue::N(expires.as_second().to_string()),
    );
}

fn get_s<'a>(item: &'a Item, name: &str) -> Result<&'a str, StoreError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| StoreError::Marshal(format!("missing string attribute {name}")))
}

fn opt_s(item: &Item, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}

fn get_n(item: &Item, name: &str) -> Result<i64, StoreError> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| StoreError::Marshal(format!("missing numeric attribute {name}")))
}

fn get_ts(item: &Item, name: &str) -> Result<Timestamp, StoreError> {
    get_s(item, name)?
        .parse()
        .map_err(|e| StoreError::Marshal(format!("bad timestamp in {name}: {e}")))
}
