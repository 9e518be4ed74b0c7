//! CloudTrail reading: paged `LookupEvents` calls filtered to
//! `AssumeRole`, with the interesting fields pulled out of the embedded
//! event JSON.

use std::collections::HashSet;

use aws_sdk_cloudtrail::Client;
use aws_sdk_cloudtrail::types::{LookupAttribute, LookupAttributeKey};
use aws_smithy_types::DateTime;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::DetectionWindow;
use crate::error::DetectError;

/// One role-assumption observed in CloudTrail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailEvent {
    pub event_id: String,
    pub event_time: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_identity: Option<String>,
}

/// Read all `AssumeRole` events in the window. Overlapping pages can
/// repeat events, so results are de-duplicated by `event_id`.
pub async fn lookup_assume_role_events(
    client: &Client,
    window: &DetectionWindow,
) -> Result<Vec<TrailEvent>, DetectError> {
    let attribute = LookupAttribute::builder()
        .attribute_key(LookupAttributeKey::EventName)
        .attribute_value("AssumeRole")
        .build()
        .map_err(|e| DetectError::CloudTrail(e.to_string()))?;

    let mut events = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut next_token: Option<String> = None;

    loop {
        let mut req = client
            .lookup_events()
            .lookup_attributes(attribute.clone())
            .start_time(DateTime::from_secs(window.start.as_second()))
            .end_time(DateTime::from_secs(window.end.as_second()));
        if let Some(token) = &next_token {
            req = req.next_token(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DetectError::CloudTrail(e.into_service_error().to_string()))?;

        for raw in resp.events() {
            let Some(body) = raw.cloud_trail_event() else {
                continue;
            };
            let event = match parse_trail_event(body) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unparseable trail event");
                    continue;
                }
            };
            if let Some(wanted) = &window.role_arn
                && event.role_arn.as_deref() != Some(wanted.as_str())
            {
                continue;
            }
            if seen.insert(event.event_id.clone()) {
                events.push(event);
            }
        }

        match resp.next_token() {
            Some(token) => next_token = Some(token.to_string()),
            None => break,
        }
    }

    tracing::info!(count = events.len(), "fetched AssumeRole events");
    Ok(events)
}

/// Extract the fields the detector cares about from a raw CloudTrail
/// event body.
pub fn parse_trail_event(body: &str) -> Result<TrailEvent, DetectError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| DetectError::Event(format!("bad event JSON: {e}")))?;

    let event_id = value
        .get("eventID")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DetectError::Event("missing eventID".into()))?
        .to_string();

    let event_time = value
        .get("eventTime")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DetectError::Event("missing eventTime".into()))?
        .parse()
        .map_err(|e| DetectError::Event(format!("bad eventTime: {e}")))?;

    let params = value.get("requestParameters");
    let role_arn = params
        .and_then(|p| p.get("roleArn"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let source_identity = params
        .and_then(|p| p.get("sourceIdentity"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let source_ip = value
        .get("sourceIPAddress")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(TrailEvent {
        event_id,
        event_time,
        role_arn,
        source_ip,
        source_identity,
    })
}
